//! Declarative parameters for actions and forms.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::PipelineError;
use super::text::title_case;

/// Type of a parameter as presented to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
}

impl ParamType {
    fn json_schema_type(&self) -> &'static str {
        match self {
            ParamType::Int => "integer",
            ParamType::Str => "string",
            ParamType::Bool => "boolean",
        }
    }
}

impl FromStr for ParamType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "integer" => Ok(ParamType::Int),
            "str" | "string" => Ok(ParamType::Str),
            "bool" | "boolean" => Ok(ParamType::Bool),
            other => Err(PipelineError::Configuration(format!(
                "unsupported parameter type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::Int => "int",
            ParamType::Str => "str",
            ParamType::Bool => "bool",
        })
    }
}

/// One named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    pub fn str(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Str)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    /// Build from a type name, e.g. read from a configuration file.
    ///
    /// Unknown type names are a configuration error.
    pub fn parse(name: impl Into<String>, kind: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(name, kind.parse()?))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn title(&self) -> String {
        title_case(&self.name)
    }

    /// Coerce a submitted value to this parameter's type.
    pub fn coerce(&self, value: &Value) -> Result<Value, PipelineError> {
        let invalid = || {
            PipelineError::Validation(format!(
                "parameter '{}' expects {}, got {}",
                self.name, self.kind, value
            ))
        };
        match (self.kind, value) {
            (ParamType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            (ParamType::Int, Value::String(s)) => {
                s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid())
            }
            (ParamType::Str, Value::String(_)) => Ok(value.clone()),
            (ParamType::Str, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ParamType::Bool, Value::Bool(_)) => Ok(value.clone()),
            (ParamType::Bool, Value::String(s)) => match s.as_str() {
                "true" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

/// Check `submitted` against `specs` and coerce every value.
///
/// Missing required parameters and parameters not declared in `specs` are
/// rejected. `null` counts as missing.
pub fn coerce_params(
    specs: &[ParamSpec],
    submitted: &Map<String, Value>,
) -> Result<Map<String, Value>, PipelineError> {
    if let Some(unknown) = submitted
        .keys()
        .find(|k| !specs.iter().any(|p| &p.name == *k))
    {
        return Err(PipelineError::Validation(format!(
            "unexpected parameter '{unknown}'"
        )));
    }

    let mut out = Map::new();
    for spec in specs {
        match submitted.get(&spec.name) {
            Some(Value::Null) | None if spec.required => {
                return Err(PipelineError::Validation(format!(
                    "missing parameter '{}'",
                    spec.name
                )))
            }
            Some(Value::Null) | None => {}
            Some(value) => {
                out.insert(spec.name.clone(), spec.coerce(value)?);
            }
        }
    }
    Ok(out)
}

/// Descriptor of a parameter sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
    pub attr: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub required: bool,
    pub description: Option<String>,
}

impl From<&ParamSpec> for ParamDescriptor {
    fn from(spec: &ParamSpec) -> Self {
        Self {
            attr: spec.name.clone(),
            title: spec.title(),
            kind: spec.kind,
            required: spec.required,
            description: spec.description.clone(),
        }
    }
}

/// JSON Schema `properties` entry for one parameter.
pub(crate) fn json_schema_property(spec: &ParamSpec) -> Value {
    let mut prop = Map::new();
    prop.insert("title".into(), Value::String(spec.title()));
    prop.insert(
        "type".into(),
        Value::String(spec.kind.json_schema_type().to_string()),
    );
    if let Some(desc) = &spec.description {
        prop.insert("description".into(), Value::String(desc.clone()));
    }
    Value::Object(prop)
}
