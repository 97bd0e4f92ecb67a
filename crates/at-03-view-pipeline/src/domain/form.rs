//! Form schemas shared by create views and input forms.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Map, Value};

use super::callback::CallbackReturn;
use super::error::PipelineError;
use super::params::{coerce_params, json_schema_property, ParamSpec};

/// Declarative form: an ordered list of typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    pub title: Option<String>,
    pub fields: Vec<ParamSpec>,
}

impl FormSchema {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ParamSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// JSON Schema (draft 2020-12 subset) describing the form.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), json_schema_property(f)))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        if let (Some(title), Some(obj)) = (&self.title, schema.as_object_mut()) {
            obj.insert("title".into(), Value::String(title.clone()));
        }
        schema
    }

    /// Validate a submitted body and coerce its values.
    pub fn validate(&self, body: &Value) -> Result<Map<String, Value>, PipelineError> {
        match body {
            Value::Object(map) => coerce_params(&self.fields, map),
            Value::Null => coerce_params(&self.fields, &Map::new()),
            other => Err(PipelineError::Validation(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

type FormFn =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, anyhow::Result<CallbackReturn>> + Send + Sync>;

/// Callback receiving validated form data.
#[derive(Clone)]
pub struct FormCallback(FormFn);

impl FormCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> BoxFuture<'static, anyhow::Result<CallbackReturn>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) async fn call(&self, data: Map<String, Value>) -> anyhow::Result<CallbackReturn> {
        (self.0)(data).await
    }
}

impl fmt::Debug for FormCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormCallback(..)")
    }
}
