//! # Query Types
//!
//! Filters and sort keys as they travel between the HTTP surface, the view
//! pipeline and resolvers.
//!
//! Wire forms:
//!
//! ```text
//! filter = ref;op;val      (val may itself contain ';')
//! sort   = ref;asc|desc
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::QueryParseError;

/// Filter operator.
///
/// The named variants are the ones every resolver is expected to understand.
/// `Other` carries a resolver-specific operator through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,
    In,
    IsNull,
    IsNotNull,
    Other(String),
}

impl FilterOp {
    pub fn as_str(&self) -> &str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Le => "le",
            FilterOp::Gt => "gt",
            FilterOp::Ge => "ge",
            FilterOp::Like => "like",
            FilterOp::ILike => "ilike",
            FilterOp::In => "in",
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
            FilterOp::Other(name) => name,
        }
    }

    /// True for operators that ignore the filter value.
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::IsNotNull)
    }
}

impl FromStr for FilterOp {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "lt" => FilterOp::Lt,
            "le" => FilterOp::Le,
            "gt" => FilterOp::Gt,
            "ge" => FilterOp::Ge,
            "like" => FilterOp::Like,
            "ilike" => FilterOp::ILike,
            "in" => FilterOp::In,
            "is_null" => FilterOp::IsNull,
            "is_not_null" => FilterOp::IsNotNull,
            other => {
                let valid = !other.is_empty()
                    && other
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid {
                    return Err(QueryParseError::InvalidOperator(other.to_string()));
                }
                FilterOp::Other(other.to_string())
            }
        };
        Ok(op)
    }
}

impl TryFrom<String> for FilterOp {
    type Error = QueryParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterOp> for String {
    fn from(op: FilterOp) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter applied to a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFilter {
    #[serde(rename = "ref")]
    pub reference: String,
    pub op: FilterOp,
    pub val: String,
    /// Human label of the filtered column, filled in from filter options.
    #[serde(default)]
    pub display: Option<String>,
}

impl AppliedFilter {
    pub fn new(reference: impl Into<String>, op: FilterOp, val: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            op,
            val: val.into(),
            display: None,
        }
    }

    /// Parse the `ref;op;val` wire form.
    ///
    /// Only the first two separators are significant, so values containing
    /// `;` survive intact.
    pub fn parse(raw: &str) -> Result<Self, QueryParseError> {
        let mut parts = raw.splitn(3, ';');
        let (Some(reference), Some(op), Some(val)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(QueryParseError::MalformedFilter(raw.to_string()));
        };
        if reference.is_empty() {
            return Err(QueryParseError::MalformedFilter(raw.to_string()));
        }
        Ok(Self::new(reference, op.parse()?, val))
    }

    /// The `ref;op;val` wire form.
    pub fn to_query(&self) -> String {
        format!("{};{};{}", self.reference, self.op, self.val)
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(QueryParseError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single ordering key of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(rename = "ref")]
    pub reference: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(reference: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            reference: reference.into(),
            direction,
        }
    }

    pub fn asc(reference: impl Into<String>) -> Self {
        Self::new(reference, SortDirection::Asc)
    }

    pub fn desc(reference: impl Into<String>) -> Self {
        Self::new(reference, SortDirection::Desc)
    }

    /// Parse the `ref;dir` wire form.
    pub fn parse(raw: &str) -> Result<Self, QueryParseError> {
        let Some((reference, direction)) = raw.split_once(';') else {
            return Err(QueryParseError::MalformedSort(raw.to_string()));
        };
        if reference.is_empty() {
            return Err(QueryParseError::MalformedSort(raw.to_string()));
        }
        Ok(Self::new(reference, direction.parse()?))
    }

    pub fn to_query(&self) -> String {
        format!("{};{}", self.reference, self.direction)
    }
}
