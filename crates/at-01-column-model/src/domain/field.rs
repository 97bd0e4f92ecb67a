//! Field specifications as written in view configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{FilterOp, Row};

/// User function computing a cell from the whole row.
#[derive(Clone)]
pub struct ComputeFn(Arc<dyn Fn(&Row) -> anyhow::Result<Value> + Send + Sync>);

impl ComputeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Row) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, row: &Row) -> anyhow::Result<Value> {
        (self.0)(row)
    }
}

impl fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputeFn(..)")
    }
}

/// Handle to a column declared by a storage adapter's own schema.
///
/// Resolves to its key exactly like a bare string would.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeColumn {
    pub key: String,
}

impl NativeColumn {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Link from a cell to the detail view of another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDetail {
    /// Row key whose value is displayed.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Target resource name.
    pub resource: String,
    /// Row key holding the target entry's id.
    pub id_ref: String,
}

/// Link from a cell to a filtered list of another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTable {
    /// Row key whose value is displayed.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Target resource name.
    pub resource: String,
    /// Column of the target resource to filter on.
    pub filter_col: String,
    pub filter_op: FilterOp,
    /// Row key holding the filter value.
    pub filter_ref: String,
}

/// Field whose value is pushed by the live-data hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveValue {
    /// Row key holding the topic to subscribe to.
    #[serde(rename = "ref")]
    pub topic_ref: String,
    /// Row key holding the value shown before the first update.
    #[serde(default)]
    pub initial_ref: Option<String>,
    /// Client keeps a rolling series and draws it.
    #[serde(default)]
    pub history: bool,
}

/// One element of a field specification.
#[derive(Debug, Clone)]
pub enum FieldItem {
    Text(String),
    Column(NativeColumn),
    Compute(ComputeFn),
    LinkDetail(LinkDetail),
    LinkTable(LinkTable),
    Live(LiveValue),
    /// A value of no recognized kind. Never valid.
    Literal(Value),
}

impl FieldItem {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldItem::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A field specification: a bare item, `(display, item)` or
/// `(display, description, item)`.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    Bare(FieldItem),
    Pair(FieldItem, FieldItem),
    Triple(FieldItem, FieldItem, FieldItem),
}

impl FieldSpec {
    /// `(display, f)` where `f` computes the cell from the row.
    pub fn computed<F>(display: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Row) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        FieldSpec::Pair(
            FieldItem::Text(display.into()),
            FieldItem::Compute(ComputeFn::new(f)),
        )
    }

    /// Attach a description, turning a pair into a triple.
    ///
    /// Bare specs and triples are returned unchanged.
    pub fn described(self, description: impl Into<String>) -> Self {
        match self {
            FieldSpec::Pair(display, item) => {
                FieldSpec::Triple(display, FieldItem::Text(description.into()), item)
            }
            other => other,
        }
    }
}

impl From<&str> for FieldItem {
    fn from(s: &str) -> Self {
        FieldItem::Text(s.to_string())
    }
}

impl From<String> for FieldItem {
    fn from(s: String) -> Self {
        FieldItem::Text(s)
    }
}

impl From<NativeColumn> for FieldItem {
    fn from(c: NativeColumn) -> Self {
        FieldItem::Column(c)
    }
}

impl From<ComputeFn> for FieldItem {
    fn from(f: ComputeFn) -> Self {
        FieldItem::Compute(f)
    }
}

impl From<LinkDetail> for FieldItem {
    fn from(l: LinkDetail) -> Self {
        FieldItem::LinkDetail(l)
    }
}

impl From<LinkTable> for FieldItem {
    fn from(l: LinkTable) -> Self {
        FieldItem::LinkTable(l)
    }
}

impl From<LiveValue> for FieldItem {
    fn from(l: LiveValue) -> Self {
        FieldItem::Live(l)
    }
}

/// JSON configuration form of a single item.
///
/// Strings are plain refs; objects with exactly one of the keys `column`,
/// `link_detail`, `link_table`, `live` are markers. Everything else,
/// including a marker that fails to decode, becomes a `Literal`.
impl From<Value> for FieldItem {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => FieldItem::Text(s),
            Value::Object(ref map) if map.len() == 1 => {
                let Some((tag, body)) = map.iter().next() else {
                    return FieldItem::Literal(value);
                };
                let decoded = match tag.as_str() {
                    "column" => body.as_str().map(|k| FieldItem::Column(NativeColumn::new(k))),
                    "link_detail" => serde_json::from_value(body.clone())
                        .ok()
                        .map(FieldItem::LinkDetail),
                    "link_table" => serde_json::from_value(body.clone())
                        .ok()
                        .map(FieldItem::LinkTable),
                    "live" => serde_json::from_value(body.clone()).ok().map(FieldItem::Live),
                    _ => None,
                };
                decoded.unwrap_or(FieldItem::Literal(value))
            }
            other => FieldItem::Literal(other),
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(s: &str) -> Self {
        FieldSpec::Bare(s.into())
    }
}

impl From<String> for FieldSpec {
    fn from(s: String) -> Self {
        FieldSpec::Bare(s.into())
    }
}

impl From<NativeColumn> for FieldSpec {
    fn from(c: NativeColumn) -> Self {
        FieldSpec::Bare(c.into())
    }
}

impl From<FieldItem> for FieldSpec {
    fn from(item: FieldItem) -> Self {
        FieldSpec::Bare(item)
    }
}

impl<A: Into<FieldItem>, B: Into<FieldItem>> From<(A, B)> for FieldSpec {
    fn from((a, b): (A, B)) -> Self {
        FieldSpec::Pair(a.into(), b.into())
    }
}

impl<A: Into<FieldItem>, B: Into<FieldItem>, C: Into<FieldItem>> From<(A, B, C)> for FieldSpec {
    fn from((a, b, c): (A, B, C)) -> Self {
        FieldSpec::Triple(a.into(), b.into(), c.into())
    }
}

impl FieldSpec {
    /// Decode the JSON configuration form.
    ///
    /// Arrays of two or three items become pairs and triples. Any other
    /// array, or a scalar that is not a string, yields a spec that
    /// normalization rejects.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) if items.len() == 2 || items.len() == 3 => {
                let mut items = items.into_iter().map(FieldItem::from);
                match (items.next(), items.next(), items.next()) {
                    (Some(a), Some(b), None) => FieldSpec::Pair(a, b),
                    (Some(a), Some(b), Some(c)) => FieldSpec::Triple(a, b, c),
                    // unreachable given the length guard
                    _ => FieldSpec::Bare(FieldItem::Literal(Value::Null)),
                }
            }
            Value::Array(items) => FieldSpec::Bare(FieldItem::Literal(Value::Array(items))),
            other => FieldSpec::Bare(FieldItem::from(other)),
        }
    }
}
