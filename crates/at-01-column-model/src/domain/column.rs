//! The normalized column and its cell rendering.

use std::panic::{catch_unwind, AssertUnwindSafe};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{render_value, FilterOp, Row, Sort, SortDirection};
use tracing::warn;

use super::field::{ComputeFn, LinkDetail, LinkTable, LiveValue};
use crate::error::ColumnError;

/// Cell content when a computed column fails.
pub const COMPUTE_ERROR_MARKER: &str = "# ERROR #";

/// Characters left untouched in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters left untouched in a `filter=` component. `;` is encoded since
/// it separates the components.
const FILTER_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// What a column renders.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    /// `row[ref]` as is.
    Plain,
    /// Result of a user function on the row.
    Computed(ComputeFn),
    LinkDetail {
        resource: String,
        id_ref: String,
    },
    LinkTable {
        resource: String,
        filter_col: String,
        filter_op: FilterOp,
        filter_ref: String,
    },
    /// `reference` holds the initial-value key, if any.
    Live { topic_ref: String, history: bool },
}

/// A renderable column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Data key. `None` only for computed columns.
    pub reference: Option<String>,
    pub display: String,
    pub sortable: bool,
    pub description: Option<String>,
    pub kind: ColumnKind,
}

/// Header entry sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnHead {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub display: String,
    pub sortable: bool,
    /// Active direction when the list is sorted by this column.
    pub sort: Option<SortDirection>,
    pub description: Option<String>,
}

impl Column {
    pub fn plain(display: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            display: display.into(),
            sortable: true,
            description: None,
            kind: ColumnKind::Plain,
        }
    }

    pub fn computed(display: impl Into<String>, f: ComputeFn) -> Self {
        Self {
            reference: None,
            display: display.into(),
            sortable: false,
            description: None,
            kind: ColumnKind::Computed(f),
        }
    }

    pub fn link_detail(display: impl Into<String>, link: LinkDetail) -> Self {
        Self {
            reference: Some(link.reference),
            display: display.into(),
            sortable: true,
            description: None,
            kind: ColumnKind::LinkDetail {
                resource: link.resource,
                id_ref: link.id_ref,
            },
        }
    }

    pub fn link_table(display: impl Into<String>, link: LinkTable) -> Self {
        Self {
            reference: Some(link.reference),
            display: display.into(),
            sortable: true,
            description: None,
            kind: ColumnKind::LinkTable {
                resource: link.resource,
                filter_col: link.filter_col,
                filter_op: link.filter_op,
                filter_ref: link.filter_ref,
            },
        }
    }

    /// Sortable only through its initial value.
    pub fn live(display: impl Into<String>, live: LiveValue) -> Self {
        Self {
            sortable: live.initial_ref.is_some(),
            reference: live.initial_ref,
            display: display.into(),
            description: None,
            kind: ColumnKind::Live {
                topic_ref: live.topic_ref,
                history: live.history,
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.kind, ColumnKind::Computed(_))
    }

    /// Header entry for the current sort.
    pub fn head(&self, current_sort: Option<&Sort>) -> ColumnHead {
        let sort = match (current_sort, &self.reference) {
            (Some(sort), Some(reference)) if &sort.reference == reference => Some(sort.direction),
            _ => None,
        };
        ColumnHead {
            reference: self.reference.clone(),
            display: self.display.clone(),
            sortable: self.sortable,
            sort,
            description: self.description.clone(),
        }
    }

    /// Render this column's cell for `row`.
    pub fn value(&self, row: &Row) -> Result<Value, ColumnError> {
        match &self.kind {
            ColumnKind::Plain => self.own_value(row).cloned(),
            ColumnKind::Computed(f) => Ok(self.compute(f, row)),
            ColumnKind::LinkDetail { resource, id_ref } => {
                let value = self.own_value(row)?;
                let id = self.field(row, id_ref)?;
                // no entry to point at
                let href = match id {
                    Value::Null => Value::Null,
                    id => Value::String(detail_href(resource, id)),
                };
                Ok(json!({
                    "type": "link",
                    "kind": "detail",
                    "resource": resource,
                    "value": value,
                    "id": id,
                    "href": href,
                }))
            }
            ColumnKind::LinkTable {
                resource,
                filter_col,
                filter_op,
                filter_ref,
            } => {
                let value = self.own_value(row)?;
                let val = self.field(row, filter_ref)?;
                Ok(json!({
                    "type": "link",
                    "kind": "table",
                    "resource": resource,
                    "value": value,
                    "filter": {"col": filter_col, "op": filter_op, "val": val},
                    "href": list_href(resource, filter_col, filter_op, val),
                }))
            }
            ColumnKind::Live { topic_ref, history } => {
                let initial = match &self.reference {
                    Some(key) => self.field(row, key)?.clone(),
                    None => Value::Null,
                };
                let topic = self.field(row, topic_ref)?;
                Ok(json!({
                    "type": "live",
                    "initial": initial,
                    "topic": topic,
                    "history": history,
                }))
            }
        }
    }

    fn own_value<'r>(&self, row: &'r Row) -> Result<&'r Value, ColumnError> {
        match &self.reference {
            Some(key) => self.field(row, key),
            None => Err(ColumnError::MissingField {
                column: self.display.clone(),
                key: String::new(),
            }),
        }
    }

    fn field<'r>(&self, row: &'r Row, key: &str) -> Result<&'r Value, ColumnError> {
        row.get(key).ok_or_else(|| ColumnError::MissingField {
            column: self.display.clone(),
            key: key.to_string(),
        })
    }

    fn compute(&self, f: &ComputeFn, row: &Row) -> Value {
        match catch_unwind(AssertUnwindSafe(|| f.call(row))) {
            Ok(Ok(value @ (Value::String(_) | Value::Null))) => value,
            Ok(Ok(other)) => Value::String(render_value(&other)),
            Ok(Err(e)) => {
                warn!(column = %self.display, error = %e, "Computed column failed");
                Value::String(COMPUTE_ERROR_MARKER.to_string())
            }
            Err(_) => {
                warn!(column = %self.display, "Computed column panicked");
                Value::String(COMPUTE_ERROR_MARKER.to_string())
            }
        }
    }
}

fn detail_href(resource: &str, id: &Value) -> String {
    format!(
        "/resource/{}/detail/{}",
        utf8_percent_encode(resource, PATH_SEGMENT),
        utf8_percent_encode(&render_value(id), PATH_SEGMENT),
    )
}

fn list_href(resource: &str, col: &str, op: &FilterOp, val: &Value) -> String {
    format!(
        "/resource/{}/list?filter={};{};{}",
        utf8_percent_encode(resource, PATH_SEGMENT),
        utf8_percent_encode(col, FILTER_COMPONENT),
        utf8_percent_encode(op.as_str(), FILTER_COMPONENT),
        utf8_percent_encode(&render_value(val), FILTER_COMPONENT),
    )
}
