//! # Core Entities
//!
//! Rows, pagination metadata and resource context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record as returned by a resolver, keyed by column reference.
pub type Row = Map<String, Value>;

/// Identifies the resource a resolver call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// Resource name as registered in the admin configuration.
    pub name: String,
    /// Key of the column that uniquely identifies a row.
    pub id_column: String,
}

impl ResourceContext {
    pub fn new(name: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_column: id_column.into(),
        }
    }
}

/// Pagination metadata for a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Rows per page.
    pub per_page: u64,
    /// Number of rows matching the filters, before pagination.
    pub total: u64,
}

impl Pagination {
    /// Offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Number of pages needed to show `total` rows.
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// One page of filtered, sorted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedListData {
    pub rows: Vec<Row>,
    pub pagination: Pagination,
}

/// A column a list may be filtered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    #[serde(rename = "ref")]
    pub reference: String,
    pub display: String,
}

impl FilterOption {
    pub fn new(reference: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            display: display.into(),
        }
    }
}

/// An authenticated admin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            avatar: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Render a cell value the way it appears in hrefs, titles and filter values.
///
/// Strings are used verbatim, `null` becomes the empty string and everything
/// else uses its JSON form.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
