//! Response envelopes sent to the client.

use at_01_column_model::ColumnHead;
use serde::Serialize;
use serde_json::Value;
use shared_types::{AppliedFilter, FilterOp, FilterOption, Pagination, User};

use super::action::ActionDescriptor;
use super::config::PageType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListMeta {
    pub title: String,
    pub description: Option<String>,
    pub has_create: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse {
    /// One array per row, cells in header order.
    pub data: Vec<Vec<Value>>,
    pub header: Vec<ColumnHead>,
    pub meta: ListMeta,
    pub applied_filters: Vec<AppliedFilter>,
    pub available_filters: Vec<FilterOption>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTableFilter {
    pub col: String,
    pub op: FilterOp,
    pub val: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTableDescriptor {
    pub title: String,
    pub description: String,
    pub resource: String,
    pub filter: SubTableFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDescriptor {
    pub title: String,
    pub description: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailResponse {
    pub title: String,
    pub description: Option<String>,
    /// `[head, value]` pairs.
    pub fields: Vec<(ColumnHead, Value)>,
    pub actions: Vec<ActionDescriptor>,
    pub tables: Vec<SubTableDescriptor>,
    pub graphs: Vec<GraphDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Resource,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkHref {
    List(String),
    View(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationLink {
    pub name: String,
    pub display: String,
    pub href: LinkHref,
    #[serde(rename = "type")]
    pub kind: LinkType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationDrawer {
    pub name: Option<String>,
    pub icon: String,
    pub links: Vec<NavigationLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationResponse {
    pub name: String,
    pub icon_src: Option<String>,
    pub version: Option<String>,
    pub navigation: Vec<NavigationDrawer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResponse {
    pub display: String,
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: PageType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormResponse {
    pub title: String,
    pub public: bool,
    pub description: String,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSchemaResponse {
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardResponse {
    pub content: String,
}

/// Body of `/user` and `/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: Option<User>,
}
