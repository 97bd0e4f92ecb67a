//! Inbound port: the contract a storage adapter satisfies.

use std::collections::BTreeMap;

use async_trait::async_trait;
use shared_types::{AppliedFilter, FilterOption, ResolvedListData, ResourceContext, Row, Sort};

use crate::domain::error::ResolverError;

/// Storage-agnostic data access for one or more resources.
///
/// Implementations own their locking; the pipeline calls them concurrently.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Return one page of rows.
    ///
    /// # Arguments
    /// - `page`: 1-based page number, `>= 1`
    /// - `per_page`: page size, `> 0`
    /// - `filters`: conjunctive; an empty slice matches every row
    /// - `sort`: the single ordering key
    ///
    /// # Returns
    /// The page and `Pagination { page, per_page, total }`, with `total`
    /// counting every matching row before pagination.
    async fn resolve_list(
        &self,
        ctx: &ResourceContext,
        page: u64,
        per_page: u64,
        filters: &[AppliedFilter],
        sort: &Sort,
    ) -> Result<ResolvedListData, ResolverError>;

    /// Return the entry identified by `id`, or `None` when absent.
    async fn resolve_detail(
        &self,
        ctx: &ResourceContext,
        id: &str,
    ) -> Result<Option<Row>, ResolverError>;

    /// Columns a list of this resource can be filtered on, keyed by ref.
    async fn filter_options(
        &self,
        ctx: &ResourceContext,
    ) -> Result<BTreeMap<String, FilterOption>, ResolverError>;
}
