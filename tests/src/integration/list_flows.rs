//! # List Flows
//!
//! The view pipeline driving a resolver end to end: paging, filter
//! validation, hidden filters and sorting.
//!
//! ```text
//! ListQuery ──► ViewPipeline::handle_list ──► Resolver::filter_options
//!                                         ──► Resolver::resolve_list
//! ```

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use at_02_resolver::{ColumnSchema, InMemoryResolver, Resolver, ResolverError};
    use at_03_view_pipeline::{AdminConfig, ErrorClass, ListQuery, ListView, Resource, ViewPipeline};
    use shared_types::{
        AppliedFilter, FilterOp, FilterOption, ResolvedListData, ResourceContext, Row, Sort,
    };

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn orders(count: i64) -> Arc<InMemoryResolver> {
        let rows = (1..=count).map(|i| {
            let status = if i % 3 == 0 { "open" } else { "closed" };
            json!({"id": i, "customer": format!("customer-{i:02}"), "status": status})
                .as_object()
                .cloned()
                .unwrap()
        });
        Arc::new(
            InMemoryResolver::new(
                vec![
                    ColumnSchema::integer("id", "ID"),
                    ColumnSchema::text("customer", "Customer"),
                    ColumnSchema::text("status", "Status"),
                ],
                "id",
            )
            .unwrap()
            .with_rows(rows),
        )
    }

    /// Counts calls reaching the wrapped resolver.
    struct Counting {
        inner: Arc<InMemoryResolver>,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl Resolver for Counting {
        async fn resolve_list(
            &self,
            ctx: &ResourceContext,
            page: u64,
            per_page: u64,
            filters: &[AppliedFilter],
            sort: &Sort,
        ) -> Result<ResolvedListData, ResolverError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner
                .resolve_list(ctx, page, per_page, filters, sort)
                .await
        }

        async fn resolve_detail(
            &self,
            ctx: &ResourceContext,
            id: &str,
        ) -> Result<Option<Row>, ResolverError> {
            self.inner.resolve_detail(ctx, id).await
        }

        async fn filter_options(
            &self,
            ctx: &ResourceContext,
        ) -> Result<BTreeMap<String, FilterOption>, ResolverError> {
            self.inner.filter_options(ctx).await
        }
    }

    fn pipeline(resolver: Arc<dyn Resolver>, view: ListView) -> ViewPipeline {
        let config = AdminConfig::new("Shop").resource(Resource::new("Orders", resolver).with_list(view));
        ViewPipeline::new(config).unwrap()
    }

    fn order_view() -> ListView {
        ListView::new(vec!["id".into(), "customer".into(), ("State", "status").into()])
    }

    fn ids(data: &[Vec<Value>]) -> Vec<i64> {
        data.iter().map(|r| r[0].as_i64().unwrap()).collect()
    }

    // =========================================================================
    // PAGINATION
    // =========================================================================

    #[tokio::test]
    async fn test_pagination_round_trip() {
        let pipeline = pipeline(orders(25), order_view());

        let mut counts = Vec::new();
        let mut seen = Vec::new();
        for page in 1..=3 {
            let list = pipeline
                .handle_list("Orders", ListQuery::default().page(page).per_page(10))
                .await
                .unwrap();
            assert_eq!(list.pagination.total, 25);
            assert_eq!(list.pagination.page, page);
            counts.push(list.data.len());
            seen.extend(ids(&list.data));
        }

        assert_eq!(counts, vec![10, 10, 5]);
        assert_eq!(seen, (1..=25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let pipeline = pipeline(orders(25), order_view());
        let list = pipeline
            .handle_list("Orders", ListQuery::default().page(4).per_page(10))
            .await
            .unwrap();
        assert!(list.data.is_empty());
        assert_eq!(list.pagination.total, 25);
    }

    // =========================================================================
    // FILTERS
    // =========================================================================

    #[tokio::test]
    async fn test_filter_is_idempotent() {
        let resolver = orders(25);
        let ctx = ResourceContext::new("Orders", "id");
        let filters = vec![
            AppliedFilter::new("status", FilterOp::Eq, "open"),
            AppliedFilter::new("id", FilterOp::Gt, "5"),
        ];
        let sort = Sort::asc("id");

        let first = resolver.resolve_list(&ctx, 1, 50, &filters, &sort).await.unwrap();
        let second = resolver.resolve_list(&ctx, 1, 50, &filters, &sort).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.pagination.total, 7);
        assert_eq!(resolver.len(), 25);
    }

    #[tokio::test]
    async fn test_filter_through_pipeline_is_echoed_with_display() {
        let pipeline = pipeline(orders(25), order_view());
        let list = pipeline
            .handle_list("Orders", ListQuery::default().filter("status;eq;open"))
            .await
            .unwrap();

        assert_eq!(list.pagination.total, 8);
        assert_eq!(list.applied_filters.len(), 1);
        assert_eq!(list.applied_filters[0].display.as_deref(), Some("Status"));
    }

    #[tokio::test]
    async fn test_unknown_filter_never_reaches_resolver() {
        let counting = Arc::new(Counting {
            inner: orders(5),
            list_calls: AtomicUsize::new(0),
        });
        let pipeline = pipeline(counting.clone(), order_view());

        let err = pipeline
            .handle_list("Orders", ListQuery::default().filter("secret;eq;1"))
            .await
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::BadRequest);
        assert_eq!(counting.list_calls.load(Ordering::SeqCst), 0);

        pipeline.handle_list("Orders", ListQuery::default()).await.unwrap();
        assert_eq!(counting.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hidden_filter_applied_but_not_echoed() {
        let view = order_view().with_hidden_filter(AppliedFilter::new("status", FilterOp::Eq, "open"));
        let pipeline = pipeline(orders(25), view);

        let list = pipeline
            .handle_list("Orders", ListQuery::default().filter("id;le;12"))
            .await
            .unwrap();

        assert_eq!(ids(&list.data), vec![3, 6, 9, 12]);
        assert_eq!(list.applied_filters.len(), 1);
        assert_eq!(list.applied_filters[0].reference, "id");
    }

    // =========================================================================
    // SORTING
    // =========================================================================

    #[tokio::test]
    async fn test_sort_descending() {
        let pipeline = pipeline(orders(12), order_view());
        let list = pipeline
            .handle_list("Orders", ListQuery::default().sort("customer;desc").per_page(3))
            .await
            .unwrap();
        assert_eq!(ids(&list.data), vec![12, 11, 10]);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    proptest! {
        #[test]
        fn prop_pages_partition_rows(total in 0i64..60, per_page in 1u64..15) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let pipeline = pipeline(orders(total), order_view());

            let pages = (total as u64).div_ceil(per_page).max(1);
            let mut seen = Vec::new();
            for page in 1..=pages {
                let list = runtime
                    .block_on(pipeline.handle_list(
                        "Orders",
                        ListQuery::default().page(page).per_page(per_page),
                    ))
                    .unwrap();
                prop_assert_eq!(list.pagination.total, total as u64);
                prop_assert!(list.data.len() as u64 <= per_page);
                seen.extend(ids(&list.data));
            }
            prop_assert_eq!(seen, (1..=total).collect::<Vec<_>>());
        }
    }
}
