use serde_json::Value;
use shared_types::{AppliedFilter, Sort};
use tracing::debug;

use super::{missing_view, ViewPipeline};
use crate::domain::envelope::{ListMeta, ListResponse};
use crate::domain::error::PipelineError;
use crate::domain::query::{ListQuery, DEFAULT_PAGE};

impl ViewPipeline {
    /// Render one page of a resource's list view.
    ///
    /// Filters are validated against the resolver's filter options before
    /// any rows are requested. Hidden filters are applied but not echoed.
    pub async fn handle_list(
        &self,
        resource_name: &str,
        query: ListQuery,
    ) -> Result<ListResponse, PipelineError> {
        let (resource, compiled) = self.resource(resource_name)?;
        let view = resource
            .views
            .list
            .as_ref()
            .ok_or_else(|| missing_view(resource_name, "list"))?;
        let columns = compiled
            .list_columns
            .as_deref()
            .ok_or_else(|| missing_view(resource_name, "list"))?;

        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let per_page = query.per_page.unwrap_or(self.default_per_page);
        if page < 1 {
            return Err(PipelineError::BadRequest(format!("Invalid page: {page}")));
        }
        if per_page < 1 || per_page > self.max_per_page {
            return Err(PipelineError::BadRequest(format!(
                "Invalid per_page: {per_page} (1..={})",
                self.max_per_page
            )));
        }

        let sort = match &query.sort {
            Some(raw) => Sort::parse(raw)?,
            None => Sort::new(
                view.default_sort_ref
                    .clone()
                    .unwrap_or_else(|| resource.id_column.clone()),
                view.default_sort_direction,
            ),
        };

        let options = resource.resolver.filter_options(&compiled.ctx).await?;
        let applied = query
            .filters
            .iter()
            .map(|raw| {
                let filter = AppliedFilter::parse(raw)?;
                let option = options.get(&filter.reference).ok_or_else(|| {
                    PipelineError::BadRequest(format!("Unknown filter: {}", filter.reference))
                })?;
                let filter = filter.with_display(option.display.clone());
                Ok(match &view.filter_processor {
                    Some(processor) => processor.apply(filter),
                    None => filter,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        debug!(
            resource = %resource.name,
            page,
            per_page,
            filters = applied.len(),
            sort = %sort.to_query(),
            "Resolving list"
        );

        let effective: Vec<AppliedFilter> = applied
            .iter()
            .chain(view.hidden_filters.iter())
            .cloned()
            .collect();
        let data = resource
            .resolver
            .resolve_list(&compiled.ctx, page, per_page, &effective, &sort)
            .await?;

        let rows = data
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| c.value(row))
                    .collect::<Result<Vec<Value>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResponse {
            data: rows,
            header: columns.iter().map(|c| c.head(Some(&sort))).collect(),
            meta: ListMeta {
                title: view
                    .title
                    .clone()
                    .unwrap_or_else(|| resource.display_name().to_string()),
                description: view.description.as_ref().map(|d| d.render(None)),
                has_create: resource.views.create.is_some(),
            },
            applied_filters: applied,
            available_filters: options.into_values().collect(),
            pagination: data.pagination,
        })
    }
}
