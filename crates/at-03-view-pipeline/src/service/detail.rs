use shared_types::Row;
use tracing::{debug, error};

use super::{missing_view, CompiledViews, ViewPipeline};
use crate::domain::config::{DetailView, Resource};
use crate::domain::envelope::{
    DetailResponse, GraphDescriptor, SubTableDescriptor, SubTableFilter,
};
use crate::domain::error::PipelineError;
use crate::domain::graph::{GraphData, GraphRange};
use crate::domain::text::render_template;

impl ViewPipeline {
    /// Render the detail view of one entry.
    pub async fn handle_detail(
        &self,
        resource_name: &str,
        id: &str,
    ) -> Result<DetailResponse, PipelineError> {
        let (resource, compiled, view) = self.detail_view(resource_name)?;
        let columns = compiled
            .detail_columns
            .as_deref()
            .ok_or_else(|| missing_view(resource_name, "detail"))?;
        let entry = self.entry(resource, compiled, id).await?;

        let fields = columns
            .iter()
            .map(|c| Ok((c.head(None), c.value(&entry)?)))
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let tables = view
            .tables
            .iter()
            .map(|t| {
                let val = entry.get(&t.filter_ref).cloned().ok_or_else(|| {
                    PipelineError::Configuration(format!(
                        "sub-table '{}' references missing field '{}'",
                        t.title, t.filter_ref
                    ))
                })?;
                Ok(SubTableDescriptor {
                    title: t.title.clone(),
                    description: t.description.clone(),
                    resource: t.resource.clone(),
                    filter: SubTableFilter {
                        col: t.filter_col.clone(),
                        op: t.filter_op.clone(),
                        val,
                    },
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let title_template = view.title.as_deref().unwrap_or(resource.display_name());

        Ok(DetailResponse {
            title: render_template(title_template, &entry),
            description: view.description.as_ref().map(|d| d.render(Some(&entry))),
            fields,
            actions: view.actions.iter().map(|a| a.descriptor()).collect(),
            tables,
            graphs: view
                .graphs
                .iter()
                .map(|g| GraphDescriptor {
                    title: g.title.clone(),
                    description: g.description.clone(),
                    reference: g.reference.clone(),
                })
                .collect(),
        })
    }

    /// Produce the data of one graph of a detail view.
    pub async fn handle_graph(
        &self,
        resource_name: &str,
        id: &str,
        graph_ref: &str,
        range: GraphRange,
    ) -> Result<GraphData, PipelineError> {
        let (resource, compiled, view) = self.detail_view(resource_name)?;
        let graph = view
            .graphs
            .iter()
            .find(|g| g.reference == graph_ref)
            .ok_or_else(|| PipelineError::NotFound(format!("Graph {graph_ref} not found")))?;
        let entry = self.entry(resource, compiled, id).await?;

        debug!(resource = %resource.name, id, graph = graph_ref, ?range, "Computing graph");

        graph.call(entry, range).await.map_err(|e| {
            error!(resource = %resource.name, id, graph = graph_ref, error = %e, "Graph callback failed");
            PipelineError::Upstream(e.to_string())
        })
    }

    pub(super) fn detail_view(
        &self,
        resource_name: &str,
    ) -> Result<(&Resource, &CompiledViews, &DetailView), PipelineError> {
        let (resource, compiled) = self.resource(resource_name)?;
        let view = resource
            .views
            .detail
            .as_ref()
            .ok_or_else(|| missing_view(resource_name, "detail"))?;
        Ok((resource, compiled, view))
    }

    pub(super) async fn entry(
        &self,
        resource: &Resource,
        compiled: &CompiledViews,
        id: &str,
    ) -> Result<Row, PipelineError> {
        resource
            .resolver
            .resolve_detail(&compiled.ctx, id)
            .await?
            .ok_or_else(|| PipelineError::resource_not_found(id))
    }
}
