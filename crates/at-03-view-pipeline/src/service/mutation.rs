use serde_json::{Map, Value};
use shared_types::User;
use tracing::{error, info, warn};

use super::{missing_view, ViewPipeline};
use crate::domain::callback::{classify, ActionResponse};
use crate::domain::config::CreateView;
use crate::domain::envelope::{CreateSchemaResponse, FormResponse};
use crate::domain::error::PipelineError;
use crate::domain::params::coerce_params;

impl ViewPipeline {
    /// Run a detail-view action against one entry.
    ///
    /// A failing callback is reported as a rejected request rather than an
    /// internal error, so the client shows the message inline.
    pub async fn handle_action(
        &self,
        resource_name: &str,
        id: &str,
        action_ref: &str,
        params: &Map<String, Value>,
    ) -> Result<ActionResponse, PipelineError> {
        let (resource, compiled, view) = self.detail_view(resource_name)?;
        let action = view
            .actions
            .iter()
            .find(|a| a.reference == action_ref)
            .ok_or_else(|| PipelineError::NotFound(format!("Invalid action ref: {action_ref}")))?;
        let entry = self.entry(resource, compiled, id).await?;
        let params = coerce_params(&action.params, params)?;

        info!(resource = %resource.name, id, action = action_ref, "Calling action");

        let ret = action.call(entry, params).await.map_err(|e| {
            warn!(resource = %resource.name, id, action = action_ref, error = %e, "Action failed");
            PipelineError::Callback(e.to_string())
        })?;
        classify(ret, Some(&resource.name))
    }

    /// JSON Schema of a resource's create form.
    pub fn create_schema(&self, resource_name: &str) -> Result<CreateSchemaResponse, PipelineError> {
        let view = self.create_view(resource_name)?;
        Ok(CreateSchemaResponse {
            schema: view.schema.json_schema(),
        })
    }

    pub async fn handle_create(
        &self,
        resource_name: &str,
        body: &Value,
    ) -> Result<ActionResponse, PipelineError> {
        let view = self.create_view(resource_name)?;
        let data = view.schema.validate(body)?;

        let ret = view.callback.call(data).await.map_err(|e| {
            warn!(resource = resource_name, error = %e, "Create callback failed");
            PipelineError::Validation(e.to_string())
        })?;
        classify(ret, Some(resource_name))
    }

    /// Describe the input form at `location`. Private forms need a user.
    pub fn input_form(
        &self,
        location: &str,
        user: Option<&User>,
    ) -> Result<FormResponse, PipelineError> {
        let form = self.input_form_by_location(location)?;
        if !form.public && user.is_none() {
            return Err(PipelineError::Unauthorized);
        }
        Ok(FormResponse {
            title: form.title.clone(),
            public: form.public,
            description: form.description.render(None),
            schema: form.schema.json_schema(),
        })
    }

    pub async fn submit_input_form(
        &self,
        location: &str,
        user: Option<&User>,
        body: &Value,
    ) -> Result<ActionResponse, PipelineError> {
        let form = self.input_form_by_location(location)?;
        if !form.public && user.is_none() {
            return Err(PipelineError::Unauthorized);
        }
        let data = form.schema.validate(body)?;

        let ret = form.callback.call(data).await.map_err(|e| {
            error!(location, error = %e, "Input form callback failed");
            PipelineError::Upstream(e.to_string())
        })?;
        classify(ret, None)
    }

    fn create_view(&self, resource_name: &str) -> Result<&CreateView, PipelineError> {
        let (resource, _) = self.resource(resource_name)?;
        resource
            .views
            .create
            .as_ref()
            .ok_or_else(|| missing_view(resource_name, "create"))
    }
}
