//! Service layer: `ViewPipeline` and its request handlers.
//!
//! Handlers are grouped by concern:
//!
//! - `list`: paginated tables
//! - `detail`: single entries and their graphs
//! - `mutation`: actions, create views and input forms
//! - `navigation`: navigation tree, pages and the dashboard

mod detail;
mod list;
mod mutation;
mod navigation;


use std::collections::{HashMap, HashSet};

use at_01_column_model::{resolve_fields, Column, LinkDetail};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use shared_types::ResourceContext;
use tracing::info;

use crate::domain::config::{AdminConfig, InputForm, Page, Resource};
use crate::domain::error::PipelineError;
use crate::domain::query::DEFAULT_PER_PAGE;

/// Upper bound for `per_page` unless configured otherwise.
pub const DEFAULT_MAX_PER_PAGE: u64 = 1000;

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Columns resolved once at startup.
struct CompiledViews {
    ctx: ResourceContext,
    /// Synthetic "Detail" link first when the resource has a detail view.
    list_columns: Option<Vec<Column>>,
    detail_columns: Option<Vec<Column>>,
}

/// Serves every view described by an `AdminConfig`.
///
/// Construction normalizes all field specs, so a bad configuration fails at
/// startup instead of on the first request. The pipeline holds no
/// per-request state and is shared behind an `Arc`.
pub struct ViewPipeline {
    config: AdminConfig,
    compiled: Vec<CompiledViews>,
    index: HashMap<String, usize>,
    default_per_page: u64,
    max_per_page: u64,
}

impl ViewPipeline {
    pub fn new(config: AdminConfig) -> Result<Self, PipelineError> {
        let mut index = HashMap::new();
        let mut compiled = Vec::with_capacity(config.resources.len());

        for (i, resource) in config.resources.iter().enumerate() {
            if index.insert(resource.name.clone(), i).is_some() {
                return Err(PipelineError::Configuration(format!(
                    "duplicate resource name '{}'",
                    resource.name
                )));
            }
            compiled.push(compile_views(resource)?);
        }

        if let Some(name) = first_duplicate(config.pages.iter().map(|p| p.name.as_str())) {
            return Err(PipelineError::Configuration(format!(
                "duplicate page '{name}'"
            )));
        }
        if let Some(location) =
            first_duplicate(config.input_forms.iter().map(|f| f.location.as_str()))
        {
            return Err(PipelineError::Configuration(format!(
                "duplicate input form location '{location}'"
            )));
        }

        info!(
            name = %config.name,
            resources = config.resources.len(),
            pages = config.pages.len(),
            input_forms = config.input_forms.len(),
            "View pipeline ready"
        );

        Ok(Self {
            config,
            compiled,
            index,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
        })
    }

    /// Override the page size used when a request has none, and the largest
    /// page size a request may ask for.
    pub fn with_page_limits(
        mut self,
        default_per_page: u64,
        max_per_page: u64,
    ) -> Result<Self, PipelineError> {
        if default_per_page == 0 || default_per_page > max_per_page {
            return Err(PipelineError::Configuration(format!(
                "invalid page limits: default {default_per_page}, max {max_per_page}"
            )));
        }
        self.default_per_page = default_per_page;
        self.max_per_page = max_per_page;
        Ok(self)
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    fn resource(&self, name: &str) -> Result<(&Resource, &CompiledViews), PipelineError> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| PipelineError::NotFound(format!("Unknown resource: {name}")))?;
        Ok((&self.config.resources[i], &self.compiled[i]))
    }

    fn page(&self, name: &str) -> Result<&Page, PipelineError> {
        self.config
            .pages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PipelineError::NotFound(format!("Page not found: {name}")))
    }

    fn input_form_by_location(&self, location: &str) -> Result<&InputForm, PipelineError> {
        self.config
            .input_forms
            .iter()
            .find(|f| f.location == location)
            .ok_or_else(|| PipelineError::NotFound(format!("Form not found: {location}")))
    }
}

fn compile_views(resource: &Resource) -> Result<CompiledViews, PipelineError> {
    let describe = |view: &str, e: &dyn std::fmt::Display| {
        PipelineError::Configuration(format!(
            "resource '{}' {view} view: {e}",
            resource.name
        ))
    };

    let list_columns = match &resource.views.list {
        Some(view) => {
            let mut columns = Vec::with_capacity(view.fields.len() + 1);
            if resource.views.detail.is_some() {
                columns.push(Column::link_detail(
                    "Detail",
                    LinkDetail {
                        reference: view
                            .detail_value_ref
                            .clone()
                            .unwrap_or_else(|| resource.id_column.clone()),
                        resource: resource.name.clone(),
                        id_ref: resource.id_column.clone(),
                    },
                ));
            }
            columns.extend(resolve_fields(&view.fields).map_err(|e| describe("list", &e))?);
            Some(columns)
        }
        None => None,
    };

    let detail_columns = match &resource.views.detail {
        Some(view) => {
            if let Some(r) = first_duplicate(view.actions.iter().map(|a| a.reference.as_str())) {
                return Err(describe("detail", &format!("duplicate action '{r}'")));
            }
            if let Some(r) = first_duplicate(view.graphs.iter().map(|g| g.reference.as_str())) {
                return Err(describe("detail", &format!("duplicate graph '{r}'")));
            }
            Some(resolve_fields(&view.fields).map_err(|e| describe("detail", &e))?)
        }
        None => None,
    };

    Ok(CompiledViews {
        ctx: ResourceContext::new(resource.name.clone(), resource.id_column.clone()),
        list_columns,
        detail_columns,
    })
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|name| !seen.insert(*name))
}

fn missing_view(resource: &str, view: &str) -> PipelineError {
    PipelineError::Configuration(format!("resource '{resource}' has no {view} view"))
}

pub(crate) fn quote_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
