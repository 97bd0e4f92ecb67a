//! Admin configuration: resources, their views, pages and forms.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use at_01_column_model::FieldSpec;
use at_02_resolver::Resolver;
use serde::Serialize;
use shared_types::{AppliedFilter, FilterOp, SortDirection, User};

use super::action::ActionSpec;
use super::form::{FormCallback, FormSchema};
use super::graph::GraphSpec;
use super::text::TextSource;

type FilterProcessorFn = Arc<dyn Fn(AppliedFilter) -> AppliedFilter + Send + Sync>;
type DashboardFn = Arc<dyn Fn(&User) -> anyhow::Result<String> + Send + Sync>;

/// Rewrites a user-supplied filter before it reaches the resolver.
#[derive(Clone)]
pub struct FilterProcessor(FilterProcessorFn);

impl FilterProcessor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(AppliedFilter) -> AppliedFilter + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, filter: AppliedFilter) -> AppliedFilter {
        (self.0)(filter)
    }
}

impl fmt::Debug for FilterProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterProcessor(..)")
    }
}

/// Paginated table view.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub title: Option<String>,
    pub description: Option<TextSource>,
    pub fields: Vec<FieldSpec>,
    /// Key displayed in the synthetic "Detail" link; defaults to the id.
    pub detail_value_ref: Option<String>,
    /// Sort key when the request has none; defaults to the id column.
    pub default_sort_ref: Option<String>,
    pub default_sort_direction: SortDirection,
    /// Always applied, never shown, never passed to the filter processor.
    pub hidden_filters: Vec<AppliedFilter>,
    pub filter_processor: Option<FilterProcessor>,
}

impl ListView {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<TextSource>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default_sort(mut self, reference: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort_ref = Some(reference.into());
        self.default_sort_direction = direction;
        self
    }

    pub fn with_detail_value_ref(mut self, reference: impl Into<String>) -> Self {
        self.detail_value_ref = Some(reference.into());
        self
    }

    pub fn with_hidden_filter(mut self, filter: AppliedFilter) -> Self {
        self.hidden_filters.push(filter);
        self
    }

    pub fn with_filter_processor(mut self, processor: FilterProcessor) -> Self {
        self.filter_processor = Some(processor);
        self
    }
}

/// Table of another resource embedded in a detail view, filtered by the
/// current entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTable {
    pub title: String,
    pub description: String,
    pub resource: String,
    pub filter_col: String,
    pub filter_op: FilterOp,
    /// Entry key holding the filter value.
    pub filter_ref: String,
}

impl SubTable {
    pub fn new(
        title: impl Into<String>,
        resource: impl Into<String>,
        filter_col: impl Into<String>,
        filter_op: FilterOp,
        filter_ref: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            resource: resource.into(),
            filter_col: filter_col.into(),
            filter_op,
            filter_ref: filter_ref.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Single-entry view.
#[derive(Debug, Clone, Default)]
pub struct DetailView {
    /// `$field` / `${field}` placeholders are filled from the entry.
    pub title: Option<String>,
    pub description: Option<TextSource>,
    pub fields: Vec<FieldSpec>,
    pub actions: Vec<ActionSpec>,
    pub tables: Vec<SubTable>,
    pub graphs: Vec<GraphSpec>,
}

impl DetailView {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<TextSource>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_table(mut self, table: SubTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_graph(mut self, graph: GraphSpec) -> Self {
        self.graphs.push(graph);
        self
    }
}

/// Form creating a new entry.
#[derive(Debug, Clone)]
pub struct CreateView {
    pub schema: FormSchema,
    pub callback: FormCallback,
}

impl CreateView {
    pub fn new(schema: FormSchema, callback: FormCallback) -> Self {
        Self { schema, callback }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceViews {
    pub list: Option<ListView>,
    pub detail: Option<DetailView>,
    pub create: Option<CreateView>,
}

/// A table-backed resource.
#[derive(Clone)]
pub struct Resource {
    pub name: String,
    pub display: Option<String>,
    /// Navigation drawer; `None` groups the resource under an unnamed drawer.
    pub navigation: Option<String>,
    pub hidden: bool,
    pub id_column: String,
    pub resolver: Arc<dyn Resolver>,
    pub views: ResourceViews,
}

impl Resource {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            name: name.into(),
            display: None,
            navigation: None,
            hidden: false,
            id_column: "id".to_string(),
            resolver,
            views: ResourceViews::default(),
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_navigation(mut self, drawer: impl Into<String>) -> Self {
        self.navigation = Some(drawer.into());
        self
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_list(mut self, view: ListView) -> Self {
        self.views.list = Some(view);
        self
    }

    pub fn with_detail(mut self, view: DetailView) -> Self {
        self.views.detail = Some(view);
        self
    }

    pub fn with_create(mut self, view: CreateView) -> Self {
        self.views.create = Some(view);
        self
    }

    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("id_column", &self.id_column)
            .field("views", &self.views)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Markdown,
    Html,
}

/// Free-form content page.
#[derive(Debug, Clone)]
pub struct Page {
    pub name: String,
    pub display: Option<String>,
    pub navigation: Option<String>,
    pub content: TextSource,
    pub kind: PageType,
    pub public: bool,
}

impl Page {
    pub fn new(name: impl Into<String>, content: impl Into<TextSource>) -> Self {
        Self {
            name: name.into(),
            display: None,
            navigation: None,
            content: content.into(),
            kind: PageType::Markdown,
            public: false,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_navigation(mut self, drawer: impl Into<String>) -> Self {
        self.navigation = Some(drawer.into());
        self
    }

    pub fn html(mut self) -> Self {
        self.kind = PageType::Html;
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

/// Standalone form reachable at `/input_form/{location}`.
#[derive(Debug, Clone)]
pub struct InputForm {
    pub location: String,
    pub public: bool,
    pub title: String,
    pub description: TextSource,
    pub schema: FormSchema,
    pub callback: FormCallback,
}

impl InputForm {
    pub fn new(
        location: impl Into<String>,
        title: impl Into<String>,
        schema: FormSchema,
        callback: FormCallback,
    ) -> Self {
        Self {
            location: location.into(),
            public: false,
            title: title.into(),
            description: TextSource::Static(String::new()),
            schema,
            callback,
        }
    }

    pub fn with_description(mut self, description: impl Into<TextSource>) -> Self {
        self.description = description.into();
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// Top-level admin configuration.
#[derive(Clone)]
pub struct AdminConfig {
    pub name: String,
    pub icon_src: Option<String>,
    pub version: Option<String>,
    pub dashboard: DashboardFn,
    pub resources: Vec<Resource>,
    pub pages: Vec<Page>,
    /// Drawer name -> icon name. Drawers without an entry use `"x"`.
    pub navigation_icons: HashMap<String, String>,
    pub input_forms: Vec<InputForm>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "AdminTable".to_string(),
            icon_src: None,
            version: None,
            dashboard: Arc::new(|user: &User| {
                Ok(format!(
                    "# Dashboard\n\nWelcome {} to AdminTable",
                    user.email
                ))
            }),
            resources: Vec::new(),
            pages: Vec::new(),
            navigation_icons: HashMap::new(),
            input_forms: Vec::new(),
        }
    }
}

impl AdminConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_icon_src(mut self, icon_src: impl Into<String>) -> Self {
        self.icon_src = Some(icon_src.into());
        self
    }

    pub fn with_dashboard<F>(mut self, f: F) -> Self
    where
        F: Fn(&User) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.dashboard = Arc::new(f);
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn input_form(mut self, form: InputForm) -> Self {
        self.input_forms.push(form);
        self
    }

    pub fn navigation_icon(mut self, drawer: impl Into<String>, icon: impl Into<String>) -> Self {
        self.navigation_icons.insert(drawer.into(), icon.into());
        self
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("name", &self.name)
            .field("resources", &self.resources)
            .field("pages", &self.pages)
            .field("input_forms", &self.input_forms)
            .finish_non_exhaustive()
    }
}
