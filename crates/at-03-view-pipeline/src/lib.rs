//! # AT-03 View Pipeline
//!
//! Orchestrates every admin view: list, detail, actions, graphs, create
//! views, input forms, pages, navigation and the dashboard.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `AdminConfig`, `Resource`, `ListView`, `DetailView`, ...: declarative
//!     configuration
//!   - `ActionSpec`, `GraphSpec`, `FormSchema`, `ParamSpec`: callbacks and
//!     their typed parameters
//!   - `CallbackReturn` / `classify`: callback results to response envelopes
//!   - `PipelineError` / `ErrorClass`: failures and how they are reported
//!
//! - **Service Layer** (`service/`)
//!   - `ViewPipeline`: validated configuration plus the request handlers
//!
//! ## List Flow
//!
//! ```text
//! ListQuery ──► page/per_page/sort defaults
//!           ──► filter_options() ──► reject unknown refs ──► processor
//!           ──► resolve_list(applied + hidden) ──► rows x columns
//!           ──► ListResponse { data, header, meta, filters, pagination }
//! ```
//!
//! ## Error Classes
//!
//! | Class        | Status | Examples                                  |
//! |--------------|--------|-------------------------------------------|
//! | BadRequest   | 400    | bad paging, unknown filter, bad range     |
//! | Unauthorized | 401    | private page or form without a user       |
//! | NotFound     | 404    | unknown resource, entry, action or graph  |
//! | Rejected     | 200    | validation or action failure, shown inline |
//! | Internal     | 500    | configuration, upstream, contract errors  |

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod service;

pub use domain::action::{ActionDescriptor, ActionParams, ActionSpec};
pub use domain::callback::{classify, ActionResponse, CallbackReturn, Redirect};
pub use domain::config::{
    AdminConfig, CreateView, DetailView, FilterProcessor, InputForm, ListView, Page, PageType,
    Resource, ResourceViews, SubTable,
};
pub use domain::envelope::{
    CreateSchemaResponse, DashboardResponse, DetailResponse, FormResponse, GraphDescriptor,
    ListMeta, ListResponse, NavigationDrawer, NavigationLink, NavigationResponse, PageResponse,
    SubTableDescriptor, UserResponse,
};
pub use domain::error::{ErrorClass, PipelineError};
pub use domain::form::{FormCallback, FormSchema};
pub use domain::graph::{GraphData, GraphRange, GraphSpec, LineChart};
pub use domain::params::{ParamDescriptor, ParamSpec, ParamType};
pub use domain::query::{ListQuery, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use domain::text::{render_template, title_case, TextSource};
pub use service::{ViewPipeline, DEFAULT_MAX_PER_PAGE};
