//! # AT-02 Resolver Contract
//!
//! Decouples rendering from any particular data store.
//!
//! ## Architecture
//!
//! - **Ports Layer** (`ports/`): the `Resolver` trait every storage adapter
//!   implements
//! - **Domain Layer** (`domain/`): errors, schema and the filter/sort
//!   semantics shared by adapters
//! - **Adapters Layer** (`adapters/`): `InMemoryResolver`, the reference
//!   adapter backed by a `Vec<Row>`
//!
//! ## Query Semantics
//!
//! ```text
//! rows --(all filters, AND)--> matching --(one sort key)--> ordered
//!      --(offset = (page-1)*per_page, limit = per_page)--> page
//!
//! total = |matching|   (before pagination)
//! ```
//!
//! ## Errors
//!
//! `UnknownColumn`, `UnsupportedOperator`, `InvalidValue` and
//! `InvalidPagination` are caused by the request. `Backend` is an upstream
//! failure.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::InMemoryResolver;
pub use domain::error::ResolverError;
pub use domain::matching::{compare_values, like_match, parse_list_literal};
pub use domain::schema::{ColumnSchema, ValueKind};
pub use ports::Resolver;
