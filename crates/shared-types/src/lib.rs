//! # Shared Types Crate
//!
//! Types that cross the boundary between the column model, the resolver
//! contract and the view pipeline.
//!
//! ## Design Principles
//!
//! - **Rows are opaque**: a row is a JSON object keyed by column reference.
//!   Nothing here knows how a backend stores it.
//! - **Filters travel as strings**: `AppliedFilter::val` is the wire value.
//!   Coercion to a column type is the resolver's job.
//! - **One sort key**: a list query is ordered by exactly one reference.

pub mod entities;
pub mod errors;
pub mod query;

pub use entities::*;
pub use errors::*;
pub use query::*;
