//! # AT-01 Column Model
//!
//! Turns heterogeneous field specifications into an ordered list of
//! renderable columns.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): no I/O
//!   - `FieldSpec` / `FieldItem`: the shorthand shapes accepted in view config
//!   - `LinkDetail`, `LinkTable`, `LiveValue`: marker types for special fields
//!   - `Column` / `ColumnKind`: the normalized, renderable form
//!
//! - **Resolver** (`resolver.rs`): the normalization algorithm
//!   - `FieldResolver`: lazy, one column per spec, in input order
//!   - `resolve_fields`: eager, fails on the first bad spec
//!
//! ## Field Shapes
//!
//! ```text
//! "email"                                  -> Plain    ref=email
//! ("E-Mail", "email")                      -> Plain    ref=email
//! ("Name", compute(|row| ...))             -> Computed ref=None, not sortable
//! ("Owner", LinkDetail { .. })             -> LinkDetail
//! ("Items", LinkTable { .. })              -> LinkTable
//! ("CPU", LiveValue { .. })                -> Live
//! ("E-Mail", "Primary address", "email")   -> same, with description
//! ```
//!
//! Anything else fails with `ColumnError::InvalidFieldSpec`.
//!
//! ## Cell Values
//!
//! A computed cell never fails: an error or a panic inside the user function
//! is logged and the cell renders as `"# ERROR #"`. Every other kind fails
//! with `ColumnError::MissingField` when the row lacks a key it references.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod error;
pub mod resolver;

pub use domain::column::{Column, ColumnHead, ColumnKind, COMPUTE_ERROR_MARKER};
pub use domain::field::{
    ComputeFn, FieldItem, FieldSpec, LinkDetail, LinkTable, LiveValue, NativeColumn,
};
pub use error::ColumnError;
pub use resolver::{resolve_field, resolve_fields, FieldResolver};
