//! Domain layer: errors, schema and matching rules.

pub mod error;
pub mod matching;
pub mod schema;
