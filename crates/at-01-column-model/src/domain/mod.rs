//! Domain layer: field shorthand and the normalized column.

pub mod column;
pub mod field;
