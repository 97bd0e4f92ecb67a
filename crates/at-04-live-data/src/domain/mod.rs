//! Domain layer: events, subscriber ids and errors.

pub mod error;
pub mod event;
