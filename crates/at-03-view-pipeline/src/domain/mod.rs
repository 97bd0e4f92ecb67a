//! Domain layer: configuration, envelopes and callback contracts.

pub mod action;
pub mod callback;
pub mod config;
pub mod envelope;
pub mod error;
pub mod form;
pub mod graph;
pub mod params;
pub mod query;
pub mod text;
