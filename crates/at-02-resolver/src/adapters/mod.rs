//! Storage adapters implementing `Resolver`.

pub mod memory;
