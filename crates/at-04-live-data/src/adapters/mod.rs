//! Producer adapters over streams and closures.

pub mod stream;

pub use stream::{FnProducerFactory, StreamProducer};
