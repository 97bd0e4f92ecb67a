//! # AT-04 Live Data
//!
//! Pushes values to live fields. Each topic has at most one producer task,
//! shared by all of the topic's subscribers.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `LiveEvent`, `SubscriberId`, `LiveError`
//! - **Ports Layer** (`ports/`)
//!   - `LiveProducer` / `ProducerFactory`: value sources, opened per topic
//!   - `LiveSubscriber`: a connected client, implemented by the transport
//! - **Adapters Layer** (`adapters/`): `StreamProducer`, `FnProducerFactory`
//! - **Service** (`service.rs`): `LiveDataHub`
//!
//! ## Lifecycle
//!
//! ```text
//! first subscribe ──► producer opened, task spawned
//! next value      ──► sent to every subscriber concurrently
//! send fails      ──► that subscriber is closed and dropped
//! last leaves     ──► entry removed, producer closed
//! producer ends   ──► entry removed, remaining subscribers closed
//! ```
//!
//! Delivery has no timeouts and no retries.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FnProducerFactory, StreamProducer};
pub use domain::error::LiveError;
pub use domain::event::{LiveEvent, SubscriberId};
pub use ports::{LiveProducer, LiveSubscriber, ProducerFactory};
pub use service::LiveDataHub;
