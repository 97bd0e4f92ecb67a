//! HTTP middleware.
//!
//! Layer order: Request → CORS → Tracing (+ metrics) → Timeout → Handler.
//! Body size is capped by axum's `DefaultBodyLimit` at the router.

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use tracing::TracingLayer;
