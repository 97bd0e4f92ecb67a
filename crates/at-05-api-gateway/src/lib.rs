//! # AT-05 API Gateway
//!
//! HTTP and WebSocket transport for the view pipeline and the live-data
//! hub. Nothing here decides what a view contains: handlers translate
//! requests into `ViewPipeline` calls and `PipelineError`s into status codes.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `GatewayConfig`, `ApiError`, `GatewayError`
//! - **Auth** (`auth.rs`): `AuthProvider` port, `StaticAuthProvider`, and the
//!   `AuthUser` / `MaybeUser` extractors
//! - **Middleware** (`middleware/`): CORS, request tracing, metrics
//! - **Routes** (`routes.rs`): the route table and handlers
//! - **WebSocket** (`ws.rs`): `WsSubscriber`, one hub subscriber per socket
//! - **Service** (`service.rs`): `ApiGatewayService`, server lifecycle
//!
//! ## Routes
//!
//! ```text
//! POST /ping                                         auth
//! POST /login
//! GET  /user | /navigation | /dashboard              auth
//! GET  /resource/:resource/list                      auth
//! GET  /resource/:resource/create  (schema)          auth
//! POST /resource/:resource/create                    auth
//! GET  /resource/:resource/detail/:id                auth
//! POST /resource/:resource/detail/:id/action/:action auth
//! GET  /resource/:resource/detail/:id/graph/:graph   auth
//! GET  /page/:name/view                              auth unless public
//! GET  /input_form/:location                         auth unless public
//! POST /input_form/:location                         auth unless public
//! GET  /ws/live_data?topic=...                       auth, upgrade
//! GET  /health | /metrics
//! ```
//!
//! ## Status Codes
//!
//! | Pipeline class | Status | Body                          |
//! |----------------|--------|-------------------------------|
//! | Rejected       | 200    | `{message, failed: true}`     |
//! | BadRequest     | 400    | `{message}`                   |
//! | Unauthorized   | 401    | `{message: "Unauthorized"}`   |
//! | NotFound       | 404    | `{message}`                   |
//! | Internal       | 500    | `{message}`                   |

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod domain;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod ws;

#[cfg(test)]
mod tests;

pub use auth::{AuthProvider, AuthUser, MaybeUser, StaticAuthProvider};
pub use domain::config::{
    AuthConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig,
    UserCredentials,
};
pub use domain::error::{ApiError, GatewayError};
pub use middleware::{GatewayMetrics, MetricsSnapshot};
pub use routes::AppState;
pub use service::ApiGatewayService;
pub use ws::WsSubscriber;
