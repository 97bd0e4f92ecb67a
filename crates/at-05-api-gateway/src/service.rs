//! API Gateway service - main entry point.
//!
//! Owns the HTTP server: builds the router with its middleware, binds the
//! listener and runs until the shutdown future resolves. On the way out the
//! live-data hub is shut down so producers stop and sockets get a close
//! frame.

use std::future::Future;
use std::sync::Arc;

use at_03_view_pipeline::ViewPipeline;
use at_04_live_data::LiveDataHub;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::auth::{AuthProvider, StaticAuthProvider};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::{create_cors_layer, GatewayMetrics, TracingLayer};
use crate::routes::{self, AppState};

/// API Gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    pipeline: Arc<ViewPipeline>,
    hub: Arc<LiveDataHub>,
    auth: Arc<dyn AuthProvider>,
    metrics: Arc<GatewayMetrics>,
}

impl ApiGatewayService {
    /// Create a new API Gateway service.
    ///
    /// Logins are checked against the configured users unless another
    /// provider is set with [`with_auth_provider`](Self::with_auth_provider).
    pub fn new(
        config: GatewayConfig,
        pipeline: Arc<ViewPipeline>,
        hub: Arc<LiveDataHub>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let auth = Arc::new(StaticAuthProvider::new(&config.auth));

        Ok(Self {
            config,
            pipeline,
            hub,
            auth,
            metrics: Arc::new(GatewayMetrics::new()),
        })
    }

    pub fn with_auth_provider(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Router with every route and the middleware stack.
    pub fn router(&self) -> Router {
        let state = AppState {
            pipeline: Arc::clone(&self.pipeline),
            hub: Arc::clone(&self.hub),
            auth: Arc::clone(&self.auth),
            metrics: Arc::clone(&self.metrics),
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new(Arc::clone(&self.metrics)))
            .layer(TimeoutLayer::new(self.config.request_timeout()));

        routes::router(state)
            .layer(DefaultBodyLimit::max(self.config.limits.max_request_size))
            .layer(middleware)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.http.enabled {
            info!("HTTP server disabled");
            return Ok(());
        }

        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(addr = %addr, "Starting HTTP server");

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        info!("Stopping live data hub");
        self.hub.shutdown().await;

        match result {
            Ok(()) => {
                info!("API Gateway stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Server(e.to_string()))
            }
        }
    }
}
