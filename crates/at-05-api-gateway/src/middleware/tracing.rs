//! Request tracing middleware.
//!
//! Wraps each request in an `api_request` span carrying a fresh request id,
//! echoes the id in `x-request-id`, and records status and latency in the
//! gateway metrics.

use crate::middleware::metrics::GatewayMetrics;
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tracing layer that creates spans for each request
#[derive(Clone)]
pub struct TracingLayer {
    metrics: Arc<GatewayMetrics>,
}

impl TracingLayer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Arc<GatewayMetrics>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let metrics = Arc::clone(&self.metrics);

        let request_id = Uuid::now_v7();
        let span = info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            request_id = %request_id,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(req).await;
                let latency_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(mut response) => {
                        let status = response.status().as_u16();
                        Span::current().record("http.status_code", status);
                        metrics.record_request(status, latency_ms);
                        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                        debug!(status, latency_ms, "Request finished");
                        Ok(response)
                    }
                    Err(e) => {
                        metrics.record_request(500, latency_ms);
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(metrics: Arc<GatewayMetrics>) -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(TracingLayer::new(metrics))
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let metrics = Arc::new(GatewayMetrics::new());
        let response = app(Arc::clone(&metrics))
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert_eq!(Uuid::parse_str(id).unwrap().get_version_num(), 7);
    }

    #[tokio::test]
    async fn test_status_recorded() {
        let metrics = Arc::new(GatewayMetrics::new());
        let app = app(Arc::clone(&metrics));

        app.clone()
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        app.clone()
            .oneshot(Request::get("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let http = metrics.snapshot().http;
        assert_eq!((http.handled, http.ok, http.server_errors), (2, 1, 1));
    }
}
