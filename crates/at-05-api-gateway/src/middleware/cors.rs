//! CORS for the admin frontend.
//!
//! `"*"` in the origin or header list means "any". Entries that do not
//! parse as an origin, method or header name are skipped with a warning.
//! The request id header is always exposed so the frontend can quote it.

use crate::domain::config::CorsConfig;
use crate::middleware::tracing::REQUEST_ID_HEADER;
use axum::http::{HeaderName, HeaderValue, Method};
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

/// Build the CORS layer. A disabled config mirrors whatever the browser asks
/// for.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::very_permissive();
    }

    let layer = CorsLayer::new()
        .allow_origin(allow_origin(&config.allowed_origins))
        .allow_methods(parse_all::<Method>("method", &config.allowed_methods))
        .allow_headers(allow_headers(&config.allowed_headers))
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_credentials {
        layer.allow_credentials(true)
    } else {
        layer
    }
}

fn is_wildcard(list: &[String]) -> bool {
    list.iter().any(|entry| entry == "*")
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if is_wildcard(origins) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_all::<HeaderValue>("origin", origins))
    }
}

fn allow_headers(headers: &[String]) -> AllowHeaders {
    if is_wildcard(headers) {
        AllowHeaders::any()
    } else {
        AllowHeaders::list(parse_all::<HeaderName>("header", headers))
    }
}

fn parse_all<T: FromStr>(kind: &'static str, entries: &[String]) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| match entry.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(kind, entry = %entry, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig, origin: &str) -> Response {
        Router::new()
            .route("/navigation", get(|| async { "{}" }))
            .layer(create_cors_layer(config))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/navigation")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn allowed_origin(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_default_allows_any_origin() {
        let response = preflight(&CorsConfig::default(), "https://admin.example.com").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allowed_origin(&response), Some("*"));
    }

    #[tokio::test]
    async fn test_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://admin.example.com".to_string(),
                "not an origin\n".to_string(),
            ],
            ..CorsConfig::default()
        };

        let allowed = preflight(&config, "https://admin.example.com").await;
        assert_eq!(allowed_origin(&allowed), Some("https://admin.example.com"));

        let denied = preflight(&config, "https://elsewhere.example.com").await;
        assert_eq!(allowed_origin(&denied), None);
    }

    #[tokio::test]
    async fn test_disabled_cors_mirrors_origin() {
        let config = CorsConfig {
            enabled: false,
            ..CorsConfig::default()
        };
        let response = preflight(&config, "https://anywhere.example.com").await;
        assert_eq!(
            allowed_origin(&response),
            Some("https://anywhere.example.com")
        );
    }

    #[tokio::test]
    async fn test_request_id_is_exposed() {
        let response = Router::new()
            .route("/navigation", get(|| async { "{}" }))
            .layer(create_cors_layer(&CorsConfig::default()))
            .oneshot(
                Request::get("/navigation")
                    .header(header::ORIGIN, "https://admin.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS],
            REQUEST_ID_HEADER
        );
    }
}
