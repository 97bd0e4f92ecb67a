//! # Gateway Flows
//!
//! The demo runtime behind its HTTP and WebSocket surface.
//!
//! ```text
//! client ──► /login ──► token
//!        ──► /navigation, /resource/.., /page/.., /input_form/..
//!        ──► /ws/live_data?topic=t ──► {"value": ..} frames
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::HeaderValue;
    use tokio_tungstenite::tungstenite::Message;
    use tower::ServiceExt;

    use at_05_api_gateway::GatewayConfig;
    use at_runtime::demo::{PUBLIC_ITEMS, USERS};
    use at_runtime::AdminRuntime;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn runtime() -> AdminRuntime {
        AdminRuntime::new(GatewayConfig::default(), Duration::from_millis(10)).unwrap()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "admin.local");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "admin@admin.admin", "password": "admin@admin.admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn list_uri(resource: &str) -> String {
        format!("/resource/{}/list", resource.replace(' ', "%20"))
    }

    // =========================================================================
    // HTTP
    // =========================================================================

    #[tokio::test]
    async fn test_navigation_hides_hidden_resources() {
        let runtime = runtime();
        let app = runtime.gateway().router();
        let token = login(&app).await;

        let (status, nav) = call(&app, Method::GET, "/navigation", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(nav["name"], "Simple Admin Table example");

        let users = nav["navigation"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["name"] == "Users")
            .unwrap();
        assert_eq!(users["icon"], "user");
        let names: Vec<&str> = users["links"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|l| l["name"].as_str())
            .collect();
        assert_eq!(names, vec![USERS, PUBLIC_ITEMS]);
    }

    #[tokio::test]
    async fn test_list_detail_and_action_round_trip() {
        let runtime = runtime();
        let app = runtime.gateway().router();
        let token = login(&app).await;

        let (status, list) = call(&app, Method::GET, &list_uri(PUBLIC_ITEMS), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["pagination"]["total"], 6);

        let (status, _) = call(
            &app,
            Method::POST,
            "/resource/User/detail/1/action/create_item",
            Some(&token),
            Some(json!({"title": "Lamp", "description": "desk lamp", "public": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, list) = call(&app, Method::GET, &list_uri(PUBLIC_ITEMS), Some(&token), None).await;
        assert_eq!(list["pagination"]["total"], 7);

        let (status, detail) = call(&app, Method::GET, "/resource/User/detail/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["actions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failing_action_is_reported_inline() {
        let runtime = runtime();
        let app = runtime.gateway().router();
        let token = login(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/resource/User/detail/2/action/hello",
            Some(&token),
            Some(json!({"b1": true, "b2": false, "string1": "a", "string2": "b", "string3": "c"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failed"], true);
    }

    #[tokio::test]
    async fn test_public_and_private_pages() {
        let runtime = runtime();
        let app = runtime.gateway().router();

        let (status, page) = call(
            &app,
            Method::GET,
            "/page/Custom%20Markdown%20page/view",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["type"], "markdown");

        let (status, _) = call(&app, Method::GET, "/page/Custom%20HTML%20page/view", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, form) = call(
            &app,
            Method::POST,
            "/input_form/test_form",
            None,
            Some(json!({"field1": "hi", "integer_value": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(form["message"], "Success");
    }

    // =========================================================================
    // WEBSOCKET
    // =========================================================================

    struct Server {
        addr: std::net::SocketAddr,
        token: String,
        stop: Option<oneshot::Sender<()>>,
        handle: tokio::task::JoinHandle<()>,
    }

    async fn serve() -> Server {
        let runtime = Arc::new(runtime());
        let token = login(&runtime.gateway().router()).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            runtime
                .gateway()
                .serve(listener, async move {
                    stopped.await.ok();
                })
                .await
                .unwrap();
        });

        Server {
            addr,
            token,
            stop: Some(stop),
            handle,
        }
    }

    impl Server {
        async fn shutdown(mut self) {
            if let Some(stop) = self.stop.take() {
                stop.send(()).ok();
            }
            timeout(Duration::from_secs(5), self.handle)
                .await
                .expect("server did not stop")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_websocket_streams_live_values() {
        let server = serve().await;

        let url = format!("ws://{}/ws/live_data?topic=some/topic/user-1", server.addr);
        let mut request = url.into_client_request().unwrap();
        request.headers_mut().insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", server.token)).unwrap(),
        );
        let (mut socket, _) = connect_async(request).await.unwrap();

        for _ in 0..2 {
            let frame = timeout(Duration::from_secs(2), socket.next())
                .await
                .expect("no live value")
                .unwrap()
                .unwrap();
            let value: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
            let reading = value["value"].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&reading));
        }

        socket.send(Message::Close(None)).await.unwrap();
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_websocket_unknown_topic_closed_with_policy_code() {
        let server = serve().await;

        let url = format!("ws://{}/ws/live_data?topic=weather", server.addr);
        let mut request = url.into_client_request().unwrap();
        request.headers_mut().insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", server.token)).unwrap(),
        );
        let (mut socket, _) = connect_async(request).await.unwrap();

        let frame = timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("no close frame")
            .unwrap()
            .unwrap();
        match frame {
            Message::Close(Some(close)) => assert_eq!(u16::from(close.code), 1008),
            other => panic!("expected close frame, got {other:?}"),
        }

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_websocket_requires_token() {
        let server = serve().await;
        let url = format!("ws://{}/ws/live_data?topic=some/topic/user-1", server.addr);
        assert!(connect_async(url).await.is_err());
        server.shutdown().await;
    }
}
