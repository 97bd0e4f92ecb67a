use std::sync::Arc;

use at_02_resolver::{ColumnSchema, InMemoryResolver, Resolver};
use at_03_view_pipeline::{
    ActionSpec, AdminConfig, CallbackReturn, CreateView, DetailView, FormCallback, FormSchema,
    InputForm, ListView, Page, ParamSpec, Resource, ViewPipeline,
};
use at_04_live_data::{FnProducerFactory, LiveDataHub, LiveError};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use shared_types::Row;
use tower::ServiceExt;

use crate::domain::config::GatewayConfig;
use crate::service::ApiGatewayService;

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn users() -> Arc<InMemoryResolver> {
    let resolver = InMemoryResolver::new(
        vec![
            ColumnSchema::integer("id", "ID"),
            ColumnSchema::text("name", "Name"),
        ],
        "id",
    )
    .unwrap()
    .with_rows([
        row(json!({"id": 1, "name": "Alice"})),
        row(json!({"id": 2, "name": "Bob"})),
        row(json!({"id": 3, "name": "Carla"})),
    ]);
    Arc::new(resolver)
}

fn pipeline() -> ViewPipeline {
    let store = users();
    let create_store = Arc::clone(&store);
    let config = AdminConfig::new("Gateway Test")
        .resource(
            Resource::new("Users", Arc::clone(&store) as Arc<dyn Resolver>)
                .with_list(ListView::new(vec!["name".into()]))
                .with_detail(
                    DetailView::new(vec!["name".into()]).with_action(
                        ActionSpec::new("rename", |entry: Row, params| {
                            async move {
                                Ok(CallbackReturn::refresh().with_message(format!(
                                    "{} -> {}",
                                    entry["name"].as_str().unwrap_or(""),
                                    params["name"].as_str().unwrap_or("")
                                )))
                            }
                            .boxed()
                        })
                        .with_param(ParamSpec::str("name")),
                    ),
                )
                .with_create(CreateView::new(
                    FormSchema::new("New User").field(ParamSpec::str("name")),
                    FormCallback::new(move |data: Map<String, Value>| {
                        let store = Arc::clone(&create_store);
                        async move {
                            let id = store.insert(data)?;
                            Ok(CallbackReturn::Value(json!({ "id": id })))
                        }
                        .boxed()
                    }),
                )),
        )
        .page(Page::new("help", "# Help").public())
        .page(Page::new("internal", "secret"))
        .input_form(
            InputForm::new(
                "feedback",
                "Feedback",
                FormSchema::default().field(ParamSpec::str("text")),
                FormCallback::new(|_| async { Ok(CallbackReturn::from("Thanks")) }.boxed()),
            )
            .public(),
        );
    ViewPipeline::new(config).unwrap()
}

fn hub() -> Arc<LiveDataHub> {
    Arc::new(LiveDataHub::new(Arc::new(FnProducerFactory::new(
        |topic: &str| Err(LiveError::UnknownTopic(topic.to_string())),
    ))))
}

fn service_with(config: GatewayConfig) -> ApiGatewayService {
    ApiGatewayService::new(config, Arc::new(pipeline()), hub()).unwrap()
}

fn app() -> Router {
    service_with(GatewayConfig::default()).router()
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    login_at(app, "/login").await
}

async fn login_at(app: &Router, uri: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        uri,
        None,
        Some(json!({"username": "admin@admin.admin", "password": "admin@admin.admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "login successful");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (status, body) = call(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["live"]["topics"], 0);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = app();
    for (method, uri) in [
        (Method::GET, "/user"),
        (Method::POST, "/ping"),
        (Method::GET, "/navigation"),
        (Method::GET, "/resource/Users/list"),
        (Method::GET, "/resource/Users/detail/1"),
        (Method::GET, "/ws/live_data?topic=cpu"),
    ] {
        let (status, body) = call(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body, json!({"message": "Unauthorized"}));
    }

    let (status, _) = call(&app, Method::GET, "/user", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_session() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({"username": "admin@admin.admin", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "login failed");

    let token = login(&app).await;
    let (status, body) = call(&app, Method::GET, "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "admin@admin.admin");
    assert!(body.get("message").is_none());

    let (_, body) = call(&app, Method::POST, "/ping", Some(&token), None).await;
    assert_eq!(body["message"], "pong");
}

#[tokio::test]
async fn test_list_route() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/resource/Users/list?page=2&per_page=2&sort=name;asc",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({"page": 2, "per_page": 2, "total": 3}));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::GET,
        "/resource/Users/list?page=0",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid page: 0");

    let (status, body) = call(&app, Method::GET, "/resource/Nope/list", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Unknown resource: Nope");
}

#[tokio::test]
async fn test_detail_and_action_routes() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = call(&app, Method::GET, "/resource/Users/detail/2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actions"][0]["ref"], "rename");

    let (status, body) = call(&app, Method::GET, "/resource/Users/detail/9", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found: 9");

    let (status, body) = call(
        &app,
        Method::POST,
        "/resource/Users/detail/2/action/rename",
        Some(&token),
        Some(json!({"name": "Robert"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Bob -> Robert", "refresh": true}));

    // validation failures are shown inline
    let (status, body) = call(
        &app,
        Method::POST,
        "/resource/Users/detail/2/action/rename",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed"], true);

    let (status, _) = call(
        &app,
        Method::POST,
        "/resource/Users/detail/2/action/rename",
        Some(&token),
        Some(json!([1, 2])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_route_redirects_to_new_entry() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = call(&app, Method::GET, "/resource/Users/create", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schema"]["title"], "New User");

    let (status, body) = call(
        &app,
        Method::POST,
        "/resource/Users/create",
        Some(&token),
        Some(json!({"name": "Dana"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["redirect"],
        json!({"type": "detail", "resource": "Users", "id": "4"})
    );

    let (status, body) = call(
        &app,
        Method::POST,
        "/resource/Users/create",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed"], true);
}

#[tokio::test]
async fn test_public_and_private_targets() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/page/help/view", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "# Help");

    let (status, _) = call(&app, Method::GET, "/page/internal/view", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, _) = call(&app, Method::GET, "/page/internal/view", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/input_form/feedback",
        None,
        Some(json!({"text": "great"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Thanks"}));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let app = app();
    let request = Request::post("/input_form/feedback")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = GatewayConfig::default();
    config.limits.max_request_size = 16;
    let app = service_with(config).router();

    let (status, _) = call(
        &app,
        Method::POST,
        "/input_form/feedback",
        None,
        Some(json!({"text": "far too long for the configured limit"})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let service = service_with(GatewayConfig::default());
    let app = service.router();

    call(&app, Method::GET, "/health", None, None).await;
    call(&app, Method::GET, "/user", None, None).await;

    let (status, body) = call(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    // the metrics request itself is counted after the snapshot
    assert_eq!(body["http"]["handled"], 2);
    assert_eq!(body["http"]["client_errors"], 1);
    assert_eq!(service.metrics().snapshot().http.handled, 3);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = GatewayConfig::default();
    config.limits.default_per_page = 0;
    assert!(ApiGatewayService::new(config, Arc::new(pipeline()), hub()).is_err());
}

#[tokio::test]
async fn test_serve_until_shutdown() {
    let service = service_with(GatewayConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    service.serve(listener, async {}).await.unwrap();
}

#[tokio::test]
async fn test_navigation_hrefs_keep_mount_prefix() {
    let app = Router::new().nest("/admin", app());
    let token = login_at(&app, "/admin/login").await;

    let request = Request::get("/admin/navigation")
        .header(header::HOST, "tables.example.com")
        .header("x-forwarded-proto", "https")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let nav: Value = serde_json::from_slice(&bytes).unwrap();

    let hrefs: Vec<&Value> = nav["navigation"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|drawer| drawer["links"].as_array().unwrap())
        .map(|link| &link["href"])
        .collect();
    assert!(hrefs.contains(&&json!({"list": "https://tables.example.com/admin/resource/Users/list"})));
    assert!(hrefs.contains(&&json!({"view": "https://tables.example.com/admin/page/help/view"})));
}

