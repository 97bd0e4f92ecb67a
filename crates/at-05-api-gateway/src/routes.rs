//! Route table and handlers.
//!
//! Handlers are thin: extract, call the pipeline, map the error. All
//! response bodies are JSON.

use std::sync::Arc;

use at_03_view_pipeline::{
    ActionResponse, CreateSchemaResponse, DashboardResponse, DetailResponse, FormResponse,
    GraphData, GraphRange, ListQuery, ListResponse, NavigationResponse, PageResponse,
    UserResponse, ViewPipeline,
};
use at_04_live_data::LiveDataHub;
use axum::body::Bytes;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{FromRef, OriginalUri, Path, Query, RawQuery, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::auth::{websocket_bearer, AuthProvider, AuthUser, MaybeUser};
use crate::domain::error::ApiError;
use crate::middleware::{GatewayMetrics, MetricsSnapshot};
use crate::ws::serve_socket;

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pipeline: Arc<ViewPipeline>,
    pub hub: Arc<LiveDataHub>,
    pub auth: Arc<dyn AuthProvider>,
    pub metrics: Arc<GatewayMetrics>,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Every route, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", post(ping))
        .route("/login", post(login))
        .route("/user", get(current_user))
        .route("/navigation", get(navigation))
        .route("/dashboard", get(dashboard))
        .route("/resource/:resource/list", get(list))
        .route("/resource/:resource/create", get(create_schema).post(create))
        .route("/resource/:resource/detail/:id", get(detail))
        .route("/resource/:resource/detail/:id/action/:action", post(action))
        .route("/resource/:resource/detail/:id/graph/:graph", get(graph))
        .route("/page/:name/view", get(page))
        .route(
            "/input_form/:location",
            get(input_form).post(submit_input_form),
        )
        .route("/ws/live_data", get(live_data))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Parse a JSON body. An empty body reads as `{}`.
fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}

async fn ping(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        message: Some("pong".to_string()),
        user: Some(user),
    })
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request: LoginRequest = serde_json::from_value(json_body(&body)?)
        .map_err(|e| ApiError::bad_request(format!("Invalid login request: {e}")))?;

    match state.auth.authenticate(&request.username, &request.password).await {
        Some(user) => {
            let token = state.auth.generate_token(&user).await;
            info!(user = %user.email, "Login successful");
            Ok(Json(json!({ "message": "login successful", "token": token })))
        }
        None => {
            warn!(user = %request.username, "Login failed");
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "login failed"))
        }
    }
}

async fn current_user(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        message: None,
        user: Some(user),
    })
}

async fn navigation(
    State(state): State<AppState>,
    _user: AuthUser,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Json<NavigationResponse> {
    Json(state.pipeline.navigation(&href_base(&uri, &headers)))
}

/// `scheme://host[:port]/mount` of the API as the client addressed it.
///
/// Scheme and host come from an absolute request URI, then the
/// `X-Forwarded-*` headers, then `Host`. The mount is the request path
/// without its trailing `/navigation`, so nested routers keep their prefix.
fn href_base(uri: &Uri, headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let scheme = uri
        .scheme_str()
        .or_else(|| header("x-forwarded-proto"))
        .unwrap_or("http");
    let host = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| header("x-forwarded-host"))
        .or_else(|| header(HOST.as_str()));
    let mount = uri
        .path()
        .strip_suffix("/navigation")
        .unwrap_or_default()
        .trim_end_matches('/');

    match host {
        Some(host) => format!("{scheme}://{host}{mount}"),
        None => mount.to_string(),
    }
}

async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<DashboardResponse> {
    Ok(Json(state.pipeline.dashboard(&user)?))
}

async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(resource): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<ListResponse> {
    let query = ListQuery::from_query(query.as_deref().unwrap_or_default())?;
    Ok(Json(state.pipeline.handle_list(&resource, query).await?))
}

async fn create_schema(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(resource): Path<String>,
) -> ApiResult<CreateSchemaResponse> {
    Ok(Json(state.pipeline.create_schema(&resource)?))
}

async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(resource): Path<String>,
    body: Bytes,
) -> ApiResult<ActionResponse> {
    let body = json_body(&body)?;
    Ok(Json(state.pipeline.handle_create(&resource, &body).await?))
}

async fn detail(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<DetailResponse> {
    Ok(Json(state.pipeline.handle_detail(&resource, &id).await?))
}

async fn action(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((resource, id, action)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<ActionResponse> {
    let params = match json_body(&body)? {
        Value::Object(params) => params,
        _ => return Err(ApiError::bad_request("Action parameters must be an object")),
    };
    Ok(Json(
        state
            .pipeline
            .handle_action(&resource, &id, &action, &params)
            .await?,
    ))
}

async fn graph(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((resource, id, graph)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
) -> ApiResult<GraphData> {
    let range = GraphRange::from_query(query.as_deref().unwrap_or_default())?;
    Ok(Json(
        state
            .pipeline
            .handle_graph(&resource, &id, &graph, range)
            .await?,
    ))
}

async fn page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(name): Path<String>,
) -> ApiResult<PageResponse> {
    Ok(Json(state.pipeline.page_view(&name, user.as_ref())?))
}

async fn input_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(location): Path<String>,
) -> ApiResult<FormResponse> {
    Ok(Json(state.pipeline.input_form(&location, user.as_ref())?))
}

async fn submit_input_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(location): Path<String>,
    body: Bytes,
) -> ApiResult<ActionResponse> {
    let body = json_body(&body)?;
    Ok(Json(
        state
            .pipeline
            .submit_input_form(&location, user.as_ref(), &body)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct LiveDataQuery {
    topic: String,
}

async fn live_data(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LiveDataQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let ws = match websocket_bearer(&headers) {
        Some((protocol, _)) => ws.protocols([protocol]),
        None => ws,
    };
    let hub = Arc::clone(&state.hub);
    let metrics = Arc::clone(&state.metrics);
    ws.on_upgrade(move |socket| serve_socket(socket, query.topic, hub, metrics))
        .into_response()
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "live": {
            "topics": state.hub.topic_count(),
            "subscribers": state.hub.total_subscribers(),
        }
    }))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
