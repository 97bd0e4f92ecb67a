//! Authentication: the provider port, a static in-memory provider and the
//! axum extractors that gate routes.
//!
//! Tokens are read from `Authorization: Bearer <token>`. Browsers cannot set
//! headers on WebSocket upgrades, so a socket may instead offer the
//! subprotocol `bearer<hex(authorization)>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dashmap::DashMap;
use shared_types::User;
use tracing::debug;
use uuid::Uuid;

use crate::domain::config::AuthConfig;
use crate::domain::error::ApiError;

/// Issues and checks session tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `None` for unknown users or a wrong password.
    async fn authenticate(&self, username: &str, password: &str) -> Option<User>;

    async fn generate_token(&self, user: &User) -> String;

    async fn validate_token(&self, token: &str) -> Option<User>;
}

/// Fixed set of credentials with random session tokens held in memory.
///
/// Tokens never expire and do not survive a restart.
pub struct StaticAuthProvider {
    users: HashMap<String, (String, User)>,
    tokens: DashMap<String, User>,
}

impl StaticAuthProvider {
    pub fn new(config: &AuthConfig) -> Self {
        let users = config
            .users
            .iter()
            .map(|c| {
                let mut user = User::new(&c.username);
                user.name = c.name.clone();
                (c.username.clone(), (c.password.clone(), user))
            })
            .collect();
        Self {
            users,
            tokens: DashMap::new(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let (expected, user) = self.users.get(username)?;
        (expected == password).then(|| user.clone())
    }

    async fn generate_token(&self, user: &User) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user.clone());
        token
    }

    async fn validate_token(&self, token: &str) -> Option<User> {
        self.tokens.get(token).map(|u| u.value().clone())
    }
}

/// Token carried by a request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some((_, token)) = websocket_bearer(headers) {
        return Some(token);
    }
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    strip_scheme(raw)
}

/// The `bearer<hex>` subprotocol offered on a WebSocket upgrade, with the
/// token it decodes to. The protocol is echoed back when the upgrade is
/// accepted.
pub fn websocket_bearer(headers: &HeaderMap) -> Option<(String, String)> {
    let offered = headers.get(SEC_WEBSOCKET_PROTOCOL)?.to_str().ok()?;
    offered.split(',').map(str::trim).find_map(|protocol| {
        let hexed = protocol.strip_prefix("bearer")?;
        let decoded = String::from_utf8(hex::decode(hexed).ok()?).ok()?;
        Some((protocol.to_string(), strip_scheme(&decoded)?))
    })
}

fn strip_scheme(raw: &str) -> Option<String> {
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn user_from_parts(parts: &Parts, auth: &dyn AuthProvider) -> Option<User> {
    let token = bearer_token(&parts.headers)?;
    let user = auth.validate_token(&token).await;
    if user.is_none() {
        debug!(path = %parts.uri.path(), "Rejected unknown token");
    }
    user
}

/// Authenticated user. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = <Arc<dyn AuthProvider> as FromRef<S>>::from_ref(state);
        user_from_parts(parts, auth.as_ref())
            .await
            .map(AuthUser)
            .ok_or_else(ApiError::unauthorized)
    }
}

/// User if the request carries a valid token. Used by routes that are public
/// for some targets (pages, input forms).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = <Arc<dyn AuthProvider> as FromRef<S>>::from_ref(state);
        Ok(MaybeUser(user_from_parts(parts, auth.as_ref()).await))
    }
}
