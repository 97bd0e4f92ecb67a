//! Gateway configuration.
//!
//! Loaded from TOML by the runtime; every section falls back to its
//! defaults, so a file only needs the keys it changes. Each section checks
//! itself and [`GatewayConfig::validate`] runs them in order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
    /// Logins accepted by the built-in auth provider
    pub auth: AuthConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        self.cors.validate()?;
        self.auth.validate()
    }

    /// Socket address the server binds.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.request_timeout)
    }
}

/// Listener settings. `enabled = false` builds everything but never binds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            enabled: true,
        }
    }
}

/// Cross-origin rules for the admin frontend. `"*"` in `allowed_origins`
/// or `allowed_headers` matches anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age: u64,
    pub allow_credentials: bool,
}

impl CorsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let wildcard = |list: &[String]| list.iter().any(|entry| entry == "*");
        // tower-http refuses credentials with a wildcard
        if self.enabled
            && self.allow_credentials
            && (wildcard(&self.allowed_origins) || wildcard(&self.allowed_headers))
        {
            return Err(ConfigError::InvalidCors(
                "allow_credentials cannot be combined with '*'".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            enabled: true,
            allowed_origins: strings(&["*"]),
            allowed_methods: strings(&["GET", "POST", "OPTIONS"]),
            allowed_headers: strings(&["Content-Type", "Authorization"]),
            max_age: 24 * 60 * 60,
            allow_credentials: false,
        }
    }
}

/// Body, time and page-size bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted request body, in bytes
    pub max_request_size: usize,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Page size when a list request has none
    pub default_per_page: u64,
    /// Largest page size a list request may ask for
    pub max_per_page: u64,
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size must be positive".into(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout must be positive".into(),
            ));
        }
        if self.default_per_page == 0 || self.max_per_page == 0 {
            return Err(ConfigError::InvalidLimit("page sizes must be positive".into()));
        }
        if self.default_per_page > self.max_per_page {
            return Err(ConfigError::InvalidLimit(format!(
                "default_per_page {} exceeds max_per_page {}",
                self.default_per_page, self.max_per_page
            )));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 1 << 20,
            request_timeout: 30,
            default_per_page: 50,
            max_per_page: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub users: Vec<UserCredentials>,
}

impl AuthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::NoUsers);
        }
        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::Invalid("empty username".into()));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::DuplicateUser(user.username.clone()));
            }
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: vec![UserCredentials {
                username: "admin@admin.admin".to_string(),
                password: "admin@admin.admin".to_string(),
                name: Some("Admin".to_string()),
            }],
        }
    }
}

/// One login. The username doubles as the user's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid cors: {0}")]
    InvalidCors(String),
    #[error("no users configured")]
    NoUsers,
    #[error("duplicate user: {0}")]
    DuplicateUser(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
