//! Configuration management for the keyword alert backend
//!
//! Every setting, the signing secret included, is resolved once at startup
//! through a [`SecretProvider`] and handed to the services that need it.
//! Nothing reads the environment after [`Config::load`] returns.

use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::auth::password::{DEFAULT_BCRYPT_COST, MIN_BCRYPT_COST};

/// Default access token lifetime (1 hour)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Default refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 604_800;

/// Upper bound for either token lifetime (1 year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 31_536_000;

const DEVELOPMENT_JWT_SECRET: &str = "development-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Source of configuration values and secrets
///
/// Implementations may be synchronous (process environment) or backed by a
/// remote secret store; callers only ever see this one async shape.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Look up a value, `None` when it is not set
    async fn get_optional(&self, name: &str) -> Result<Option<String>, ConfigError>;

    /// Look up a value that must be set
    async fn get(&self, name: &str) -> Result<String, ConfigError> {
        self.get_optional(name)
            .await?
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    }
}

/// Reads the process environment, after loading `.env` if present
#[derive(Debug, Clone, Copy)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        EnvSecretProvider
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_optional(&self, name: &str) -> Result<Option<String>, ConfigError> {
        match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue(format!(
                "{} is not valid unicode",
                name
            ))),
        }
    }
}

/// Fixed set of values, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticSecretProvider {
    values: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_optional(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(name).cloned())
    }
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// How refresh artifacts are issued and redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshStrategy {
    /// Random opaque value, digest persisted per user, rotated on use
    #[default]
    Stateful,
    /// Signed token with `type=refresh`; nothing persisted, logout is a no-op
    Stateless,
}

impl RefreshStrategy {
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "stateful" | "opaque" => Ok(RefreshStrategy::Stateful),
            "stateless" | "jwt" => Ok(RefreshStrategy::Stateless),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid refresh strategy: '{}'. Expected: stateful or stateless",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStrategy::Stateful => "stateful",
            RefreshStrategy::Stateless => "stateless",
        }
    }
}

/// HMAC signing secret; never printed
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(****)")
    }
}

/// Settings consumed by the authentication service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for token signing
    pub jwt_secret: JwtSecret,

    /// Access token TTL in seconds (default: 3600)
    pub access_token_ttl_seconds: i64,

    /// Refresh token / cookie TTL in seconds (default: 604800)
    pub refresh_token_ttl_seconds: i64,

    /// Active refresh strategy
    pub refresh_strategy: RefreshStrategy,

    /// bcrypt cost for new password hashes
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Defaults around the given secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: JwtSecret::new(jwt_secret),
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            refresh_strategy: RefreshStrategy::default(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    pub fn with_refresh_strategy(mut self, strategy: RefreshStrategy) -> Self {
        self.refresh_strategy = strategy;
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_access_token_ttl(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Database connection URL; the in-memory store is used when absent
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Whether the refresh cookie carries the `Secure` attribute
    pub cookie_secure: bool,

    /// Authentication settings
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from the process environment
    pub async fn from_env() -> Result<Self, ConfigError> {
        Self::load(&EnvSecretProvider::new()).await
    }

    /// Resolve every setting through `provider`
    pub async fn load(provider: &dyn SecretProvider) -> Result<Self, ConfigError> {
        let environment = match provider.get_optional("ENVIRONMENT").await? {
            Some(s) => Environment::from_str(&s)?,
            None => Environment::Development,
        };

        let port = provider
            .get_optional("PORT")
            .await?
            .unwrap_or_else(|| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let database_url = provider.get_optional("DATABASE_URL").await?;
        if database_url.is_none() && environment.is_production() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let db_max_connections = parse_or(provider, "DB_MAX_CONNECTIONS", 5u32).await?;

        let log_level = provider
            .get_optional("RUST_LOG")
            .await?
            .unwrap_or_else(|| "info".to_string());

        let cookie_secure = parse_or(provider, "COOKIE_SECURE", true).await?;

        // JWT and Auth configuration
        let jwt_secret = match provider.get_optional("JWT_SECRET").await? {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "JWT_SECRET must not be empty".to_string(),
                ))
            }
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let access_token_ttl_seconds = parse_or(
            provider,
            "JWT_ACCESS_TOKEN_TTL_SECONDS",
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        )
        .await?;

        let refresh_token_ttl_seconds = parse_or(
            provider,
            "JWT_REFRESH_TOKEN_TTL_SECONDS",
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        )
        .await?;

        let ttl_range = 1..=MAX_TOKEN_TTL_SECONDS;
        if !ttl_range.contains(&access_token_ttl_seconds)
            || !ttl_range.contains(&refresh_token_ttl_seconds)
        {
            return Err(ConfigError::InvalidValue(format!(
                "token TTLs must be between 1 and {} seconds",
                MAX_TOKEN_TTL_SECONDS
            )));
        }

        let refresh_strategy = match provider.get_optional("REFRESH_STRATEGY").await? {
            Some(s) => RefreshStrategy::from_str(&s)?,
            None => RefreshStrategy::default(),
        };

        let bcrypt_cost = parse_or(provider, "BCRYPT_COST", DEFAULT_BCRYPT_COST).await?;
        if !(MIN_BCRYPT_COST..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "BCRYPT_COST must be between {} and 31",
                MIN_BCRYPT_COST
            )));
        }

        Ok(Config {
            environment,
            port,
            database_url,
            db_max_connections,
            log_level,
            cookie_secure,
            auth: AuthConfig {
                jwt_secret: JwtSecret::new(jwt_secret),
                access_token_ttl_seconds,
                refresh_token_ttl_seconds,
                refresh_strategy,
                bcrypt_cost,
            },
        })
    }

    /// Get database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> Option<String> {
        let url = self.database_url.as_deref()?;
        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return Some(format!("{}****{}", prefix, suffix));
            }
        }
        Some(url.to_string())
    }
}

async fn parse_or<T: FromStr>(
    provider: &dyn SecretProvider,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match provider.get_optional(name).await? {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{}='{}'", name, raw))),
        None => Ok(default),
    }
}
