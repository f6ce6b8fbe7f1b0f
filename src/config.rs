/*
 * Responsibility
 * - Read settings from the environment (.env is honoured in development)
 * - Validate them up front so a bad deployment fails at startup, not on first request
 */
use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

/// Five days.
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 432_000;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // HS512 key shared by signing and verification
    pub jwt_secret: String,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_ttl_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("jwt_secret", &"<redacted>")
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let auth_issuer = lookup("AUTH_ISSUER").ok_or(ConfigError::Missing("AUTH_ISSUER"))?;
        let auth_audience =
            lookup("AUTH_AUDIENCE").ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let access_token_ttl_seconds = match lookup("ACCESS_TOKEN_TTL_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        };

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            auth_issuer,
            auth_audience,
            access_token_ttl_seconds,
        })
    }
}
