//! HTTP server settings, read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `API_HOST` | `0.0.0.0` |
//! | `API_PORT` | `3000` |
//! | `DATABASE_URL` | required |
//! | `LOG_LEVEL` | `info` |
//! | `API_CORS_ORIGINS` | unset, no CORS headers |
//! | `API_REQUEST_TIMEOUT_SECONDS` | `30` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use eyre::{Result, WrapErr};
use tracing::Level;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub log_level: Level,
    /// Allowed origins for browser clients. `None` adds no CORS layer.
    pub cors_origins: Option<Vec<String>>,
    /// Requests running longer than this are answered with 408.
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Fails when `DATABASE_URL` is missing or a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        let cors_origins = env::var("API_CORS_ORIGINS")
            .ok()
            .map(|origins| split_origins(&origins))
            .filter(|origins| !origins.is_empty());

        Ok(Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("API_PORT", 3000)?,
            database_url,
            log_level: env::var("LOG_LEVEL")
                .map(|value| parse_level(&value))
                .unwrap_or(Level::INFO),
            cors_origins,
            request_timeout: Duration::from_secs(parse_var(
                "API_REQUEST_TIMEOUT_SECONDS",
                DEFAULT_TIMEOUT_SECONDS,
            )?),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid value for {}: {}", name, value)),
        Err(_) => Ok(default),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Unknown levels fall back to `info`.
fn parse_level(value: &str) -> Level {
    Level::from_str(value.trim()).unwrap_or(Level::INFO)
}
