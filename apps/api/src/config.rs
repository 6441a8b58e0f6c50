use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup aborts if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted CRUD API, e.g. `https://crudapi.example.com/api/v1`.
    pub crud_api_url: String,
    pub crud_api_key: String,
    pub crud_api_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
    /// Where authenticated sessions are persisted. Sessions are memory-only when unset.
    pub session_file: Option<PathBuf>,
    /// Password for the reserved admin account created at startup.
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            crud_api_url: require_env("CRUD_API_URL")?,
            crud_api_key: require_env("CRUD_API_KEY")?,
            crud_api_timeout: Duration::from_secs(
                std::env::var("CRUD_API_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .context("CRUD_API_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_file: optional_env("SESSION_FILE").map(PathBuf::from),
            admin_password: optional_env("ADMIN_PASSWORD"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
