use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on judgment calls in flight across all requests.
    pub judgment_max_concurrency: usize,
    pub judgment_timeout: Duration,
    /// Documents scored concurrently within one batch.
    pub document_max_in_flight: usize,
    pub max_upload_bytes: usize,
    /// When set, every batch CSV is also persisted here.
    pub report_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            judgment_max_concurrency: env_or("JUDGMENT_MAX_CONCURRENCY", 4)?,
            judgment_timeout: Duration::from_secs(env_or("JUDGMENT_TIMEOUT_SECS", 30)?),
            document_max_in_flight: env_or("DOCUMENT_MAX_IN_FLIGHT", 4)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            report_dir: std::env::var("REPORT_DIR").ok().map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
