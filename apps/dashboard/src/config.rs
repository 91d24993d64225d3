use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::layout::{PaperSize, Viewport};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub credentials_path: PathBuf,
    pub request_timeout: Duration,
    /// Upper bound on a token refresh call before queued requests are failed.
    pub refresh_timeout: Duration,
    pub paper: PaperSize,
    pub viewport: Viewport,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = require_env("API_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            api_base_url,
            credentials_path: std::env::var("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".dashboard/credentials.json")),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 30)?),
            refresh_timeout: Duration::from_secs(parse_env("REFRESH_TIMEOUT_SECS", 10)?),
            paper: parse_paper(&std::env::var("PAPER_SIZE").unwrap_or_else(|_| "a4".to_string()))?,
            viewport: Viewport::new(
                parse_env("VIEWPORT_WIDTH", 900.0)?,
                parse_env("VIEWPORT_HEIGHT", 1000.0)?,
            ),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

pub fn parse_paper(value: &str) -> Result<PaperSize> {
    match value.trim().to_ascii_lowercase().as_str() {
        "a4" => Ok(PaperSize::A4),
        "letter" | "us-letter" => Ok(PaperSize::Letter),
        other => bail!("Unknown paper size '{other}' (expected 'a4' or 'letter')"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
