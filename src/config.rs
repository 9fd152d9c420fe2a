//! Runtime configuration read from the environment (and `.env`).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::fetch::auth::Session;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_LOG_FILE: &str = "logs/diploma_stats.log";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the diploma catalog service.
    pub api_url: String,
    /// Present when `DIPLOMA_API_TOKEN` is set.
    pub session: Option<Session>,
    pub http_timeout: Duration,
    pub log_file: String,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("DIPLOMA_API_URL").unwrap_or_else(|| {
            debug!(default = DEFAULT_API_URL, "DIPLOMA_API_URL not set, using default");
            DEFAULT_API_URL.to_string()
        });

        let session = lookup("DIPLOMA_API_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Session::new);

        let http_timeout = match lookup("DIPLOMA_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid DIPLOMA_HTTP_TIMEOUT_SECS value '{raw}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let log_file = lookup("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        Ok(Self {
            api_url,
            session,
            http_timeout: Duration::from_secs(http_timeout),
            log_file,
        })
    }

    /// Logs the effective configuration without secrets.
    pub fn log_summary(&self) {
        info!(
            api_url = %self.api_url,
            authenticated = self.session.is_some(),
            timeout_secs = self.http_timeout.as_secs(),
            "Configuration loaded"
        );
    }
}
