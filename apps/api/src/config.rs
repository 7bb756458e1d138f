use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::normalize::FormatPolicy;

const DEFAULT_BASE_URL: &str = "https://api.langflow.astra.datastax.com";
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub langflow_base_url: String,
    pub langflow_id: String,
    pub langflow_endpoint: String,
    /// Bearer token for the workflow API. Never logged.
    pub langflow_token: String,
    pub file_node_id: String,
    pub chat_node_id: String,
    /// `None` disables the outbound timeout entirely.
    pub request_timeout: Option<Duration>,
    pub format_policy: FormatPolicy,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Config {
            langflow_base_url: std::env::var("LANGFLOW_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            langflow_id: require_env("LANGFLOW_ID")?,
            langflow_endpoint: require_env("LANGFLOW_ENDPOINT")?,
            langflow_token: require_env("LANGFLOW_TOKEN")?,
            file_node_id: require_env("LANGFLOW_FILE_NODE_ID")?,
            chat_node_id: require_env("LANGFLOW_CHAT_NODE_ID")?,
            request_timeout: timeout_from_secs(timeout_secs),
            format_policy: std::env::var("FORMAT_POLICY")
                .unwrap_or_else(|_| "pass_through".to_string())
                .parse()
                .context("FORMAT_POLICY must be one of pass_through, line_break, header_promotion")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Full run URL: `{base}/lf/{workflow_id}/api/v1/run/{endpoint}`.
    pub fn run_url(&self) -> String {
        format!(
            "{}/lf/{}/api/v1/run/{}",
            self.langflow_base_url.trim_end_matches('/'),
            self.langflow_id,
            self.langflow_endpoint
        )
    }
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("langflow_base_url", &self.langflow_base_url)
            .field("langflow_id", &self.langflow_id)
            .field("langflow_endpoint", &self.langflow_endpoint)
            .field("langflow_token", &"<redacted>")
            .field("file_node_id", &self.file_node_id)
            .field("chat_node_id", &self.chat_node_id)
            .field("request_timeout", &self.request_timeout)
            .field("format_policy", &self.format_policy)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
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
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Zero means "wait forever".
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
pub(crate) fn test_config(base_url: &str) -> Config {
    Config {
        langflow_base_url: base_url.to_string(),
        langflow_id: "flow-123".to_string(),
        langflow_endpoint: "candidate".to_string(),
        langflow_token: "test-token".to_string(),
        file_node_id: "File-abc12".to_string(),
        chat_node_id: "ChatInput-xyz34".to_string(),
        request_timeout: Some(Duration::from_secs(5)),
        format_policy: FormatPolicy::PassThrough,
        max_upload_bytes: 1024,
        port: 0,
        rust_log: "debug".to_string(),
    }
}
