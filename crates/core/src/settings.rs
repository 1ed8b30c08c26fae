//! Environment-driven runtime settings.
//!
//! The adapter takes no command-line arguments; everything is configured
//! through `MCP_*` / `CDATA_*` environment variables.

use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(
        "no credentials configured: set CDATA_AUTH_TOKEN or CDATA_USERNAME and CDATA_PASSWORD"
    )]
    MissingAuth,
}

/// Which MCP transport the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout, for desktop MCP clients.
    Stdio,
    /// Streamable HTTP with an SSE event channel, for server deployments.
    Http,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown transport mode '{other}' (expected stdio or http)")),
        }
    }
}

/// Credentials for the Sync REST API.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// `Authorization: Bearer <token>`.
    Token(String),
    /// `Authorization: Basic <base64(user:password)>`.
    Basic { username: String, password: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub transport: TransportMode,
    pub base_url: Url,
    pub auth: AuthCredentials,
    pub default_workspace: Option<String>,
    pub request_timeout: Duration,
    pub http_host: String,
    pub http_port: u16,
    /// How long the HTTP transport waits for a client to answer a
    /// server-initiated request before expiring it.
    pub pending_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let transport = match read("MCP_TRANSPORT_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|reason| SettingsError::Invalid {
                    var: "MCP_TRANSPORT_MODE",
                    reason,
                })?,
            None => TransportMode::Stdio,
        };

        let base_url = read("CDATA_BASE_URL").ok_or(SettingsError::Missing("CDATA_BASE_URL"))?;
        let base_url = Url::parse(&base_url).map_err(|e| SettingsError::Invalid {
            var: "CDATA_BASE_URL",
            reason: e.to_string(),
        })?;

        // Token wins when both schemes are configured.
        let auth = match read("CDATA_AUTH_TOKEN") {
            Some(token) => AuthCredentials::Token(token),
            None => match (read("CDATA_USERNAME"), read("CDATA_PASSWORD")) {
                (Some(username), Some(password)) => AuthCredentials::Basic { username, password },
                _ => return Err(SettingsError::MissingAuth),
            },
        };

        let request_timeout = Duration::from_secs(parse_or(
            "CDATA_TIMEOUT_SECS",
            30,
        )?);
        let pending_timeout = Duration::from_secs(parse_or(
            "MCP_REQUEST_TIMEOUT_SECS",
            30,
        )?);

        let http_host = read("MCP_HTTP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let http_port = parse_or("MCP_HTTP_PORT", 8282)?;

        Ok(Self {
            transport,
            base_url,
            auth,
            default_workspace: read("CDATA_DEFAULT_WORKSPACE"),
            request_timeout,
            http_host,
            http_port,
            pending_timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn read(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn parse_or<T>(var: &'static str, default: T) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match read(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| SettingsError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
