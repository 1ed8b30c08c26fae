//! Error types for the Sync client.
//!
//! The taxonomy follows HTTP status translation: auth failures, missing
//! resources, and connectivity problems each get their own variant with
//! operator-facing remediation text that the MCP layer appends to tool
//! errors.

use serde::Deserialize;

/// Result type for client operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error types that can occur when talking to the Sync server.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// HTTP request failed below the status-code level.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// API returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    /// Credentials were rejected (401/403).
    #[error("authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    /// Resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The Sync server could not be reached at all.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The server answered with a shape the client cannot use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// OData error body: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    error: ODataErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ODataErrorDetail {
    Structured {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },
    Plain(String),
}

impl SyncError {
    /// Classify a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ODataErrorBody>(body) {
            Ok(parsed) => match parsed.error {
                ODataErrorDetail::Structured { code, message } => match code {
                    Some(code) => format!("{code}: {message}"),
                    None => message,
                },
                ODataErrorDetail::Plain(message) => message,
            },
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => format!("HTTP {status}"),
        };

        match status {
            401 | 403 => Self::Authentication { status, message },
            404 => Self::NotFound(message),
            _ => Self::Api {
                status,
                message,
                detail: None,
            },
        }
    }

    /// Classify a transport-level reqwest failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::Connection(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Operator-facing guidance for the most common failure classes.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { .. } => Some(
                "The Sync server rejected the credentials. Check CDATA_AUTH_TOKEN, or \
                 CDATA_USERNAME/CDATA_PASSWORD, and confirm the user has API access.",
            ),
            Self::NotFound(_) => Some(
                "The resource does not exist on the Sync server. List the collection \
                 first to see the available names.",
            ),
            Self::Connection(_) => Some(
                "Could not reach the Sync server. Verify it is running and that \
                 CDATA_BASE_URL points at its API root (e.g. http://host:8181/api.rsc).",
            ),
            Self::Timeout => Some(
                "The request timed out. The Sync server may be busy; raise \
                 CDATA_TIMEOUT_SECS if this persists.",
            ),
            _ => None,
        }
    }
}
