use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::duration;

/// Category of a failed query.
///
/// Callers inspect this instead of matching on concrete error types.
///
/// # Retryable kinds
///
/// - [`RateLimit`](Self::RateLimit) - the service asked us to slow down
/// - [`Network`](Self::Network) - connect / TLS failure
/// - [`Timeout`](Self::Timeout) - request exceeded the configured timeout
/// - [`ApiError`](Self::ApiError) - only when the server error is transient (5xx)
///
/// [`Validation`](Self::Validation) and [`Malformed`](Self::Malformed) are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The target was rejected locally before any request was sent.
    Validation,
    /// The remote service rate-limited the request.
    RateLimit,
    /// Connection or TLS failure.
    Network,
    /// The request timed out.
    Timeout,
    /// The remote service reported an application-level error.
    ApiError,
    /// The response did not have the expected shape.
    Malformed,
    /// Not attempted because an earlier failure (or cancellation) stopped the batch.
    Skipped,
    /// Abandoned by the caller while waiting on the network or a retry delay.
    Cancelled,
}

impl ErrorKind {
    /// Stable lowercase name, used in logs and console output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::ApiError => "api_error",
            Self::Malformed => "malformed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure attached to a [`QueryResult`](crate::QueryResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Wait suggested by the server (rate limits only).
    #[serde(
        rename = "retry_after_ms",
        with = "duration::option_millis",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub retry_after: Option<Duration>,
    /// HTTP status of the last response, when there was one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_code: Option<u16>,
    /// `true` when the error was still retryable but the retry budget ran out.
    #[serde(default)]
    pub exhausted: bool,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            status_code: None,
            exhausted: false,
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub fn exhausted(mut self) -> Self {
        self.exhausted = true;
        self
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.kind, self.exhausted) {
            (ErrorKind::RateLimit, true) => {
                write!(f, "Rate limit exhausted: {}", self.message)
            }
            (_, true) => write!(f, "{} (retries exhausted): {}", self.kind, self.message),
            (ErrorKind::RateLimit, false) => match self.retry_after {
                Some(after) => write!(
                    f,
                    "Rate limited (retry after {}s): {}",
                    after.as_secs(),
                    self.message
                ),
                None => write!(f, "Rate limited: {}", self.message),
            },
            (kind, false) => match self.status_code {
                Some(code) => write!(f, "{kind} (HTTP {code}): {}", self.message),
                None => write!(f, "{kind}: {}", self.message),
            },
        }
    }
}

/// A target rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Validation error ({field}): {reason}")]
pub struct ValidationError {
    /// Which part of the input failed (`target`, `domain`, `ip`, `port`, `url`, ...).
    pub field: String,
    /// Why it failed.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Transport-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Timeout,
    ConnectionFailed,
    Tls,
}

impl TransportErrorKind {
    fn label(self) -> &'static str {
        match self {
            Self::Timeout => "Request timed out",
            Self::ConnectionFailed => "Connection failed",
            Self::Tls => "TLS error",
        }
    }
}

/// A request that never produced an HTTP response.
///
/// Every kind is a retry candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {detail}", .kind.label())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub detail: String,
}

impl TransportError {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            detail: detail.into(),
        }
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::ConnectionFailed,
            detail: detail.into(),
        }
    }

    pub fn tls(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Tls,
            detail: detail.into(),
        }
    }

    /// [`ErrorKind`] reported to callers for this failure.
    pub fn error_kind(&self) -> ErrorKind {
        match self.kind {
            TransportErrorKind::Timeout => ErrorKind::Timeout,
            TransportErrorKind::ConnectionFailed | TransportErrorKind::Tls => ErrorKind::Network,
        }
    }
}

/// Configuration-level and programmer errors.
///
/// These are returned from the call itself; per-target failures never are.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unknown tool '{0}': expected an id between 1 and 14 or a tool name")]
    UnknownTool(String),

    #[error("Batch target list is empty")]
    EmptyBatch,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;
