//! Response classification.
//!
//! HackerTarget frequently answers HTTP 200 with an error sentence as the body
//! (`API count exceeded - Increase Quota with Membership`, `error check your
//! search parameter`), so the status code alone under-reports failures. The
//! classifier looks at status, headers and the first line of the body.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};

use crate::error::{ErrorInfo, ErrorKind, TransportError, ValidationError};
use crate::http_client::RawResponse;

/// Reported wait for a rate limit when the server did not send `Retry-After`.
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// What a body marker means when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// The service is throttling or the quota is spent.
    RateLimit,
    /// The service rejected the target.
    InvalidInput,
    /// Any other application error reported in-band.
    ApiError,
}

/// A case-insensitive text fragment that identifies an in-band error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyMarker {
    needle: String,
    kind: MarkerKind,
    anchored: bool,
}

impl BodyMarker {
    /// Matches anywhere in the first line.
    pub fn new(needle: &str, kind: MarkerKind) -> Self {
        Self {
            needle: needle.to_lowercase(),
            kind,
            anchored: false,
        }
    }

    /// Matches only at the start of the first line.
    pub fn prefix(needle: &str, kind: MarkerKind) -> Self {
        Self {
            anchored: true,
            ..Self::new(needle, kind)
        }
    }

    pub fn is_prefix(&self) -> bool {
        self.anchored
    }

    fn matches(&self, lower_line: &str) -> bool {
        if self.anchored {
            lower_line.starts_with(&self.needle)
        } else {
            lower_line.contains(&self.needle)
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success(String),
    RateLimited {
        /// Parsed `Retry-After`, if the server sent one.
        retry_after: Option<Duration>,
        message: String,
        status: u16,
    },
    InvalidTarget {
        message: String,
        status: u16,
    },
    ApiError {
        message: String,
        status: Option<u16>,
        transient: bool,
    },
    Malformed {
        message: String,
        status: u16,
    },
    Transport(TransportError),
    Validation(ValidationError),
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Caller-facing error for a failed attempt; `None` for success.
    pub fn error_info(&self) -> Option<ErrorInfo> {
        let info = match self {
            Self::Success(_) => return None,
            Self::RateLimited {
                retry_after,
                message,
                status,
            } => ErrorInfo::new(ErrorKind::RateLimit, message.clone())
                .with_retry_after(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT))
                .with_status(Some(*status)),
            Self::InvalidTarget { message, status } => {
                ErrorInfo::new(ErrorKind::ApiError, message.clone()).with_status(Some(*status))
            }
            Self::ApiError {
                message, status, ..
            } => ErrorInfo::new(ErrorKind::ApiError, message.clone()).with_status(*status),
            Self::Malformed { message, status } => {
                ErrorInfo::new(ErrorKind::Malformed, message.clone()).with_status(Some(*status))
            }
            Self::Transport(e) => ErrorInfo::new(e.error_kind(), e.to_string()),
            Self::Validation(e) => ErrorInfo::new(ErrorKind::Validation, e.to_string()),
        };
        Some(info)
    }

    /// [`ErrorKind`] of a failed attempt.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_info().map(|info| info.kind)
    }
}

impl From<TransportError> for Classification {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ValidationError> for Classification {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Turns a [`RawResponse`] into a [`Classification`].
///
/// The marker list is open: the defaults cover the messages HackerTarget is
/// known to send, and [`with_marker`](Self::with_marker) adds more.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    markers: Vec<BodyMarker>,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self {
            markers: vec![
                BodyMarker::new("api count exceeded", MarkerKind::RateLimit),
                BodyMarker::new("please slow down", MarkerKind::RateLimit),
                BodyMarker::new("error check your search parameter", MarkerKind::InvalidInput),
                // Generic word; data lines such as `https://host/invalid-login` must pass.
                BodyMarker::prefix("invalid", MarkerKind::InvalidInput),
            ],
        }
    }
}

impl ResponseClassifier {
    /// A classifier with no body markers (status and shape checks only).
    pub fn empty() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_marker(mut self, needle: &str, kind: MarkerKind) -> Self {
        self.markers.push(BodyMarker::new(needle, kind));
        self
    }

    /// Add a prebuilt marker, e.g. one from [`BodyMarker::prefix`].
    #[must_use]
    pub fn with_body_marker(mut self, marker: BodyMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn markers(&self) -> &[BodyMarker] {
        &self.markers
    }

    pub fn classify(&self, raw: &RawResponse) -> Classification {
        let status = raw.status_code;

        if status == 429 {
            let body = String::from_utf8_lossy(&raw.body);
            let line = first_line(&body);
            let message = if line.is_empty() {
                "HTTP 429 Too Many Requests".to_string()
            } else {
                format!("HTTP 429: {line}")
            };
            return Classification::RateLimited {
                retry_after: parse_retry_after(raw, Utc::now()),
                message,
                status,
            };
        }
        if status >= 500 {
            return Classification::ApiError {
                message: format!("HTTP {status} server error"),
                status: Some(status),
                transient: true,
            };
        }

        let text = match decode_text(raw) {
            Ok(text) => text,
            Err(message) => {
                // A 4xx with a binary body is still a client error.
                if (400..500).contains(&status) {
                    return Classification::ApiError {
                        message: format!("HTTP {status} client error"),
                        status: Some(status),
                        transient: false,
                    };
                }
                return Classification::Malformed { message, status };
            }
        };
        let text = text.trim();
        let line = first_line(text);

        if (200..300).contains(&status) || (400..500).contains(&status) {
            if let Some(marker) = self.match_marker(line) {
                return match marker.kind {
                    MarkerKind::RateLimit => Classification::RateLimited {
                        retry_after: parse_retry_after(raw, Utc::now()),
                        message: line.to_string(),
                        status,
                    },
                    MarkerKind::InvalidInput => Classification::InvalidTarget {
                        message: format!("API error: {line}"),
                        status,
                    },
                    MarkerKind::ApiError => Classification::ApiError {
                        message: format!("API error: {line}"),
                        status: Some(status),
                        transient: false,
                    },
                };
            }
        }

        if (400..500).contains(&status) {
            let detail = if line.is_empty() {
                "client error".to_string()
            } else {
                line.to_string()
            };
            return Classification::ApiError {
                message: format!("HTTP {status}: {detail}"),
                status: Some(status),
                transient: false,
            };
        }
        if !(200..300).contains(&status) {
            return Classification::ApiError {
                message: format!("Unexpected HTTP status {status}"),
                status: Some(status),
                transient: false,
            };
        }
        if text.is_empty() {
            return Classification::ApiError {
                message: "Empty response".to_string(),
                status: Some(status),
                transient: false,
            };
        }

        Classification::Success(text.to_string())
    }

    fn match_marker(&self, line: &str) -> Option<&BodyMarker> {
        let lower = line.to_lowercase();
        self.markers.iter().find(|m| m.matches(&lower))
    }
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
}

/// Body as text, or why it is not the plain text the API promises.
fn decode_text(raw: &RawResponse) -> Result<String, String> {
    if let Some(content_type) = raw.header(CONTENT_TYPE.as_str()) {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let texty = mime.starts_with("text/")
            || mime == "application/json"
            || mime == "application/xml"
            || mime.is_empty();
        if !texty {
            return Err(format!("Unexpected content type: {mime}"));
        }
    }

    let text = String::from_utf8(raw.body.clone())
        .map_err(|e| format!("Response is not valid UTF-8: {e}"))?;
    if text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err("Response contains binary control characters".to_string());
    }
    Ok(text)
}

/// `Retry-After` as delta-seconds or an HTTP-date relative to `now`.
fn parse_retry_after(raw: &RawResponse, now: DateTime<Utc>) -> Option<Duration> {
    let value = raw.header(RETRY_AFTER.as_str())?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((when - now).to_std().unwrap_or(Duration::ZERO))
}
