use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorInfo, ErrorKind};
use crate::tool::Tool;
use crate::utils::duration;

// ============ Query result ============

/// Terminal outcome of one query.
///
/// Exactly one of [`data`](Self::data) and [`error`](Self::error) is present:
/// the only constructors are [`success`](Self::success),
/// [`failure`](Self::failure) and [`skipped`](Self::skipped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    tool: Tool,
    target: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<ErrorInfo>,
    /// Requests sent; 0 for validation failures, skips and cache hits.
    attempts: u32,
    #[serde(rename = "elapsed_ms", with = "duration::millis")]
    elapsed: Duration,
    #[serde(default)]
    cached: bool,
}

impl QueryResult {
    pub fn success(
        tool: Tool,
        target: impl Into<String>,
        data: impl Into<String>,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            tool,
            target: target.into(),
            success: true,
            data: Some(data.into()),
            error: None,
            attempts,
            elapsed,
            cached: false,
        }
    }

    pub fn failure(
        tool: Tool,
        target: impl Into<String>,
        error: ErrorInfo,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            tool,
            target: target.into(),
            success: false,
            data: None,
            error: Some(error),
            attempts,
            elapsed,
            cached: false,
        }
    }

    /// Placeholder for a batch target that was never attempted.
    pub fn skipped(tool: Tool, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failure(
            tool,
            target,
            ErrorInfo::new(ErrorKind::Skipped, reason),
            0,
            Duration::ZERO,
        )
    }

    /// Successful result served from the response cache.
    pub fn from_cache(tool: Tool, target: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            cached: true,
            ..Self::success(tool, target, data, 0, Duration::ZERO)
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn is_skipped(&self) -> bool {
        self.error_kind() == Some(ErrorKind::Skipped)
    }

    /// The service kept rate-limiting until the retry budget ran out.
    pub fn is_rate_limit_exhausted(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|e| e.kind == ErrorKind::RateLimit && e.exhausted)
    }
}

// ============ Batch report ============

/// Results of a batch, one per distinct target, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub tool: Tool,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", with = "duration::millis")]
    pub elapsed: Duration,
    /// The caller cancelled the batch before every target was attempted.
    pub cancelled: bool,
    results: Vec<QueryResult>,
}

impl BatchReport {
    pub fn new(tool: Tool) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            tool,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            cancelled: false,
            results: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: QueryResult) {
        self.results.push(result);
    }

    /// Result for `target` (exact match on the target as submitted).
    pub fn get(&self, target: &str) -> Option<&QueryResult> {
        self.results.iter().find(|r| r.target == target)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.results.iter()
    }

    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Failures that were attempted (skips excluded).
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.success && !r.is_skipped())
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }
}

impl<'a> IntoIterator for &'a BatchReport {
    type Item = &'a QueryResult;
    type IntoIter = std::slice::Iter<'a, QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn success_has_data_only() {
        let r = QueryResult::success(Tool::Dns, "example.com", "data", 1, Duration::from_millis(5));
        assert!(r.is_success());
        assert_eq!(r.data(), Some("data"));
        assert!(r.error().is_none());
        assert!(!r.is_cached());
    }

    #[test]
    fn failure_has_error_only() {
        let r = QueryResult::failure(
            Tool::Dns,
            "example.com",
            ErrorInfo::new(ErrorKind::Timeout, "slow"),
            4,
            Duration::from_secs(1),
        );
        assert!(!r.is_success());
        assert!(r.data().is_none());
        assert_eq!(r.error_kind(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn rate_limit_exhausted_detection() {
        let exhausted = QueryResult::failure(
            Tool::Dns,
            "example.com",
            ErrorInfo::new(ErrorKind::RateLimit, "API count exceeded").exhausted(),
            4,
            Duration::ZERO,
        );
        assert!(exhausted.is_rate_limit_exhausted());

        let other = QueryResult::failure(
            Tool::Dns,
            "example.com",
            ErrorInfo::new(ErrorKind::ApiError, "HTTP 500").exhausted(),
            4,
            Duration::ZERO,
        );
        assert!(!other.is_rate_limit_exhausted());
    }

    #[test]
    fn cached_result_shape() {
        let r = QueryResult::from_cache(Tool::Whois, "example.com", "whois data");
        assert!(r.is_success());
        assert!(r.is_cached());
        assert_eq!(r.attempts(), 0);
    }

    #[test]
    fn query_result_json() {
        let r = QueryResult::success(Tool::Dns, "example.com", "A : 1.2.3.4", 1, Duration::from_millis(120));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["tool"], "dns");
        assert_eq!(json["success"], true);
        assert_eq!(json["elapsed_ms"], 120);
        assert!(json.get("error").is_none());

        let back: QueryResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn report_counts() {
        let mut report = BatchReport::new(Tool::Dns);
        report.push(QueryResult::success(Tool::Dns, "a.com", "ok", 1, Duration::ZERO));
        report.push(QueryResult::failure(
            Tool::Dns,
            "bad target",
            ErrorInfo::new(ErrorKind::Validation, "bad"),
            0,
            Duration::ZERO,
        ));
        report.push(QueryResult::skipped(Tool::Dns, "b.com", "stopped"));

        assert_eq!(report.len(), 3);
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.targets().collect::<Vec<_>>(), ["a.com", "bad target", "b.com"]);
        assert!(report.get("b.com").unwrap().is_skipped());
        assert!(report.get("c.com").is_none());
    }

    #[test]
    fn report_json_keeps_order() {
        let mut report = BatchReport::new(Tool::Ping);
        for t in ["z.com", "a.com", "m.com"] {
            report.push(QueryResult::success(Tool::Ping, t, "pong", 1, Duration::ZERO));
        }
        let json = serde_json::to_value(&report).unwrap();
        let targets: Vec<&str> = json["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["target"].as_str().unwrap())
            .collect();
        assert_eq!(targets, ["z.com", "a.com", "m.com"]);
        assert_eq!(json["tool"], "ping");
        assert!(json["batch_id"].is_string());
    }
}
