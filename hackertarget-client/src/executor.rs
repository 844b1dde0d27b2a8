//! Query execution
//!
//! `validate → send → classify → (done | wait → send)`. Retry decisions are
//! resolved here; callers only ever see the terminal [`QueryResult`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cache::ResponseCache;
use crate::classifier::{Classification, ResponseClassifier};
use crate::config::ClientConfig;
use crate::error::{ErrorInfo, ErrorKind, Result};
use crate::http_client::Transport;
use crate::retry::{RetryDecision, RetryPolicy, RetryState};
use crate::tool::Tool;
use crate::types::QueryResult;
use crate::validator::{clean_target, validate};

/// Runs single queries against a shared [`Transport`].
///
/// Cheap to clone; clones share the transport and the cache.
#[derive(Clone)]
pub struct QueryExecutor {
    transport: Arc<dyn Transport>,
    classifier: ResponseClassifier,
    policy: RetryPolicy,
    timeout: Duration,
    cache: Option<Arc<ResponseCache>>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("classifier", &self.classifier)
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("cache", &self.cache.as_ref().map(|c| c.ttl()))
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    /// Executor using the default classifier; a cache is created when
    /// `config.cache_ttl` is set.
    ///
    /// Fails with [`ClientError::InvalidConfig`](crate::ClientError::InvalidConfig)
    /// when `config` does not pass [`ClientConfig::validate`].
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            classifier: ResponseClassifier::default(),
            policy: RetryPolicy::new(config.retry.clone()),
            timeout: config.timeout,
            cache: config.cache_ttl.map(|ttl| Arc::new(ResponseCache::new(ttl))),
        })
    }

    /// Replace the response classifier (e.g. to add body markers).
    #[must_use]
    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &ResponseClassifier {
        &self.classifier
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    pub async fn query(&self, tool: Tool, target: &str) -> QueryResult {
        self.query_with_cancel(tool, target, &CancellationToken::new())
            .await
    }

    /// Like [`query`](Self::query), but gives up as soon as `cancel` fires,
    /// whether the query is waiting on the network or on a retry delay.
    pub async fn query_with_cancel(
        &self,
        tool: Tool,
        target: &str,
        cancel: &CancellationToken,
    ) -> QueryResult {
        let started = Instant::now();

        if let Err(e) = validate(tool, target) {
            log::warn!("[{tool}] Validation failed: {e}");
            return QueryResult::failure(
                tool,
                target,
                ErrorInfo::new(ErrorKind::Validation, e.to_string()),
                0,
                started.elapsed(),
            );
        }

        let query = clean_target(tool, target);
        let mut state = RetryState::default();

        if cancel.is_cancelled() {
            return cancelled(tool, target, &state, started);
        }

        if let Some(data) = self.cache.as_ref().and_then(|c| c.get(tool, &query)) {
            log::debug!("[{tool}] Cache hit for {query}");
            return QueryResult::from_cache(tool, target, data);
        }

        loop {
            state.attempt += 1;
            let classification = tokio::select! {
                biased;
                () = cancel.cancelled() => return cancelled(tool, target, &state, started),
                sent = self.transport.send(tool, &query, self.timeout) => match sent {
                    Ok(raw) => self.classifier.classify(&raw),
                    Err(e) => Classification::from(e),
                },
            };

            if let Classification::RateLimited {
                retry_after,
                status,
                ..
            } = &classification
            {
                log::warn!("[{tool}] Rate limited (HTTP {status}), retry_after={retry_after:?}");
            }

            let decision = self.policy.next(&classification, &state);
            match (classification, decision) {
                (Classification::Success(data), _) => {
                    if let Some(cache) = &self.cache {
                        cache.insert(tool, &query, &data);
                    }
                    log::info!(
                        "[{tool}] {query} completed in {:.2}s (attempts: {})",
                        started.elapsed().as_secs_f32(),
                        state.attempt
                    );
                    return QueryResult::success(tool, target, data, state.attempt, started.elapsed());
                }
                (_, RetryDecision::Stop(error)) => {
                    let error = error.unwrap_or_else(|| {
                        ErrorInfo::new(ErrorKind::ApiError, "Query stopped without a response")
                    });
                    log::warn!(
                        "[{tool}] {query} failed after {} attempt(s): {error}",
                        state.attempt
                    );
                    return QueryResult::failure(tool, target, error, state.attempt, started.elapsed());
                }
                (classification, RetryDecision::Retry(delay)) => {
                    state.last_error = classification.error_kind();
                    state.next_delay = delay;
                    log::warn!(
                        "[{tool}] Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                        state.attempt,
                        self.policy.config().max_retries + 1,
                        delay.as_secs_f32(),
                        classification
                            .error_info()
                            .map(|e| e.to_string())
                            .unwrap_or_default()
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return cancelled(tool, target, &state, started),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

fn cancelled(tool: Tool, target: &str, state: &RetryState, started: Instant) -> QueryResult {
    log::info!("[{tool}] Query for {target} cancelled after {} attempt(s)", state.attempt);
    let message = match state.last_error {
        Some(kind) => format!("Query cancelled (last error: {kind})"),
        None => "Query cancelled".to_string(),
    };
    QueryResult::failure(
        tool,
        target,
        ErrorInfo::new(ErrorKind::Cancelled, message),
        state.attempt,
        started.elapsed(),
    )
}
