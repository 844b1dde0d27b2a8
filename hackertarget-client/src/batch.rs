//! Sequential batch execution
//!
//! One target at a time, with an idle delay between requests. The remote rate
//! limit is shared by every request, so targets are never run in parallel.

use std::collections::HashSet;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::BatchOptions;
use crate::error::{ClientError, ErrorKind, Result};
use crate::executor::QueryExecutor;
use crate::tool::Tool;
use crate::types::{BatchReport, QueryResult};

const CANCELLED_REASON: &str = "Batch cancelled before this target was attempted";

#[derive(Debug)]
pub struct BatchRunner<'a> {
    executor: &'a QueryExecutor,
    options: BatchOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(executor: &'a QueryExecutor, options: BatchOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { executor, options })
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub async fn run<S: AsRef<str>>(&self, tool: Tool, targets: &[S]) -> Result<BatchReport> {
        self.run_with(tool, targets, &CancellationToken::new(), |_| {})
            .await
    }

    /// Run the batch, calling `on_item` as each target's result is recorded.
    ///
    /// Every distinct target ends up in the report exactly once, in input
    /// order: attempted targets with their result, the rest as
    /// [`ErrorKind::Skipped`]. Repeated targets are queried only the first time.
    pub async fn run_with<S, F>(
        &self,
        tool: Tool,
        targets: &[S],
        cancel: &CancellationToken,
        mut on_item: F,
    ) -> Result<BatchReport>
    where
        S: AsRef<str>,
        F: FnMut(&QueryResult),
    {
        if targets.is_empty() {
            return Err(ClientError::EmptyBatch);
        }

        let started = Instant::now();
        let total = targets.len();
        let mut report = BatchReport::new(tool);
        let mut seen: HashSet<&str> = HashSet::with_capacity(total);
        let mut stop_reason: Option<String> = None;
        let mut previous_sent = false;

        log::info!(
            "[{tool}] Batch {} started: {total} target(s), delay {:.1}s",
            report.batch_id,
            self.options.delay.as_secs_f32()
        );

        for (index, target) in targets.iter().enumerate() {
            let target = target.as_ref();
            if !seen.insert(target) {
                log::debug!("[{tool}] Duplicate target '{target}' ignored");
                continue;
            }

            if stop_reason.is_none() && previous_sent {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        report.cancelled = true;
                        stop_reason = Some(CANCELLED_REASON.to_string());
                    }
                    () = tokio::time::sleep(self.options.delay) => {}
                }
            }

            if let Some(reason) = &stop_reason {
                let result = QueryResult::skipped(tool, target, reason.clone());
                on_item(&result);
                report.push(result);
                continue;
            }

            let result = self.executor.query_with_cancel(tool, target, cancel).await;
            previous_sent = result.attempts() > 0;

            if result.error_kind() == Some(ErrorKind::Cancelled) {
                report.cancelled = true;
                stop_reason = Some(CANCELLED_REASON.to_string());
            } else if !result.is_success() && !self.options.continue_on_error {
                log::warn!("[{tool}] Stopping batch after '{target}' failed");
                stop_reason = Some(format!("Batch stopped after '{target}' failed"));
            }

            log::info!(
                "[{tool}] Batch item {}/{total} {target}: {}",
                index + 1,
                if result.is_success() {
                    "ok"
                } else {
                    result.error_kind().map_or("failed", ErrorKind::as_str)
                }
            );
            on_item(&result);
            report.push(result);
        }

        report.elapsed = started.elapsed();
        log::info!(
            "[{tool}] Batch {} finished in {:.1}s: {} ok, {} failed, {} skipped{}",
            report.batch_id,
            report.elapsed.as_secs_f32(),
            report.success_count(),
            report.failed_count(),
            report.skipped_count(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }
}
