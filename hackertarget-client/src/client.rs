use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::batch::BatchRunner;
use crate::cache::CacheStats;
use crate::classifier::ResponseClassifier;
use crate::config::{BatchOptions, ClientConfig};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::http_client::{HttpTransport, Transport};
use crate::tool::Tool;
use crate::types::{BatchReport, QueryResult};

/// Entry point for library users: one connection pool, one optional cache,
/// any number of queries and batches.
///
/// # Example
///
/// ```rust,no_run
/// use hackertarget_client::{ClientConfig, HackerTargetClient, Tool};
///
/// # async fn run() -> Result<(), hackertarget_client::ClientError> {
/// let client = HackerTargetClient::new(ClientConfig::default())?;
/// let result = client.query(Tool::Dns, "example.com").await;
/// if let Some(data) = result.data() {
///     println!("{data}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HackerTargetClient {
    config: ClientConfig,
    executor: QueryExecutor,
}

impl HackerTargetClient {
    /// Build the HTTP connection pool and the executor.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Use a caller-supplied transport (mocks, proxies). The config is
    /// validated the same way as in [`new`](Self::new).
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self> {
        let executor = QueryExecutor::new(transport, &config)?;
        Ok(Self { config, executor })
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.executor = self.executor.with_classifier(classifier);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub async fn query(&self, tool: Tool, target: &str) -> QueryResult {
        self.executor.query(tool, target).await
    }

    /// Query by numeric tool id (1-14).
    pub async fn query_by_id(&self, tool_id: u8, target: &str) -> Result<QueryResult> {
        let tool = Tool::try_from(tool_id)?;
        Ok(self.query(tool, target).await)
    }

    pub async fn batch_query<S: AsRef<str>>(
        &self,
        tool: Tool,
        targets: &[S],
        options: BatchOptions,
    ) -> Result<BatchReport> {
        BatchRunner::new(&self.executor, options)?
            .run(tool, targets)
            .await
    }

    /// [`batch_query`](Self::batch_query) with cancellation and a per-target callback.
    pub async fn batch_query_with<S, F>(
        &self,
        tool: Tool,
        targets: &[S],
        options: BatchOptions,
        cancel: &CancellationToken,
        on_item: F,
    ) -> Result<BatchReport>
    where
        S: AsRef<str>,
        F: FnMut(&QueryResult),
    {
        BatchRunner::new(&self.executor, options)?
            .run_with(tool, targets, cancel, on_item)
            .await
    }

    /// `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.executor.cache().map(|c| c.stats())
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = self.executor.cache() {
            cache.clear();
        }
    }
}
