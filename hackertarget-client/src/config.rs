//! Fully-resolved runtime configuration.
//!
//! Merging config files, environment and flags is the caller's job; the
//! types here only carry the final values and check them.

use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.hackertarget.com/";
/// 默认请求超时（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 批量查询默认间隔（毫秒）
const DEFAULT_BATCH_DELAY_MS: u64 = 1_000;

/// Retry and backoff settings for a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Growth factor between consecutive retries.
    pub backoff_multiplier: u32,
    /// Upper bound for any single wait, including server-provided `Retry-After`.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            backoff_multiplier: 2,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

/// Everything a [`HackerTargetClient`](crate::HackerTargetClient) needs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; must be HTTPS except for loopback test servers.
    pub base_url: Url,
    /// Optional key, sent as the `apikey` query parameter.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub retry: RetryConfig,
    /// Cache successful responses for this long; `None` disables the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: format!("hackertarget-rs/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
            cache_ttl: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|e| unreachable!("default base URL is valid: {e}"))
}

impl ClientConfig {
    /// Point the client at another API root (a mirror, or a local test server).
    pub fn base_url(mut self, base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base URL '{base_url}': {e}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        Ok(self)
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Reject values that would make every query fail or leak over plaintext.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.backoff_multiplier == 0 {
            return Err(ClientError::InvalidConfig(
                "backoff multiplier must be at least 1".to_string(),
            ));
        }
        if matches!(&self.cache_ttl, Some(ttl) if ttl.is_zero()) {
            return Err(ClientError::InvalidConfig(
                "cache TTL must be greater than zero".to_string(),
            ));
        }
        match self.base_url.scheme() {
            "https" => Ok(()),
            "http" if is_loopback(&self.base_url) => Ok(()),
            scheme => Err(ClientError::InvalidConfig(format!(
                "base URL must use https (got {scheme}://{})",
                self.base_url.host_str().unwrap_or_default()
            ))),
        }
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(host)) => host.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Sequencing options for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Idle time between consecutive targets (not before the first).
    pub delay: Duration,
    /// Keep going after a failed target; when `false` the rest are skipped.
    pub continue_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            continue_on_error: true,
        }
    }
}

impl BatchOptions {
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Build the delay from seconds as given on a command line.
    pub fn delay_secs(self, secs: f64) -> Result<Self> {
        let delay = Duration::try_from_secs_f64(secs)
            .map_err(|_| ClientError::InvalidConfig(format!("invalid batch delay: {secs}")))?;
        Ok(self.delay(delay))
    }

    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.delay.is_zero() {
            return Err(ClientError::InvalidConfig(
                "batch delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
