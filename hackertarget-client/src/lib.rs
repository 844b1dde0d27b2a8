//! # hackertarget-client
//!
//! Query execution and batch orchestration for the
//! [HackerTarget](https://hackertarget.com/) reconnaissance API.
//!
//! A query turns a `(tool, target)` pair into one validated HTTPS request,
//! classifies the textual response (the API reports most errors inside HTTP 200
//! bodies) and retries transient failures with exponential backoff. A batch runs
//! the same tool over many targets, one at a time, with a delay in between.
//!
//! ## Tools
//!
//! | Id | Tool | Endpoint | Target |
//! |----|------|----------|--------|
//! | 1 | Traceroute (MTR) | `/mtr/` | domain or IP |
//! | 2 | Ping Test | `/nping/` | domain or IP |
//! | 3 | DNS Lookup | `/dnslookup/` | domain |
//! | 4 | Reverse DNS | `/reversedns/` | IP |
//! | 5 | Find DNS Host | `/hostsearch/` | domain |
//! | 6 | Find Shared DNS | `/findshareddns/` | domain |
//! | 7 | Zone Transfer | `/zonetransfer/` | domain |
//! | 8 | Whois Lookup | `/whois/` | domain or IP |
//! | 9 | IP Location Lookup | `/geoip/` | domain or IP |
//! | 10 | Reverse IP Lookup | `/reverseiplookup/` | domain or IP |
//! | 11 | TCP Port Scan (Nmap) | `/nmap/` | domain or IP |
//! | 12 | Subnet Lookup | `/subnetcalc/` | CIDR |
//! | 13 | HTTP Header Check | `/httpheaders/` | URL |
//! | 14 | Extract Page Links | `/pagelinks/` | URL |
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)* - Use rustls.
//! - **`native-tls`** - Use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use hackertarget_client::{BatchOptions, ClientConfig, HackerTargetClient, Tool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. One client per process: it owns the connection pool
//!     let config = ClientConfig::default().timeout(Duration::from_secs(20));
//!     let client = HackerTargetClient::new(config)?;
//!
//!     // 2. Single query
//!     let result = client.query(Tool::Dns, "example.com").await;
//!     match (result.data(), result.error()) {
//!         (Some(data), _) => println!("{data}"),
//!         (_, Some(error)) => eprintln!("{error}"),
//!         _ => {}
//!     }
//!
//!     // 3. Batch: every target appears in the report, in input order
//!     let report = client
//!         .batch_query(Tool::GeoIp, &["8.8.8.8", "1.1.1.1"], BatchOptions::default())
//!         .await?;
//!     for item in &report {
//!         println!("{}: {}", item.target(), item.is_success());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Per-target failures never surface as `Err`; they are carried in
//! [`QueryResult::error`] as an [`ErrorInfo`] whose [`ErrorKind`] tells them apart:
//!
//! - [`ErrorKind::Validation`] - rejected locally, nothing was sent
//! - [`ErrorKind::RateLimit`] - the service asked us to slow down (retryable)
//! - [`ErrorKind::Network`] / [`ErrorKind::Timeout`] - transport failures (retryable)
//! - [`ErrorKind::ApiError`] - error reported by the service (retryable only for 5xx)
//! - [`ErrorKind::Malformed`] - response that is not text
//!
//! Only configuration problems (unknown tool id, empty batch, zero timeout or
//! delay) are returned as [`ClientError`].

mod batch;
mod cache;
mod classifier;
mod client;
mod config;
mod error;
mod executor;
mod http_client;
mod retry;
mod tool;
mod types;
mod utils;
pub mod validator;

pub use batch::BatchRunner;
pub use cache::{CacheStats, ResponseCache};
pub use classifier::{
    BodyMarker, Classification, DEFAULT_RATE_LIMIT_WAIT, MarkerKind, ResponseClassifier,
};
pub use client::HackerTargetClient;
pub use config::{BatchOptions, ClientConfig, DEFAULT_BASE_URL, RetryConfig};
pub use error::{
    ClientError, ErrorInfo, ErrorKind, Result, TransportError, TransportErrorKind,
    ValidationError,
};
pub use executor::QueryExecutor;
pub use http_client::{HttpTransport, RawResponse, Transport};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use tool::{TargetKind, Tool};
pub use types::{BatchReport, QueryResult};

// Re-export utils module
pub use utils::duration;
pub use utils::log_sanitizer::redact_api_key;
