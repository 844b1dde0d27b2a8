//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hackertarget_client::{
    ClientConfig, QueryExecutor, RawResponse, RetryConfig, Tool, Transport, TransportError,
};

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 单次发送的预设结果
pub type Scripted = Result<RawResponse, TransportError>;

/// 按脚本依次返回响应的 Transport，记录调用次数与请求目标
///
/// 脚本耗尽后重复返回 `fallback`。
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    calls: AtomicU32,
    seen: Mutex<Vec<(Tool, String)>>,
    /// 每次发送前的模拟网络延迟
    latency: Duration,
}

impl MockTransport {
    /// 始终返回同一响应
    pub fn always(response: Scripted) -> Self {
        Self::scripted(Vec::new(), response)
    }

    /// 先依次返回 `script`，之后始终返回 `fallback`
    pub fn scripted(script: Vec<Scripted>, fallback: Scripted) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// 实际发送过的 (tool, target)
    pub fn seen(&self) -> Vec<(Tool, String)> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        tool: Tool,
        target: &str,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((tool, target.to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// 200 + 文本响应
pub fn ok(body: &str) -> Scripted {
    Ok(RawResponse::new(200, body).with_header("content-type", "text/plain"))
}

/// 指定状态码的文本响应
pub fn status(code: u16, body: &str) -> Scripted {
    Ok(RawResponse::new(code, body).with_header("content-type", "text/plain"))
}

/// 429 + Retry-After（秒）
pub fn rate_limited(retry_after_secs: u64) -> Scripted {
    Ok(RawResponse::new(429, "Too Many Requests")
        .with_header("content-type", "text/plain")
        .with_header("retry-after", &retry_after_secs.to_string()))
}

/// 测试用配置：退避基数 500ms，可指定最大重试次数
pub fn config(max_retries: u32) -> ClientConfig {
    ClientConfig::default().retry(RetryConfig::default().max_retries(max_retries))
}

pub fn executor(transport: &Arc<MockTransport>, max_retries: u32) -> QueryExecutor {
    match QueryExecutor::new(transport.clone(), &config(max_retries)) {
        Ok(executor) => executor,
        Err(e) => panic!("test config should be valid: {e}"),
    }
}
