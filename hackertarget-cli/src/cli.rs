use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hackertarget_client::{BatchOptions, ClientConfig, RetryConfig, Tool};

#[derive(Parser, Debug)]
#[command(name = "hackertarget")]
#[command(version)]
#[command(about = "Query the HackerTarget reconnaissance API (DNS, whois, geoip, port scan, ...)", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "API key for higher request quotas")]
    pub api_key: Option<String>,

    #[arg(long, global = true, default_value_t = 30.0, help = "Request timeout in seconds")]
    pub timeout: f64,

    #[arg(long, global = true, default_value_t = 3, help = "Retries after the first attempt for transient failures")]
    pub max_retries: u32,

    #[arg(long, global = true, default_value_t = 0.5, help = "Delay before the first retry in seconds (doubles each retry)")]
    pub backoff_factor: f64,

    #[arg(long, global = true, help = "Cache successful responses for this many seconds")]
    pub cache_ttl: Option<u64>,

    #[arg(long, global = true, value_enum, default_value = "info", help = "Log level (RUST_LOG overrides)")]
    pub log_level: LogLevel,

    #[arg(short, long, global = true, help = "Shorthand for --log-level debug")]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "console", help = "Output format")]
    pub output: OutputFormat,

    #[arg(short, long, global = true, value_name = "FILE", help = "Write output to FILE instead of stdout")]
    pub save: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one tool against one target
    Query {
        #[arg(value_parser = parse_tool, help = "Tool name or id (see `hackertarget tools`)")]
        tool: Tool,
        #[arg(help = "Domain, IP, CIDR or URL, depending on the tool")]
        target: String,
    },
    /// Run one tool against every target in a file
    Batch {
        #[arg(short, long, value_name = "FILE", help = "Target file: one per line, '#' starts a comment")]
        file: PathBuf,
        #[arg(short, long, value_parser = parse_tool, help = "Tool name or id")]
        tool: Tool,
        #[arg(short, long, default_value_t = 1.0, help = "Seconds to wait between targets")]
        delay: f64,
        #[arg(long, help = "Skip the remaining targets after the first failure")]
        stop_on_error: bool,
    },
    /// List available tools
    Tools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[value(name = "console", help = "Plain text")]
    Console,
    #[value(name = "json", help = "Pretty-printed JSON")]
    Json,
}

fn parse_tool(s: &str) -> Result<Tool, String> {
    s.parse::<Tool>().map_err(|e| e.to_string())
}

fn secs(value: f64, what: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {what}: {value}"))
}

impl GlobalArgs {
    /// Effective log filter directive for this crate family.
    pub fn log_level(&self) -> LogLevel {
        if self.verbose && self.log_level != LogLevel::Trace {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let retry = RetryConfig::default()
            .max_retries(self.max_retries)
            .backoff_base(secs(self.backoff_factor, "backoff factor")?);
        let mut config = ClientConfig::default()
            .timeout(secs(self.timeout, "timeout")?)
            .retry(retry)
            .cache_ttl(self.cache_ttl.map(Duration::from_secs));
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config.api_key(key);
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn batch_options(delay: f64, stop_on_error: bool) -> Result<BatchOptions> {
    let options = BatchOptions::default()
        .delay_secs(delay)?
        .continue_on_error(!stop_on_error);
    options.validate()?;
    Ok(options)
}
