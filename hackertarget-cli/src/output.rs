//! Console and JSON rendering, plus writing to stdout or a file.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use hackertarget_client::{BatchReport, QueryResult, Tool};

use crate::cli::OutputFormat;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn push_result(out: &mut String, result: &QueryResult) {
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "tool: {}", result.tool().display_name());
    let _ = writeln!(out, "target: {}", result.target());
    let mut details = format!(
        "attempts: {}, elapsed: {:.2}s",
        result.attempts(),
        result.elapsed().as_secs_f64()
    );
    if result.is_cached() {
        details.push_str(", cached");
    }
    let _ = writeln!(out, "{details}");
    let _ = writeln!(out, "{}", rule());
    match (result.data(), result.error()) {
        (Some(data), _) => {
            let _ = writeln!(out, "{data}");
        }
        (_, Some(error)) => {
            let _ = writeln!(out, "Error [{}]: {error}", error.kind);
        }
        _ => {}
    }
}

pub fn render_query(result: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize result")
        }
        OutputFormat::Console => {
            let mut out = String::new();
            push_result(&mut out, result);
            Ok(out)
        }
    }
}

pub fn render_batch(report: &BatchReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize batch report")
        }
        OutputFormat::Console => {
            let mut out = String::new();
            for result in report {
                push_result(&mut out, result);
                out.push('\n');
            }
            let _ = writeln!(out, "{}", rule());
            let _ = writeln!(
                out,
                "{}: {} target(s), {} ok, {} failed, {} skipped in {:.1}s{}",
                report.tool.display_name(),
                report.len(),
                report.success_count(),
                report.failed_count(),
                report.skipped_count(),
                report.elapsed.as_secs_f64(),
                if report.cancelled { " (cancelled)" } else { "" }
            );
            Ok(out)
        }
    }
}

pub fn render_tools() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>3}  {:<14}{:<24}{:<20}{}", "ID", "NAME", "TOOL", "ENDPOINT", "TARGET");
    for tool in Tool::all() {
        let _ = writeln!(
            out,
            "{:>3}  {:<14}{:<24}{:<20}{}",
            tool.id(),
            tool.slug(),
            tool.display_name(),
            tool.path(),
            tool.target_kind().describe()
        );
    }
    out
}

/// Print to stdout, or write to `save` when given.
pub fn emit(text: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Output saved to: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hackertarget_client::{ErrorInfo, ErrorKind};

    use super::*;

    fn sample() -> QueryResult {
        QueryResult::success(Tool::Dns, "example.com", "A : 93.184.216.34", 1, Duration::from_millis(420))
    }

    #[test]
    fn console_success() {
        let Ok(text) = render_query(&sample(), OutputFormat::Console) else {
            panic!("render");
        };
        assert!(text.contains("tool: DNS Lookup"));
        assert!(text.contains("target: example.com"));
        assert!(text.contains("attempts: 1, elapsed: 0.42s"));
        assert!(text.contains("A : 93.184.216.34"));
    }

    #[test]
    fn console_failure() {
        let result = QueryResult::failure(
            Tool::Whois,
            "example.com",
            ErrorInfo::new(ErrorKind::RateLimit, "API count exceeded").exhausted(),
            4,
            Duration::from_secs(3),
        );
        let Ok(text) = render_query(&result, OutputFormat::Console) else {
            panic!("render");
        };
        assert!(text.contains("Error [rate_limit]: Rate limit exhausted: API count exceeded"));
    }

    #[test]
    fn json_query() {
        let Ok(text) = render_query(&sample(), OutputFormat::Json) else {
            panic!("render");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            panic!("valid json");
        };
        assert_eq!(value["target"], "example.com");
        assert_eq!(value["data"], "A : 93.184.216.34");
    }

    #[test]
    fn tools_table_lists_all() {
        let text = render_tools();
        assert_eq!(text.lines().count(), 15);
        assert!(text.contains("/reverseiplookup/"));
    }

    #[test]
    fn emit_to_file() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir");
        };
        let path = dir.path().join("out.txt");
        assert!(emit("hello\n", Some(&path)).is_ok());
        assert_eq!(std::fs::read_to_string(&path).ok().as_deref(), Some("hello\n"));
    }
}
