use std::path::Path;

use anyhow::{bail, Context, Result};

/// Targets from file content: one per line, trimmed; blank lines and lines
/// starting with `#` are skipped.
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_targets(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read target file {}", path.display()))?;
    let targets = parse_targets(&content);
    if targets.is_empty() {
        bail!("File is empty or contains no valid targets: {}", path.display());
    }
    tracing::info!("Loaded {} target(s) from {}", targets.len(), path.display());
    Ok(targets)
}
