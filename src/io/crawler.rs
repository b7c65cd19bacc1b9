use anyhow::{Context, Result};
use glob::glob;
use log::warn;
use std::path::{Path, PathBuf};

/// Collects every `*.log` below `root`, sorted for deterministic output.
pub fn find_logs(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = root.join("**").join("*.log");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Non UTF-8 search root: {:?}", root))?;

    let mut logs = Vec::new();
    for entry in glob(pattern).context("Invalid glob pattern for log files")? {
        match entry {
            Ok(path) if path.is_file() => logs.push(path),
            Ok(_) => {}
            Err(e) => warn!("Error reading log entry: {}", e),
        }
    }
    logs.sort();
    Ok(logs)
}
