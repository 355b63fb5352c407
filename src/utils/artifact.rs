//! Artifact file matching with glob pattern support.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

/// Files directly inside `dir` whose names match `pattern` (e.g. `*.zip`).
///
/// The directory part is escaped so that glob characters in configured paths
/// are taken literally. Results are sorted; directories are ignored. A missing
/// directory yields no matches.
pub fn find_matching(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped_dir.trim_end_matches('/'), pattern);

    let mut entries: Vec<PathBuf> = glob::glob(&full_pattern)
        .map_err(|e| {
            Error::config_invalid_value(
                "pattern",
                Some(pattern.to_string()),
                format!("Invalid glob pattern: {}", e),
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    entries.sort();
    Ok(entries)
}

/// Delete every file in `dir` matching `pattern`; returns what was removed.
pub fn remove_matching(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matches = find_matching(dir, pattern)?;
    for path in &matches {
        io::remove_file(path, "remove stale artifact")?;
    }
    Ok(matches)
}
