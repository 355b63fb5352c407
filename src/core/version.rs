//! Release version resolution.
//!
//! The version lives in a metadata source file as a single line of the form
//! `<prefix><version><suffix>`, e.g. `[assembly: AssemblyVersion("1.3.5.20")]`.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::VersionSourceConfig;
use crate::error::{Error, Result, VersionNotFoundDetails};
use crate::utils::io;

// One or more dot-separated numeric components
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());

/// Dotted numeric release version, kept verbatim as written in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn parse(raw: &str) -> Option<Self> {
        VERSION_PATTERN
            .is_match(raw)
            .then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `v<version>`, the form used for the binaries directory and the shortcut.
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the version from metadata content.
///
/// Returns the substring between `prefix` and `suffix` on the first line
/// starting with `prefix`. Trailing whitespace on the line is ignored.
pub fn extract_version(content: &str, prefix: &str, suffix: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.starts_with(prefix))
        .and_then(|line| {
            line.trim_end()
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .map(|v| v.to_string())
        })
}

/// Read `path` and resolve the release version from it.
pub fn resolve_version(path: &Path, source: &VersionSourceConfig) -> Result<Version> {
    let content = io::read_file(path, "read version metadata")?;
    resolve_from_content(&content, path, source)
}

fn resolve_from_content(
    content: &str,
    path: &Path,
    source: &VersionSourceConfig,
) -> Result<Version> {
    let not_found = |line: Option<String>| {
        Error::version_not_found(VersionNotFoundDetails {
            path: path.display().to_string(),
            prefix: source.prefix.clone(),
            suffix: source.suffix.clone(),
            line,
        })
    };

    let raw = extract_version(content, &source.prefix, &source.suffix)
        .ok_or_else(|| not_found(None))?;

    let version = Version::parse(&raw).ok_or_else(|| not_found(Some(raw.clone())))?;
    log_status!("version", "Resolved version {}", version);
    Ok(version)
}
