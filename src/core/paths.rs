use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "MTGDB_RELEASE_CONFIG";

/// Base config directory (~/.config/mtgdb-release/, %APPDATA%\mtgdb-release on Windows)
pub fn config_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("mtgdb-release"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("mtgdb-release"))
    }
}

/// Default release.json path
pub fn default_config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("release.json"))
}

/// Expand `~` and `$VAR` in a configured path.
pub fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).map_err(|e| {
        Error::config_invalid_value(
            "path",
            Some(raw.to_string()),
            format!("cannot expand path: {}", e),
        )
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand `path`, then anchor it at `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> Result<PathBuf> {
    let expanded = expand(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base.join(expanded))
    }
}
