use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths;

/// Root configuration for a release run (release.json).
///
/// Relative paths are anchored at `origin` (the application repository),
/// except channel and packaging paths, which are expected to be absolute or
/// `~`-relative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_origin")]
    pub origin: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding sibling repositories (wiki, notifications).
    /// Defaults to the parent of `origin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos_dir: Option<PathBuf>,

    #[serde(default = "default_configuration")]
    pub configuration: String,

    #[serde(default = "default_packaged_root")]
    pub packaged_root: PathBuf,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub version: VersionSourceConfig,

    #[serde(default)]
    pub shortcut: ShortcutConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    /// Start script of a locally installed copy, launched after the test publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_app: Option<PathBuf>,

    #[serde(default)]
    pub tests: TestsConfig,
}

/// Where the release version is read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSourceConfig {
    #[serde(default = "default_version_file")]
    pub file: PathBuf,
    #[serde(default = "default_version_prefix")]
    pub prefix: String,
    #[serde(default = "default_version_suffix")]
    pub suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutConfig {
    /// Template path, relative to the build output directory
    #[serde(default = "default_shortcut_template")]
    pub template: PathBuf,
    #[serde(default = "default_shortcut_output")]
    pub output_name: String,
    #[serde(default = "default_shortcut_placeholder")]
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_build_program")]
    pub build: String,
    #[serde(default = "default_build_args")]
    pub build_args: Vec<String>,
    #[serde(default = "default_solution")]
    pub solution: PathBuf,
    #[serde(default = "default_mono")]
    pub mono: String,
    /// Signer/notifier executable. Defaults to bin/<configuration>/Mtgdb.Util.exe
    /// under the build output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub util_exe: Option<PathBuf>,
    #[serde(default = "default_archiver")]
    pub archiver: String,
    #[serde(default = "default_git")]
    pub git: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompressionConfig {
    #[serde(default)]
    pub primary: PrimaryArchiveConfig,
    #[serde(default)]
    pub light: LightArchiveConfig,
}

/// Maximum-ratio archive of the whole tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryArchiveConfig {
    #[serde(default = "default_primary_method")]
    pub method: String,
    #[serde(default = "default_true")]
    pub multithreaded: bool,
    #[serde(default = "default_dictionary_size")]
    pub dictionary_size: String,
    #[serde(default = "default_fast_bytes")]
    pub fast_bytes: u32,
    #[serde(default = "default_literal_context_bits")]
    pub literal_context_bits: u32,
}

/// Reduced-content archive for cheaper downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightArchiveConfig {
    #[serde(default = "default_light_method")]
    pub method: String,
    #[serde(default = "default_light_dir")]
    pub dir_name: String,
    #[serde(default = "default_light_file_name")]
    pub file_name: String,
    #[serde(default = "default_light_exclude")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "default_test_channel")]
    pub test: PathBuf,
    #[serde(default = "default_production_channel")]
    pub production: PathBuf,
    #[serde(default = "default_light_channel")]
    pub light: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Repository pulled before the notifier runs (relative to repos_dir)
    #[serde(default = "default_pull_repo")]
    pub pull_repo: PathBuf,
    /// Repository the notifier writes into; committed and pushed
    #[serde(default = "default_notifications_repo")]
    pub repo: PathBuf,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_test_runner")]
    pub runner: PathBuf,
    #[serde(default = "default_test_assembly")]
    pub assembly: PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            origin: default_origin(),
            output_dir: default_output_dir(),
            repos_dir: None,
            configuration: default_configuration(),
            packaged_root: default_packaged_root(),
            timeout_secs: default_timeout_secs(),
            version: VersionSourceConfig::default(),
            shortcut: ShortcutConfig::default(),
            tools: ToolsConfig::default(),
            compression: CompressionConfig::default(),
            channels: ChannelsConfig::default(),
            notification: NotificationConfig::default(),
            installed_app: None,
            tests: TestsConfig::default(),
        }
    }
}

impl Default for VersionSourceConfig {
    fn default() -> Self {
        Self {
            file: default_version_file(),
            prefix: default_version_prefix(),
            suffix: default_version_suffix(),
        }
    }
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            template: default_shortcut_template(),
            output_name: default_shortcut_output(),
            placeholder: default_shortcut_placeholder(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            build: default_build_program(),
            build_args: default_build_args(),
            solution: default_solution(),
            mono: default_mono(),
            util_exe: None,
            archiver: default_archiver(),
            git: default_git(),
        }
    }
}

impl Default for PrimaryArchiveConfig {
    fn default() -> Self {
        Self {
            method: default_primary_method(),
            multithreaded: true,
            dictionary_size: default_dictionary_size(),
            fast_bytes: default_fast_bytes(),
            literal_context_bits: default_literal_context_bits(),
        }
    }
}

impl Default for LightArchiveConfig {
    fn default() -> Self {
        Self {
            method: default_light_method(),
            dir_name: default_light_dir(),
            file_name: default_light_file_name(),
            exclude: default_light_exclude(),
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            test: default_test_channel(),
            production: default_production_channel(),
            light: default_light_channel(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            pull_repo: default_pull_repo(),
            repo: default_notifications_repo(),
            commit_message: default_commit_message(),
        }
    }
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            runner: default_test_runner(),
            assembly: default_test_assembly(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_app_name() -> String {
    "Mtgdb.Gui".to_string()
}

fn default_origin() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_configuration() -> String {
    "release".to_string()
}

fn default_packaged_root() -> PathBuf {
    PathBuf::from("~/mtg/packaged")
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_version_file() -> PathBuf {
    PathBuf::from("shared/SolutionInfo.cs")
}

fn default_version_prefix() -> String {
    "[assembly: AssemblyVersion(\"".to_string()
}

fn default_version_suffix() -> String {
    "\")]".to_string()
}

fn default_shortcut_template() -> PathBuf {
    PathBuf::from("Mtgdb.Gui.lnk.template")
}

fn default_shortcut_output() -> String {
    "Mtgdb.Gui.lnk".to_string()
}

fn default_shortcut_placeholder() -> String {
    "v0.0.0.0".to_string()
}

fn default_build_program() -> String {
    "msbuild".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["-verbosity:m".to_string()]
}

fn default_solution() -> PathBuf {
    PathBuf::from("Mtgdb.Mono.sln")
}

fn default_mono() -> String {
    "mono".to_string()
}

fn default_archiver() -> String {
    "7z".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_primary_method() -> String {
    "LZMA".to_string()
}

fn default_dictionary_size() -> String {
    "64m".to_string()
}

fn default_fast_bytes() -> u32 {
    64
}

fn default_literal_context_bits() -> u32 {
    8
}

fn default_light_method() -> String {
    "deflate".to_string()
}

fn default_light_dir() -> String {
    "deflate".to_string()
}

fn default_light_file_name() -> String {
    "Mtgdb.Gui.zip".to_string()
}

fn default_light_exclude() -> Vec<String> {
    vec![
        "data/index/*".to_string(),
        "data/AllPrintings.json".to_string(),
        "data/AllPrices.json".to_string(),
    ]
}

fn default_test_channel() -> PathBuf {
    PathBuf::from("~/Documents/shared/Mtgdb.Gui/app/test")
}

fn default_production_channel() -> PathBuf {
    PathBuf::from("~/Documents/shared/Mtgdb.Gui/app/release")
}

fn default_light_channel() -> PathBuf {
    PathBuf::from("~/Documents/shared/Mtgdb.Gui/app/deflate")
}

fn default_pull_repo() -> PathBuf {
    PathBuf::from("mtgdb.wiki")
}

fn default_notifications_repo() -> PathBuf {
    PathBuf::from("mtgdb.notifications")
}

fn default_commit_message() -> String {
    "auto".to_string()
}

fn default_test_runner() -> PathBuf {
    PathBuf::from("tools/NUnit.Console-3.7.0/nunit3-console.exe")
}

fn default_test_assembly() -> PathBuf {
    PathBuf::from("out/bin/release-test/Mtgdb.Test.dll")
}

// =============================================================================
// Loading functions
// =============================================================================

/// Where a loaded config came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum ConfigSource {
    File(String),
    BuiltinDefaults,
}

/// Load the release config.
///
/// Lookup order: explicit path, `$MTGDB_RELEASE_CONFIG`, then the default
/// release.json. An explicitly requested file must exist; a missing default
/// file falls back to built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<(PublishConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_from_file(path)?;
        return Ok((config, ConfigSource::File(path.display().to_string())));
    }

    if let Ok(env_path) = std::env::var(paths::CONFIG_ENV) {
        if !env_path.trim().is_empty() {
            let path = PathBuf::from(env_path);
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path.display().to_string())));
        }
    }

    let default_path = paths::default_config_file()?;
    if default_path.exists() {
        let config = load_from_file(&default_path)?;
        return Ok((config, ConfigSource::File(default_path.display().to_string())));
    }

    Ok((PublishConfig::default(), ConfigSource::BuiltinDefaults))
}

/// Load and validate a config file.
pub fn load_from_file(path: &Path) -> Result<PublishConfig> {
    if !path.exists() {
        return Err(Error::config_not_found(path.display().to_string()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let config: PublishConfig = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    config.validate()?;
    Ok(config)
}

impl PublishConfig {
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "app_name",
                Some(self.app_name.clone()),
                "must not be empty",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config_invalid_value(
                "timeout_secs",
                Some("0".to_string()),
                "must be greater than zero",
            ));
        }

        if self.shortcut.placeholder.is_empty() || !self.shortcut.placeholder.is_ascii() {
            return Err(Error::config_invalid_value(
                "shortcut.placeholder",
                Some(self.shortcut.placeholder.clone()),
                "must be a non-empty ASCII string",
            ));
        }

        if self.version.prefix.is_empty() {
            return Err(Error::config_invalid_value(
                "version.prefix",
                None,
                "must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_object_yields_builtin_defaults() {
        let config: PublishConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.app_name, "Mtgdb.Gui");
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.compression.primary.method, "LZMA");
        assert_eq!(config.compression.primary.dictionary_size, "64m");
        assert_eq!(config.compression.light.exclude.len(), 3);
        assert_eq!(config.shortcut.placeholder, "v0.0.0.0");
        assert!(!config.tests.enabled);
        assert!(config.installed_app.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: PublishConfig = serde_json::from_str(
            r#"{ "channels": { "test": "/srv/test" }, "tools": { "archiver": "/usr/bin/7za" } }"#,
        )
        .unwrap();

        assert_eq!(config.channels.test, PathBuf::from("/srv/test"));
        assert_eq!(
            config.channels.production,
            PathBuf::from("~/Documents/shared/Mtgdb.Gui/app/release")
        );
        assert_eq!(config.tools.archiver, "/usr/bin/7za");
        assert_eq!(config.tools.mono, "mono");
    }

    #[test]
    fn load_from_file_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_from_file(&dir.path().join("release.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "config.not_found");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_from_file_reports_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("release.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn load_from_file_rejects_zero_timeout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("release.json");
        fs::write(&path, r#"{ "timeout_secs": 0 }"#).unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("release.json");
        fs::write(&path, r#"{ "app_name": "Mtgdb.Test" }"#).unwrap();

        let (config, source) = load(Some(&path)).unwrap();
        assert_eq!(config.app_name, "Mtgdb.Test");
        assert!(matches!(source, ConfigSource::File(_)));
    }
}
