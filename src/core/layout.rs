//! Concrete paths and names for one release, derived from config + version.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::paths;
use crate::version::Version;

/// Signer-produced manifest name, used for both the binaries and the archive.
pub const MANIFEST_FILE: &str = "filelist.txt";

/// Marker file inside `update/` holding the archive filename.
pub const VERSION_MARKER_FILE: &str = "version.txt";

/// `<app_name>.v<version>`
pub fn package_name(app_name: &str, version: &Version) -> String {
    format!("{}.{}", app_name, version.tag())
}

/// `<package_name>.zip`
pub fn archive_name(app_name: &str, version: &Version) -> String {
    format!("{}.zip", package_name(app_name, version))
}

/// Absolute application repository root.
pub fn origin(config: &PublishConfig) -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("get current dir".to_string())))?;
    paths::resolve(&cwd, &config.origin)
}

/// Metadata file the version is read from.
pub fn version_file(config: &PublishConfig) -> Result<PathBuf> {
    paths::resolve(&origin(config)?, &config.version.file)
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelPaths {
    pub test: PathBuf,
    pub production: PathBuf,
    pub light: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseLayout {
    pub version: Version,
    pub package_name: String,
    pub archive_name: String,

    pub origin: PathBuf,
    /// Build output root (`out/`)
    pub output: PathBuf,
    pub solution: PathBuf,
    pub source_bin: PathBuf,
    pub util_exe: PathBuf,
    pub license: PathBuf,
    pub start_script: PathBuf,
    pub shortcut_template: PathBuf,

    /// `<packaged_root>/<version>`
    pub version_root: PathBuf,
    /// `<version_root>/<package_name>`, the assembled tree
    pub target: PathBuf,
    /// `<target>/bin/v<version>`
    pub target_bin: PathBuf,
    pub bin_manifest: PathBuf,
    pub version_marker: PathBuf,
    pub shortcut: PathBuf,

    pub archive: PathBuf,
    pub archive_manifest: PathBuf,
    pub light_dir: PathBuf,
    pub light_archive: PathBuf,

    pub channels: ChannelPaths,

    pub pull_repo: PathBuf,
    pub notifications_repo: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_app: Option<PathBuf>,
    pub test_runner: PathBuf,
    pub test_assembly: PathBuf,
}

impl ReleaseLayout {
    pub fn resolve(config: &PublishConfig, version: Version) -> Result<Self> {
        let origin = origin(config)?;
        Self::resolve_at(config, version, &origin)
    }

    /// Resolve every configured path against an already-absolute `origin`.
    pub fn resolve_at(config: &PublishConfig, version: Version, origin: &Path) -> Result<Self> {
        let output = paths::resolve(origin, &config.output_dir)?;
        let repos = match &config.repos_dir {
            Some(dir) => paths::resolve(origin, dir)?,
            None => origin.parent().unwrap_or(origin).to_path_buf(),
        };

        let package_name = package_name(&config.app_name, &version);
        let archive_name = archive_name(&config.app_name, &version);

        let source_bin = output.join("bin").join(&config.configuration);
        let util_exe = match &config.tools.util_exe {
            Some(exe) => paths::resolve(origin, exe)?,
            None => source_bin.join("Mtgdb.Util.exe"),
        };

        let version_root = paths::resolve(origin, &config.packaged_root)?.join(version.as_str());
        let target = version_root.join(&package_name);
        let target_bin = target.join("bin").join(version.tag());
        let light_dir = version_root.join(&config.compression.light.dir_name);

        let installed_app = match &config.installed_app {
            Some(path) => Some(paths::resolve(origin, path)?),
            None => None,
        };

        Ok(Self {
            package_name,
            archive: version_root.join(&archive_name),
            archive_name,

            solution: paths::resolve(origin, &config.tools.solution)?,
            license: output.parent().unwrap_or(origin).join("LICENSE"),
            start_script: output.join("start.sh"),
            shortcut_template: paths::resolve(&output, &config.shortcut.template)?,
            source_bin,
            util_exe,

            bin_manifest: target_bin.join(MANIFEST_FILE),
            version_marker: target.join("update").join(VERSION_MARKER_FILE),
            shortcut: target.join(&config.shortcut.output_name),
            target_bin,
            target,

            archive_manifest: version_root.join(MANIFEST_FILE),
            light_archive: light_dir.join(&config.compression.light.file_name),
            light_dir,
            version_root,

            channels: ChannelPaths {
                test: paths::resolve(origin, &config.channels.test)?,
                production: paths::resolve(origin, &config.channels.production)?,
                light: paths::resolve(origin, &config.channels.light)?,
            },

            pull_repo: paths::resolve(&repos, &config.notification.pull_repo)?,
            notifications_repo: paths::resolve(&repos, &config.notification.repo)?,

            installed_app,
            test_runner: paths::resolve(origin, &config.tests.runner)?,
            test_assembly: paths::resolve(origin, &config.tests.assembly)?,

            origin: origin.to_path_buf(),
            output,
            version,
        })
    }
}
