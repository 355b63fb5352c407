//! Copying release artifacts into distribution channel directories.
//!
//! A channel holds at most one current archive: every `*.zip` already there is
//! removed before the new files are copied in.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::layout::{ReleaseLayout, MANIFEST_FILE};
use crate::utils::{artifact, io};

use super::{Stage, StageContext, StageId, StageOutcome, StagePlan};

const ARCHIVE_PATTERN: &str = "*.zip";

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub channel: PathBuf,
    pub removed: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
}

fn copy_into(channel: &Path, file: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        Error::internal_unexpected(format!("no file name in {}", file.display()))
    })?;
    let dest = channel.join(name);
    io::copy_file(file, &dest, "publish to channel")?;
    Ok(dest)
}

/// Purge stale archives in `channel`, then copy `files` into it.
pub fn publish_files(channel: &Path, files: &[PathBuf]) -> Result<PublishReport> {
    io::ensure_dir(channel, "create channel directory")?;
    let removed = artifact::remove_matching(channel, ARCHIVE_PATTERN)?;

    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        copied.push(copy_into(channel, file)?);
    }

    log_status!(
        "publish",
        "{}: {} copied, {} stale archives removed",
        channel.display(),
        copied.len(),
        removed.len()
    );
    Ok(PublishReport {
        channel: channel.to_path_buf(),
        removed,
        copied,
    })
}

/// Every regular file directly inside `dir`, in name order.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read dir: {}", dir.display())))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("read dir: {}", dir.display())))
            })?
            .path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveChannel {
    Test,
    Production,
}

/// Publish the signed primary archive and its manifest to one channel.
pub struct PublishArchiveStage {
    channel: ArchiveChannel,
}

impl PublishArchiveStage {
    pub fn test() -> Self {
        Self {
            channel: ArchiveChannel::Test,
        }
    }

    pub fn production() -> Self {
        Self {
            channel: ArchiveChannel::Production,
        }
    }

    fn channel_dir<'a>(&self, layout: &'a ReleaseLayout) -> &'a Path {
        match self.channel {
            ArchiveChannel::Test => &layout.channels.test,
            ArchiveChannel::Production => &layout.channels.production,
        }
    }
}

impl Stage for PublishArchiveStage {
    fn id(&self) -> StageId {
        match self.channel {
            ArchiveChannel::Test => StageId::PublishTest,
            ArchiveChannel::Production => StageId::PublishProduction,
        }
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        let report = publish_files(
            self.channel_dir(ctx.layout),
            &[
                ctx.layout.archive.clone(),
                ctx.layout.archive_manifest.clone(),
            ],
        )?;
        Ok(StageOutcome::with_data(report))
    }

    fn plan(&self, _config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        let channel = self.channel_dir(layout);
        StagePlan::default()
            .path(&channel.join(&layout.archive_name))
            .path(&channel.join(MANIFEST_FILE))
    }
}

/// Publish everything in the light archive directory.
pub struct PublishLightStage;

impl Stage for PublishLightStage {
    fn id(&self) -> StageId {
        StageId::PublishLight
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        let files = files_in(&ctx.layout.light_dir)?;
        let report = publish_files(&ctx.layout.channels.light, &files)?;
        Ok(StageOutcome::with_data(report))
    }

    fn plan(&self, _config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::default()
            .path(&layout.light_dir)
            .path(&layout.channels.light)
    }
}
