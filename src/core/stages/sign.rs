//! Signing of the package binaries and of the primary archive.
//!
//! Both run the util executable under mono; the signer writes a manifest
//! (`filelist.txt`) next to what it signed.

use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;
use crate::utils::artifact;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Editor host leftovers that must not ship.
const VSHOST_PATTERN: &str = "*.vshost.*";

fn sign_invocation(
    config: &PublishConfig,
    layout: &ReleaseLayout,
    subject: &std::path::Path,
    manifest: &std::path::Path,
) -> Invocation {
    tool(config, &config.tools.mono)
        .arg(layout.util_exe.display().to_string())
        .arg("-sign")
        .arg(subject.display().to_string())
        .arg("-output")
        .arg(manifest.display().to_string())
}

pub fn sign_binaries_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    sign_invocation(config, layout, &layout.target_bin, &layout.bin_manifest)
}

pub fn sign_archive_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    sign_invocation(config, layout, &layout.archive, &layout.archive_manifest)
}

pub struct SignBinariesStage;

impl Stage for SignBinariesStage {
    fn id(&self) -> StageId {
        StageId::SignBinaries
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        let removed = artifact::remove_matching(&ctx.layout.target, VSHOST_PATTERN)?;
        for path in &removed {
            log_status!("sign", "Removed {}", path.display());
        }
        ctx.run(&sign_binaries_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&[sign_binaries_invocation(config, layout)])
            .path(&layout.bin_manifest)
    }
}

pub struct SignArchiveStage;

impl Stage for SignArchiveStage {
    fn id(&self) -> StageId {
        StageId::SignArchive
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        ctx.run(&sign_archive_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&[sign_archive_invocation(config, layout)])
            .path(&layout.archive_manifest)
    }
}
