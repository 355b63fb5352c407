use crate::assemble;
use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::shortcut;

use super::{Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Recreate the package directory and copy the filtered build output into it.
pub struct AssembleTreeStage;

impl Stage for AssembleTreeStage {
    fn id(&self) -> StageId {
        StageId::AssembleTree
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        let report = assemble::assemble(ctx.layout)?;
        log_status!(
            "assemble",
            "{} files copied, {} entries skipped",
            report.files_copied,
            report.files_skipped
        );
        Ok(StageOutcome::with_data(report))
    }

    fn plan(&self, _config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::default()
            .path(&layout.output)
            .path(&layout.target)
    }
}

/// Write the versioned shortcut next to the package contents.
pub struct PatchShortcutStage;

impl Stage for PatchShortcutStage {
    fn id(&self) -> StageId {
        StageId::PatchShortcut
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        shortcut::patch_shortcut(
            &ctx.layout.shortcut_template,
            &ctx.layout.shortcut,
            &ctx.config.shortcut.placeholder,
            &ctx.layout.version,
        )?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, _config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::default()
            .path(&layout.shortcut_template)
            .path(&layout.shortcut)
    }
}
