use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Compile the solution with the configured build tool.
pub struct BuildStage;

pub fn build_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    tool(config, &config.tools.build)
        .arg(layout.solution.display().to_string())
        .args(config.tools.build_args.iter().cloned())
        .current_dir(&layout.origin)
}

impl Stage for BuildStage {
    fn id(&self) -> StageId {
        StageId::Build
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        ctx.run(&build_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&[build_invocation(config, layout)])
    }
}
