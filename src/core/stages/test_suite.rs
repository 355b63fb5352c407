use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Run the NUnit suite under mono. Off unless `tests.enabled` is set.
pub struct RunTestsStage;

fn test_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Invocation {
    tool(config, &config.tools.mono)
        .arg(layout.test_runner.display().to_string())
        .arg(layout.test_assembly.display().to_string())
        .current_dir(&layout.origin)
}

const DISABLED: &str = "tests.enabled is false";

impl Stage for RunTestsStage {
    fn id(&self) -> StageId {
        StageId::RunTests
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        if !ctx.config.tests.enabled {
            return Ok(StageOutcome::Skipped(DISABLED.to_string()));
        }
        ctx.run(&test_invocation(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        if config.tests.enabled {
            StagePlan::commands(&[test_invocation(config, layout)])
        } else {
            StagePlan::skipped(DISABLED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{layout_at, run_stage, RecordingRunner};
    use tempfile::TempDir;

    #[test]
    fn disabled_by_default() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());
        let runner = RecordingRunner::default();

        let outcome = run_stage(&RunTestsStage, &config, &layout, &runner).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn runs_nunit_console_when_enabled() {
        let dir = TempDir::new().unwrap();
        let (mut config, layout) = layout_at(dir.path());
        config.tests.enabled = true;
        let runner = RecordingRunner::default();

        run_stage(&RunTestsStage, &config, &layout, &runner).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].program, "mono");
        assert!(calls[0].args[0].ends_with("nunit3-console.exe"));
        assert!(calls[0].args[1].ends_with("Mtgdb.Test.dll"));
    }
}
