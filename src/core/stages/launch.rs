use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Start the locally installed app so it picks up the test-channel update.
///
/// The app is detached; the pipeline does not wait for it.
pub struct LaunchInstalledAppStage;

fn launch_invocation(config: &PublishConfig, layout: &ReleaseLayout) -> Option<Invocation> {
    let script = layout.installed_app.as_ref()?;
    let mut invocation = tool(config, &script.display().to_string());
    if let Some(dir) = script.parent() {
        invocation = invocation.current_dir(dir);
    }
    Some(invocation)
}

const NOT_CONFIGURED: &str = "installed_app is not configured";

impl Stage for LaunchInstalledAppStage {
    fn id(&self) -> StageId {
        StageId::LaunchInstalledApp
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        match launch_invocation(ctx.config, ctx.layout) {
            Some(invocation) => {
                ctx.runner.launch(&invocation)?;
                Ok(StageOutcome::done())
            }
            None => Ok(StageOutcome::Skipped(NOT_CONFIGURED.to_string())),
        }
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        match launch_invocation(config, layout) {
            Some(invocation) => StagePlan::commands(&[invocation]),
            None => StagePlan::skipped(NOT_CONFIGURED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{layout_at, run_stage, RecordingRunner};
    use tempfile::TempDir;

    #[test]
    fn skipped_without_installed_app() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());
        let runner = RecordingRunner::default();

        let outcome = run_stage(&LaunchInstalledAppStage, &config, &layout, &runner).unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(runner.launched.borrow().is_empty());
    }

    #[test]
    fn launches_detached_start_script() {
        let dir = TempDir::new().unwrap();
        let (config, mut layout) = layout_at(dir.path());
        let script = dir.path().join("Mtgdb.Gui/start.sh");
        layout.installed_app = Some(script.clone());
        let runner = RecordingRunner::default();

        run_stage(&LaunchInstalledAppStage, &config, &layout, &runner).unwrap();

        assert!(runner.calls.borrow().is_empty());
        let launched = runner.launched.borrow();
        assert_eq!(launched[0].program, script.display().to_string());
        assert_eq!(launched[0].current_dir.as_deref(), script.parent());
    }
}
