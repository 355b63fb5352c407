use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::Invocation;

use super::{tool, Stage, StageContext, StageId, StageOutcome, StagePlan};

/// Refresh the wiki checkout, generate the update notification and push it.
pub struct PublishNotificationStage;

fn git(config: &PublishConfig, repo: &std::path::Path) -> Invocation {
    tool(config, &config.tools.git)
        .arg("-C")
        .arg(repo.display().to_string())
}

/// The notification commands, in order.
pub fn notification_invocations(config: &PublishConfig, layout: &ReleaseLayout) -> Vec<Invocation> {
    let repo = &layout.notifications_repo;
    vec![
        git(config, &layout.pull_repo).arg("pull"),
        tool(config, &config.tools.mono)
            .arg(layout.util_exe.display().to_string())
            .arg("-notify"),
        git(config, repo).args(["add", "-A"]),
        git(config, repo)
            .args(["commit", "-m"])
            .arg(config.notification.commit_message.clone()),
        git(config, repo).arg("push"),
    ]
}

impl Stage for PublishNotificationStage {
    fn id(&self) -> StageId {
        StageId::PublishNotification
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        ctx.run_all(&notification_invocations(ctx.config, ctx.layout))?;
        Ok(StageOutcome::done())
    }

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan {
        StagePlan::commands(&notification_invocations(config, layout))
    }
}
