//! Pipeline stages.
//!
//! Each stage is one step of the release with its own outcome. Stages receive
//! everything they touch through [`StageContext`]: configuration, the resolved
//! release layout, the process runner and the operator confirmation port.

pub mod assemble;
pub mod build;
pub mod confirm;
pub mod distribute;
pub mod launch;
pub mod notify;
pub mod package;
pub mod sign;
pub mod test_suite;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::PublishConfig;
use crate::error::Result;
use crate::layout::ReleaseLayout;
use crate::process::{Invocation, ProcessRunner};

pub use confirm::{AutoConfirm, Confirmation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Build,
    AssembleTree,
    PatchShortcut,
    SignBinaries,
    PackagePrimary,
    SignArchive,
    PublishTest,
    LaunchInstalledApp,
    RunTests,
    AwaitConfirmation,
    PublishNotification,
    PublishProduction,
    PackageLight,
    PublishLight,
    Done,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Build => "build",
            StageId::AssembleTree => "assemble_tree",
            StageId::PatchShortcut => "patch_shortcut",
            StageId::SignBinaries => "sign_binaries",
            StageId::PackagePrimary => "package_primary",
            StageId::SignArchive => "sign_archive",
            StageId::PublishTest => "publish_test",
            StageId::LaunchInstalledApp => "launch_installed_app",
            StageId::RunTests => "run_tests",
            StageId::AwaitConfirmation => "await_confirmation",
            StageId::PublishNotification => "publish_notification",
            StageId::PublishProduction => "publish_production",
            StageId::PackageLight => "package_light",
            StageId::PublishLight => "publish_light",
            StageId::Done => "done",
        }
    }

    /// Human-readable banner text.
    pub fn label(&self) -> &'static str {
        match self {
            StageId::Build => "build",
            StageId::AssembleTree => "create publish directory and copy files",
            StageId::PatchShortcut => "make shortcut",
            StageId::SignBinaries => "sign binary files",
            StageId::PackagePrimary => "create LZMA-compressed zip",
            StageId::SignArchive => "sign zip",
            StageId::PublishTest => "publish zip to test update channel",
            StageId::LaunchInstalledApp => "run installed app",
            StageId::RunTests => "run tests",
            StageId::AwaitConfirmation => "await operator confirmation",
            StageId::PublishNotification => "publish update notification",
            StageId::PublishProduction => "publish zip to production update channel",
            StageId::PackageLight => "create deflate-compressed zip",
            StageId::PublishLight => "upload deflate-compressed zip",
            StageId::Done => "done",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a stage that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Completed(Option<serde_json::Value>),
    Skipped(String),
}

impl StageOutcome {
    pub fn done() -> Self {
        StageOutcome::Completed(None)
    }

    pub fn with_data<T: Serialize>(data: T) -> Self {
        StageOutcome::Completed(serde_json::to_value(data).ok())
    }
}

pub struct StageContext<'a> {
    pub config: &'a PublishConfig,
    pub layout: &'a ReleaseLayout,
    pub runner: &'a dyn ProcessRunner,
    pub confirmation: &'a dyn Confirmation,
}

impl StageContext<'_> {
    pub fn run(&self, invocation: &Invocation) -> Result<()> {
        self.runner.run(invocation)
    }

    pub fn run_all(&self, invocations: &[Invocation]) -> Result<()> {
        for invocation in invocations {
            self.run(invocation)?;
        }
        Ok(())
    }
}

/// What a stage would do, for `plan`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StagePlan {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl StagePlan {
    pub fn commands(invocations: &[Invocation]) -> Self {
        Self {
            commands: invocations.iter().map(Invocation::display).collect(),
            ..Self::default()
        }
    }

    pub fn path(mut self, path: &std::path::Path) -> Self {
        self.paths.push(path.display().to_string());
        self
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }
}

pub trait Stage {
    fn id(&self) -> StageId;

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome>;

    fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> StagePlan;
}

/// An invocation of `program` bounded by the configured timeout.
pub fn tool(config: &PublishConfig, program: &str) -> Invocation {
    Invocation::new(program).timeout(Duration::from_secs(config.timeout_secs))
}

/// The release stages in execution order.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(build::BuildStage),
        Box::new(assemble::AssembleTreeStage),
        Box::new(assemble::PatchShortcutStage),
        Box::new(sign::SignBinariesStage),
        Box::new(package::PackagePrimaryStage),
        Box::new(sign::SignArchiveStage),
        Box::new(distribute::PublishArchiveStage::test()),
        Box::new(launch::LaunchInstalledAppStage),
        Box::new(test_suite::RunTestsStage),
        Box::new(confirm::AwaitConfirmationStage),
        Box::new(notify::PublishNotificationStage),
        Box::new(distribute::PublishArchiveStage::production()),
        Box::new(package::PackageLightStage),
        Box::new(distribute::PublishLightStage),
        Box::new(DoneStage),
    ]
}

/// Terminal stage: reports where the release artifacts ended up.
pub struct DoneStage;

#[derive(Debug, Serialize)]
struct ReleaseSummary<'a> {
    version: &'a str,
    archive: String,
    light_archive: String,
}

impl Stage for DoneStage {
    fn id(&self) -> StageId {
        StageId::Done
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        log_status!(
            "release",
            "{} published",
            ctx.layout.package_name
        );
        Ok(StageOutcome::with_data(ReleaseSummary {
            version: ctx.layout.version.as_str(),
            archive: ctx.layout.archive.display().to_string(),
            light_archive: ctx.layout.light_archive.display().to_string(),
        }))
    }

    fn plan(&self, _config: &PublishConfig, _layout: &ReleaseLayout) -> StagePlan {
        StagePlan::default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fakes for stage tests.

    use super::*;
    use crate::config::PublishConfig;
    use crate::version::Version;
    use std::cell::RefCell;
    use std::path::Path;

    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<Invocation>>,
        pub launched: RefCell<Vec<Invocation>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(())
        }

        fn launch(&self, invocation: &Invocation) -> Result<()> {
            self.launched.borrow_mut().push(invocation.clone());
            Ok(())
        }
    }

    pub fn layout_at(root: &Path) -> (PublishConfig, ReleaseLayout) {
        let mut config = PublishConfig::default();
        config.packaged_root = root.join("packaged");
        config.channels.test = root.join("channels/test");
        config.channels.production = root.join("channels/release");
        config.channels.light = root.join("channels/deflate");
        config.tools.util_exe = Some(root.join("util/Mtgdb.Util.exe"));
        let layout = ReleaseLayout::resolve_at(
            &config,
            Version::parse("2.0.0.1").unwrap(),
            &root.join("repo"),
        )
        .unwrap();
        (config, layout)
    }

    pub fn run_stage(
        stage: &dyn Stage,
        config: &PublishConfig,
        layout: &ReleaseLayout,
        runner: &RecordingRunner,
    ) -> Result<StageOutcome> {
        let mut ctx = StageContext {
            config,
            layout,
            runner,
            confirmation: &AutoConfirm,
        };
        stage.run(&mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_run_in_release_order() {
        let ids: Vec<StageId> = default_stages().iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec![
                StageId::Build,
                StageId::AssembleTree,
                StageId::PatchShortcut,
                StageId::SignBinaries,
                StageId::PackagePrimary,
                StageId::SignArchive,
                StageId::PublishTest,
                StageId::LaunchInstalledApp,
                StageId::RunTests,
                StageId::AwaitConfirmation,
                StageId::PublishNotification,
                StageId::PublishProduction,
                StageId::PackageLight,
                StageId::PublishLight,
                StageId::Done,
            ]
        );
    }

    #[test]
    fn stage_ids_serialize_as_snake_case() {
        let json = serde_json::to_string(&StageId::PublishNotification).unwrap();
        assert_eq!(json, "\"publish_notification\"");
        assert_eq!(StageId::PublishNotification.as_str(), "publish_notification");
    }
}
