//! Release orchestration.
//!
//! Stages run strictly in order. The first failure stops the run: later
//! stages are reported as `not_run` and nothing already done is reverted.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::layout::{self, ReleaseLayout};
use crate::process::ProcessRunner;
use crate::stages::{self, Confirmation, Stage, StageContext, StageId, StageOutcome, StagePlan};
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
    NotRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub id: StageId,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    fn not_run(id: StageId) -> Self {
        Self {
            id,
            status: StageStatus::NotRun,
            started_at: None,
            duration_ms: None,
            data: None,
            reason: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunSummary {
    pub total_stages: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunResult {
    pub version: String,
    pub package_name: String,
    pub stages: Vec<StageResult>,
    pub summary: PipelineRunSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
    pub id: StageId,
    pub label: &'static str,
    #[serde(flatten)]
    pub plan: StagePlan,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    pub version: String,
    pub package_name: String,
    pub archive_name: String,
    pub stages: Vec<PlannedStage>,
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The full release sequence.
    pub fn release() -> Self {
        Self::new(stages::default_stages())
    }

    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id()).collect()
    }

    pub fn plan(&self, config: &PublishConfig, layout: &ReleaseLayout) -> PipelinePlan {
        PipelinePlan {
            version: layout.version.to_string(),
            package_name: layout.package_name.clone(),
            archive_name: layout.archive_name.clone(),
            stages: self
                .stages
                .iter()
                .map(|stage| PlannedStage {
                    id: stage.id(),
                    label: stage.id().label(),
                    plan: stage.plan(config, layout),
                })
                .collect(),
        }
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// On failure the returned error carries the failing stage id and the
    /// per-stage results under `details.stage` / `details.stages`.
    pub fn run(&self, ctx: &mut StageContext<'_>) -> Result<PipelineRunResult> {
        let mut results: Vec<StageResult> = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let id = stage.id();
            log_status!("stage", "{}", id.label());

            let started_at = Utc::now();
            let outcome = stage.run(ctx);
            let duration_ms = Some((Utc::now() - started_at).num_milliseconds());

            let mut result = StageResult {
                id,
                status: StageStatus::Success,
                started_at: Some(started_at.to_rfc3339()),
                duration_ms,
                data: None,
                reason: None,
                error: None,
            };

            match outcome {
                Ok(StageOutcome::Completed(data)) => {
                    result.data = data;
                    results.push(result);
                }
                Ok(StageOutcome::Skipped(reason)) => {
                    log_status!("stage", "{} skipped: {}", id, reason);
                    result.status = StageStatus::Skipped;
                    result.reason = Some(reason);
                    results.push(result);
                }
                Err(err) => {
                    log_status!("stage", "{} failed: {}", id, err.message);
                    result.status = StageStatus::Failed;
                    result.error = Some(err.message.clone());
                    results.push(result);
                    results.extend(
                        self.stages[index + 1..]
                            .iter()
                            .map(|s| StageResult::not_run(s.id())),
                    );
                    return Err(attach_results(err, id, &results));
                }
            }
        }

        let summary = build_summary(&results);
        Ok(PipelineRunResult {
            version: ctx.layout.version.to_string(),
            package_name: ctx.layout.package_name.clone(),
            stages: results,
            summary,
        })
    }
}

fn attach_results(mut err: Error, failed: StageId, results: &[StageResult]) -> Error {
    if !err.details.is_object() {
        err.details = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(map) = &mut err.details {
        map.insert("stage".to_string(), Value::String(failed.to_string()));
        if let Ok(stages) = serde_json::to_value(results) {
            map.insert("stages".to_string(), stages);
        }
    }
    err
}

pub fn build_summary(results: &[StageResult]) -> PipelineRunSummary {
    let count = |status: StageStatus| results.iter().filter(|r| r.status == status).count();
    PipelineRunSummary {
        total_stages: results.len(),
        succeeded: count(StageStatus::Success),
        failed: count(StageStatus::Failed),
        skipped: count(StageStatus::Skipped),
        not_run: count(StageStatus::NotRun),
    }
}

/// Resolve the version and every release path for `config`.
pub fn resolve_layout(config: &PublishConfig) -> Result<ReleaseLayout> {
    let version_file = layout::version_file(config)?;
    let version = version::resolve_version(&version_file, &config.version)?;
    ReleaseLayout::resolve(config, version)
}

/// Run the full release for `config`.
pub fn run_release(
    config: &PublishConfig,
    runner: &dyn ProcessRunner,
    confirmation: &dyn Confirmation,
) -> Result<PipelineRunResult> {
    let layout = resolve_layout(config)?;
    log_status!(
        "release",
        "{} -> {}",
        layout.package_name,
        layout.version_root.display()
    );

    let mut ctx = StageContext {
        config,
        layout: &layout,
        runner,
        confirmation,
    };
    Pipeline::release().run(&mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{layout_at, RecordingRunner};
    use crate::stages::AutoConfirm;
    use tempfile::TempDir;

    struct FakeStage {
        id: StageId,
        outcome: fn() -> Result<StageOutcome>,
    }

    impl FakeStage {
        fn boxed(id: StageId, outcome: fn() -> Result<StageOutcome>) -> Box<dyn Stage> {
            Box::new(Self { id, outcome })
        }
    }

    impl Stage for FakeStage {
        fn id(&self) -> StageId {
            self.id
        }

        fn run(&self, _ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
            (self.outcome)()
        }

        fn plan(&self, _config: &PublishConfig, _layout: &ReleaseLayout) -> StagePlan {
            StagePlan::default()
        }
    }

    fn ok() -> Result<StageOutcome> {
        Ok(StageOutcome::done())
    }

    fn skip() -> Result<StageOutcome> {
        Ok(StageOutcome::Skipped("not configured".to_string()))
    }

    fn fail() -> Result<StageOutcome> {
        Err(Error::internal_io("disk full", None))
    }

    fn run_pipeline(pipeline: &Pipeline) -> Result<PipelineRunResult> {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());
        let runner = RecordingRunner::default();
        let mut ctx = StageContext {
            config: &config,
            layout: &layout,
            runner: &runner,
            confirmation: &AutoConfirm,
        };
        pipeline.run(&mut ctx)
    }

    #[test]
    fn all_stages_succeed() {
        let pipeline = Pipeline::new(vec![
            FakeStage::boxed(StageId::Build, ok),
            FakeStage::boxed(StageId::RunTests, skip),
            FakeStage::boxed(StageId::Done, ok),
        ]);

        let result = run_pipeline(&pipeline).unwrap();
        assert_eq!(result.package_name, "Mtgdb.Gui.v2.0.0.1");
        assert_eq!(result.summary.total_stages, 3);
        assert_eq!(result.summary.succeeded, 2);
        assert_eq!(result.summary.skipped, 1);
        assert_eq!(result.stages[1].reason.as_deref(), Some("not configured"));
    }

    #[test]
    fn first_failure_stops_the_run() {
        let pipeline = Pipeline::new(vec![
            FakeStage::boxed(StageId::Build, ok),
            FakeStage::boxed(StageId::SignBinaries, fail),
            FakeStage::boxed(StageId::PackagePrimary, ok),
            FakeStage::boxed(StageId::Done, ok),
        ]);

        let err = run_pipeline(&pipeline).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["stage"], "sign_binaries");

        let statuses: Vec<&str> = err.details["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["success", "failed", "not_run", "not_run"]);
    }

    #[test]
    fn plan_lists_every_stage_with_labels() {
        let dir = TempDir::new().unwrap();
        let (config, layout) = layout_at(dir.path());

        let plan = Pipeline::release().plan(&config, &layout);
        assert_eq!(plan.stages.len(), 15);
        assert_eq!(plan.archive_name, "Mtgdb.Gui.v2.0.0.1.zip");
        assert_eq!(plan.stages[0].label, "build");
        assert!(plan.stages[4].plan.commands[0].starts_with("7z a "));
        assert!(plan.stages[8].plan.skipped.is_some());
    }

    #[test]
    fn summary_counts_statuses() {
        let results = vec![
            StageResult::not_run(StageId::Build),
            StageResult::not_run(StageId::Done),
        ];
        let summary = build_summary(&results);
        assert_eq!(summary.not_run, 2);
        assert_eq!(summary.succeeded, 0);
    }
}
