use clap::Args;
use serde::Serialize;

use mtgdb_release::config::ConfigSource;
use mtgdb_release::pipeline::{self, Pipeline, PipelinePlan};

use super::{CmdResult, ConfigFileArg};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    config: ConfigFileArg,
}

#[derive(Serialize)]
pub struct PlanOutput {
    command: &'static str,
    config_source: ConfigSource,
    #[serde(flatten)]
    plan: PipelinePlan,
}

/// Resolve the version and show every stage without executing anything.
pub fn run(args: PlanArgs) -> CmdResult<PlanOutput> {
    let (config, config_source) = args.config.load()?;
    let layout = pipeline::resolve_layout(&config)?;

    Ok((
        PlanOutput {
            command: "release.plan",
            config_source,
            plan: Pipeline::release().plan(&config, &layout),
        },
        0,
    ))
}
