use clap::Args;
use serde::Serialize;

use mtgdb_release::config::ConfigSource;
use mtgdb_release::pipeline::{self, PipelineRunResult};
use mtgdb_release::stages::{AutoConfirm, Confirmation};
use mtgdb_release::{Error, SystemProcessRunner};

use super::{CmdResult, ConfigFileArg};
use crate::tty::{self, TtyConfirmation};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    config: ConfigFileArg,

    /// Skip the confirmation prompt before the production publish
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Serialize)]
pub struct RunOutput {
    command: &'static str,
    config_source: ConfigSource,
    #[serde(flatten)]
    result: PipelineRunResult,
}

pub fn run(args: RunArgs) -> CmdResult<RunOutput> {
    let (config, config_source) = args.config.load()?;

    if !args.yes && !tty::is_stdin_tty() {
        return Err(Error::operator_cancelled("await_confirmation")
            .with_hint("stdin is not a terminal; pass --yes for unattended releases"));
    }

    let confirmation: &dyn Confirmation = if args.yes {
        &AutoConfirm
    } else {
        &TtyConfirmation
    };

    tty::status("mtgdb-release: starting release");
    let result = pipeline::run_release(&config, &SystemProcessRunner::new(), confirmation)?;

    Ok((
        RunOutput {
            command: "release.run",
            config_source,
            result,
        },
        0,
    ))
}
