use clap::Args;
use std::path::PathBuf;

use mtgdb_release::config::{self, ConfigSource, PublishConfig};

pub type CmdResult<T> = mtgdb_release::Result<(T, i32)>;

/// `--config` shared by every command that needs a release config.
#[derive(Args, Debug, Default)]
pub struct ConfigFileArg {
    /// Release config file (default: $MTGDB_RELEASE_CONFIG or ~/.config/mtgdb-release/release.json)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigFileArg {
    pub fn load(&self) -> mtgdb_release::Result<(PublishConfig, ConfigSource)> {
        config::load(self.config.as_deref())
    }
}

pub mod config_cmd;
pub mod plan;
pub mod run;
pub mod version;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (mtgdb_release::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, run),
        crate::Commands::Plan(args) => dispatch!(args, plan),
        crate::Commands::Version(args) => dispatch!(args, version),
        crate::Commands::Config(args) => dispatch!(args, config_cmd),
    }
}
