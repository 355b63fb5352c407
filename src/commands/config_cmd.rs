use clap::{Args, Subcommand};
use serde::Serialize;

use mtgdb_release::config::{ConfigSource, PublishConfig};
use mtgdb_release::paths;

use super::{CmdResult, ConfigFileArg};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration
    Show {
        #[command(flatten)]
        config: ConfigFileArg,

        /// Show only built-in defaults (ignore config files)
        #[arg(long)]
        builtin: bool,
    },
    /// Show the path of the default release.json
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<ConfigSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PublishConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

pub fn run(args: ConfigArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { config, builtin } => show(&config, builtin),
        ConfigCommand::Path => path(),
    }
}

fn show(arg: &ConfigFileArg, builtin: bool) -> CmdResult<ConfigOutput> {
    let (config, source) = if builtin {
        (PublishConfig::default(), ConfigSource::BuiltinDefaults)
    } else {
        arg.load()?
    };

    Ok((
        ConfigOutput {
            command: "config.show",
            source: Some(source),
            config: Some(config),
            path: None,
            exists: None,
        },
        0,
    ))
}

fn path() -> CmdResult<ConfigOutput> {
    let path = paths::default_config_file()?;
    Ok((
        ConfigOutput {
            command: "config.path",
            source: None,
            config: None,
            exists: Some(path.exists()),
            path: Some(path.display().to_string()),
        },
        0,
    ))
}
