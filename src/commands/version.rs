use clap::Args;
use serde::Serialize;

use mtgdb_release::layout;
use mtgdb_release::version::resolve_version;

use super::{CmdResult, ConfigFileArg};

#[derive(Args)]
pub struct VersionArgs {
    #[command(flatten)]
    config: ConfigFileArg,
}

#[derive(Serialize)]
pub struct VersionOutput {
    command: &'static str,
    version: String,
    package_name: String,
    archive_name: String,
    source: String,
}

pub fn run(args: VersionArgs) -> CmdResult<VersionOutput> {
    let (config, _) = args.config.load()?;
    let source = layout::version_file(&config)?;
    let version = resolve_version(&source, &config.version)?;

    Ok((
        VersionOutput {
            command: "version.show",
            package_name: layout::package_name(&config.app_name, &version),
            archive_name: layout::archive_name(&config.app_name, &version),
            version: version.to_string(),
            source: source.display().to_string(),
        },
        0,
    ))
}
