use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{config_cmd, plan, run, version};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "mtgdb-release")]
#[command(version = VERSION)]
#[command(about = "Assemble, sign, archive and publish a Mtgdb.Gui release")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full release pipeline
    Run(run::RunArgs),
    /// Show the release stages and what each one touches, without running them
    Plan(plan::PlanArgs),
    /// Show the version read from the solution metadata
    Version(version::VersionArgs),
    /// Inspect release configuration
    Config(config_cmd::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
