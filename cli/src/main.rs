mod commands;
mod loader;
mod terminal;

use std::process::ExitCode;

use bootnet_common::config::Config;
use commands::{CommandLine, Commands, check, compile};
use terminal::logging;
use tracing::error;

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    let pretty = matches!(commands.command, Commands::Compile { pretty: true, .. });
    let cfg = Config {
        pretty,
        verbose: commands.verbose,
    };
    logging::init_logging(&cfg);

    let result = match commands.command {
        Commands::Compile { path, .. } => compile::compile(&path, &cfg),
        Commands::Check { path } => check::check(&path),
    };

    // A failed compilation leaves the host without managed networking.
    // Nothing is written to stdout in that case.
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
