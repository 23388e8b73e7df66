pub mod check;
pub mod compile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bootnet")]
#[command(about = "Compiles a boot-time network configuration into an ordered plan.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a network document and print the resulting plan as JSON
    #[command(alias = "c")]
    Compile {
        /// Path to a `.toml` or `.json` network document
        path: PathBuf,
        /// Pretty-print the plan
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a network document and summarize it without emitting a plan
    #[command(alias = "k")]
    Check { path: PathBuf },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
