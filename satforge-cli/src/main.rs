//! Satforge CLI - Command-line interface
//!
//! Drives the production controller against the built-in backend and
//! validates configuration files.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::{check, run};

#[derive(Parser)]
#[command(
    name = "satforge",
    version = satforge::VERSION,
    about = "Event-driven satellite imagery production controller"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the production controller until stopped.
    Run(run::RunArgs),
    /// Validate configuration files and print the effective production set.
    Check(check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run::run(args),
        Command::Check(args) => check::run(args),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
