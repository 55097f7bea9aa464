//! Add-on checker CLI
//!
//! Checks add-on submissions against the published catalogs of every
//! branch and exits non-zero when a problem is found.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded without problems.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;
    tracing::debug!("Verbose mode enabled");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Check(args) => commands::run_check(&args, config_path),
        Commands::Branches { json } => {
            let cwd = std::env::current_dir()?;
            commands::run_branches(&cwd, config_path, json)?;
            Ok(true)
        }
    }
}
