//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Add-on checker - dependency and version compatibility checks for a
/// multi-branch add-on repository
#[derive(Parser, Debug)]
#[command(name = "addon-checker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Configuration file applied on top of the global and repository config
    #[arg(long, global = true, value_name = "FILE", env = "ADDON_CHECKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check add-on directories or repositories
    ///
    /// A directory containing addon.toml is checked as one add-on; any
    /// other directory is checked as a repository of add-ons.
    ///
    /// Examples:
    ///   addon-checker check plugin.video.example --branch matrix
    ///   addon-checker check . --branch nexus --pr --catalog-dir ./catalogs
    ///   addon-checker check repo/ --branch leia --json
    Check(CheckArgs),

    /// List the configured branches, oldest first
    Branches {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of the `check` command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    /// Add-on or repository directories
    #[arg(value_name = "DIR", default_value = ".")]
    pub dirs: Vec<PathBuf>,

    /// Branch the add-ons are submitted to
    #[arg(short, long, value_name = "CODENAME")]
    pub branch: String,

    /// Review a pull request (stricter version rules)
    #[arg(long)]
    pub pr: bool,

    /// Do not require the folder name to match the add-on id
    #[arg(long)]
    pub allow_folder_id_mismatch: bool,

    /// Output as JSON for CI/CD integration
    #[arg(long)]
    pub json: bool,

    /// Read catalogs from <DIR>/<branch>.json[.gz]; wins over --catalog-url
    #[arg(long, value_name = "DIR")]
    pub catalog_dir: Option<PathBuf>,

    /// Fetch catalogs from a URL with a {branch} placeholder
    #[arg(long, value_name = "TEMPLATE", env = "ADDON_CHECKER_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Worker threads for repository scans
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,
}
