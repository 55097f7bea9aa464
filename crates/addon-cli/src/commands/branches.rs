//! The `branches` command.

use std::io::Write;
use std::path::Path;

use colored::Colorize;

use super::load_config;
use crate::error::Result;

/// Print the configured branches, oldest first.
pub fn run_branches(root: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(root, config_path)?;
    let names = config.branches.names();
    let mut out = std::io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &names)?;
        writeln!(out)?;
        return Ok(());
    }

    for (index, name) in names.iter().enumerate() {
        writeln!(out, "{:>2}  {}", index + 1, name.bold())?;
    }
    Ok(())
}
