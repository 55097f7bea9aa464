//! Command implementations for addon-cli

pub mod branches;
pub mod check;

pub use branches::run_branches;
pub use check::run_check;

use std::path::Path;

use addon_check::{CheckerConfig, ConfigResolver};

use crate::error::Result;

/// Resolve the configuration for `root`, then apply `config_path` on top.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<CheckerConfig> {
    let mut config = ConfigResolver::new(root).resolve()?;
    if let Some(path) = config_path {
        tracing::debug!(?path, "Loading explicit config");
        config.apply_file(path)?;
        config.warn_unknown_branches();
    }
    Ok(config)
}
