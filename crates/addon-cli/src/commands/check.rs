//! The `check` command.

use std::path::Path;

use addon_check::{CatalogConfig, CheckContext, CheckerConfig, check_path};
use addon_repo::fetch::BRANCH_PLACEHOLDER;
use addon_repo::{
    BranchSnapshots, CatalogSource, DirectoryCatalogSource, HttpCatalogSource, fetch_snapshots,
};

use super::load_config;
use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use crate::output::{self, Outcome};

/// Run the check command. Returns whether the run found no problems.
pub fn run_check(args: &CheckArgs, config_path: Option<&Path>) -> Result<bool> {
    let root = args.dirs.first().map_or(Path::new("."), |dir| dir.as_path());
    let mut config = load_config(root, config_path)?;
    apply_flags(&mut config, args);

    // Fail on a bad branch before any catalog is fetched.
    config.branches.branch(&args.branch)?;
    for dir in &args.dirs {
        if !dir.is_dir() {
            return Err(CliError::user(format!("Not a directory: {}", dir.display())));
        }
    }

    let snapshots = load_snapshots(&config)?;
    let ctx = CheckContext::new(config, &args.branch, snapshots)?
        .with_review_mode(args.pr)
        .with_folder_id_mismatch_allowed(args.allow_folder_id_mismatch);

    let reports = args
        .dirs
        .iter()
        .map(|dir| check_path(dir, &ctx))
        .collect::<addon_check::Result<Vec<_>>>()?;
    let outcome = Outcome::new(ctx.target.name(), args.pr, reports);

    let mut out = std::io::stdout().lock();
    if args.json {
        output::write_json(&mut out, &outcome)?;
    } else {
        output::write_text(&mut out, &outcome)?;
    }
    Ok(!outcome.has_problems())
}

/// Command-line flags win over every config layer.
fn apply_flags(config: &mut CheckerConfig, args: &CheckArgs) {
    if let Some(url) = &args.catalog_url {
        config.catalog.url_template = Some(url.clone());
        config.catalog.directory = None;
    }
    if let Some(dir) = &args.catalog_dir {
        config.catalog.directory = Some(dir.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = usize::from(workers);
    }
}

/// The configured catalog source; a directory wins over a URL.
fn catalog_source(catalog: &CatalogConfig) -> Result<Option<Box<dyn CatalogSource>>> {
    if let Some(dir) = &catalog.directory {
        if !dir.is_dir() {
            return Err(CliError::user(format!(
                "Catalog directory not found: {}",
                dir.display()
            )));
        }
        return Ok(Some(Box::new(DirectoryCatalogSource::new(dir.clone()))));
    }
    if let Some(template) = &catalog.url_template {
        if !template.contains(BRANCH_PLACEHOLDER) {
            return Err(CliError::user(format!(
                "Catalog URL must contain {BRANCH_PLACEHOLDER}: {template}"
            )));
        }
        let source = HttpCatalogSource::new(template.clone(), catalog.http_settings())?;
        return Ok(Some(Box::new(source)));
    }
    Ok(None)
}

fn load_snapshots(config: &CheckerConfig) -> Result<BranchSnapshots> {
    match catalog_source(&config.catalog)? {
        Some(source) => Ok(fetch_snapshots(source.as_ref(), &config.branches)),
        None => {
            tracing::warn!("No catalog source configured; every branch catalog is unavailable");
            Ok(BranchSnapshots::new())
        }
    }
}
