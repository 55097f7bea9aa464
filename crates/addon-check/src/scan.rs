//! Running every check on an add-on directory or a whole repository.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use addon_meta::{Addon, BranchVersion, MANIFEST_FILENAME, ManifestDocument};
use addon_repo::{BranchSnapshots, RepositorySnapshot};
use rayon::prelude::*;

use crate::branches::check_existing_addon;
use crate::config::CheckerConfig;
use crate::cycles::check_circular_dependencies;
use crate::dependencies::{check_extension_requirements, resolve_dependencies};
use crate::diagnostic::{Diagnostic, Report};
use crate::error::Result;
use crate::manifest_checks::{check_folder_matches_id, check_version_format};
use crate::rdepends::check_reverse_dependencies;

/// Everything a check run shares across add-ons. Read-only once built.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Tables and tunables
    pub config: CheckerConfig,
    /// Branch the add-ons are submitted to
    pub target: BranchVersion,
    /// Catalog of every configured branch
    pub snapshots: BranchSnapshots,
    /// Stricter thresholds for pull request review
    pub review_mode: bool,
    /// Skip the folder name check
    pub allow_folder_id_mismatch: bool,
}

impl CheckContext {
    /// Create a context for `target_branch`.
    ///
    /// Branches of the config without a snapshot get an unavailable one.
    ///
    /// # Errors
    ///
    /// Fails when `target_branch` is not in the configured branch list.
    pub fn new(
        config: CheckerConfig,
        target_branch: &str,
        mut snapshots: BranchSnapshots,
    ) -> Result<Self> {
        let target = config.branches.branch(target_branch)?;
        for branch in config.branches.iter() {
            snapshots
                .entry(branch.clone())
                .or_insert_with(|| RepositorySnapshot::unavailable(branch));
        }
        Ok(Self {
            config,
            target,
            snapshots,
            review_mode: false,
            allow_folder_id_mismatch: false,
        })
    }

    /// Enable or disable review mode.
    pub fn with_review_mode(mut self, review_mode: bool) -> Self {
        self.review_mode = review_mode;
        self
    }

    /// Enable or disable the folder name check.
    pub fn with_folder_id_mismatch_allowed(mut self, allowed: bool) -> Self {
        self.allow_folder_id_mismatch = allowed;
        self
    }

    /// The catalog of the target branch.
    pub fn target_snapshot(&self) -> Option<&RepositorySnapshot> {
        self.snapshots.get(&self.target)
    }
}

/// Run every check on a parsed manifest.
///
/// # Errors
///
/// Fails when the manifest has no id.
pub fn check_manifest(manifest: &ManifestDocument, ctx: &CheckContext) -> Result<Vec<Diagnostic>> {
    let addon = Addon::from_manifest(manifest)?;
    let mut diagnostics = vec![Diagnostic::information(format!(
        "Checking add-on {}",
        addon.id
    ))];

    diagnostics.extend(check_version_format(manifest));
    if addon.version.is_some() {
        diagnostics.extend(check_existing_addon(
            &addon,
            &ctx.target,
            &ctx.snapshots,
            ctx.review_mode,
            &ctx.config.compatibility,
        ));
    }

    if manifest.is_broken() {
        diagnostics.push(Diagnostic::information(
            "Addon marked as broken - skipping dependency checks",
        ));
        return Ok(diagnostics);
    }

    let unavailable;
    let snapshot = match ctx.target_snapshot() {
        Some(snapshot) => snapshot,
        None => {
            unavailable = RepositorySnapshot::unavailable(ctx.target.clone());
            &unavailable
        }
    };
    let ignore = ctx.config.ignore.ignore_set_for(&ctx.target);

    diagnostics.extend(resolve_dependencies(
        &addon,
        snapshot,
        ctx.review_mode,
        &ignore,
        &ctx.config.compatibility,
        &ctx.target,
    ));
    diagnostics.extend(check_extension_requirements(
        &addon,
        &manifest.extension_points(),
        &ctx.config.extension_requirements,
    ));
    diagnostics.push(check_reverse_dependencies(
        &addon.id,
        &ctx.target,
        &ctx.snapshots,
        &ctx.config.library_prefix,
    ));
    diagnostics.extend(check_circular_dependencies(&addon, snapshot));

    Ok(diagnostics)
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check the add-on in `addon_dir`. Never fails: unreadable or malformed
/// manifests are reported as problems.
pub fn check_addon_dir(addon_dir: &Path, ctx: &CheckContext) -> Report {
    let mut report = Report::new(folder_name(addon_dir));

    let manifest = match ManifestDocument::from_dir(addon_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            report.push(Diagnostic::problem(e.to_string()));
            return report;
        }
    };

    match check_manifest(&manifest, ctx) {
        Ok(diagnostics) => report.extend(diagnostics),
        Err(e) => {
            report.push(Diagnostic::problem(e.to_string()));
            return report;
        }
    }

    if !ctx.allow_folder_id_mismatch
        && let Some(id) = manifest.id.as_deref()
    {
        report.extend(check_folder_matches_id(addon_dir, id.trim()));
    }

    tracing::debug!(
        addon = %report.artifact,
        problems = report.problem_count(),
        warnings = report.warning_count(),
        "Checked add-on"
    );
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}

/// [`check_addon_dir`], with any panic turned into a problem on that add-on.
fn check_addon_dir_isolated(addon_dir: &Path, ctx: &CheckContext) -> Report {
    panic::catch_unwind(AssertUnwindSafe(|| check_addon_dir(addon_dir, ctx))).unwrap_or_else(
        |payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(addon = %addon_dir.display(), error = %message, "Add-on check failed");
            let mut report = Report::new(folder_name(addon_dir));
            report.push(Diagnostic::problem(format!(
                "Something went wrong. Please see: {message}"
            )));
            report
        },
    )
}

/// Non-hidden subdirectories of `repo_dir`, sorted by name.
pub fn addon_dirs(repo_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(repo_dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Check every add-on directory of a repository on a pool of
/// `ctx.config.workers` threads.
///
/// Child reports keep directory order. A failing add-on never affects its
/// siblings.
pub fn check_repository(repo_dir: &Path, ctx: &CheckContext) -> Result<Report> {
    let dirs = addon_dirs(repo_dir)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.config.workers.max(1))
        .build()?;

    tracing::info!(
        repository = %repo_dir.display(),
        addons = dirs.len(),
        workers = ctx.config.workers,
        "Checking repository"
    );

    let children: Vec<Report> = pool.install(|| {
        dirs.par_iter()
            .map(|dir| check_addon_dir_isolated(dir, ctx))
            .collect()
    });

    let mut report = Report::new(repo_dir.display().to_string());
    report.push(Diagnostic::information(format!(
        "Checking repository {}",
        repo_dir.display()
    )));
    for child in children {
        report.add_child(child);
    }
    Ok(report)
}

/// Check `path` as a single add-on when it holds a manifest, otherwise as a
/// repository of add-ons.
pub fn check_path(path: &Path, ctx: &CheckContext) -> Result<Report> {
    if path.join(MANIFEST_FILENAME).is_file() {
        Ok(check_addon_dir_isolated(path, ctx))
    } else {
        check_repository(path, ctx)
    }
}
