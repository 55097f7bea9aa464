//! Version monotonicity of a submission across branches.
//!
//! Branches form one upgrade path. A submission must be newer than what
//! older branches publish, so their users receive it as an update, and
//! older than what newer branches publish whenever a dependency's ABI
//! changes between the target branch and the newer one.

use addon_meta::{Addon, AddonVersion, BranchVersion};
use addon_repo::BranchSnapshots;

use crate::compat::CompatibilityTable;
use crate::diagnostic::{Diagnostic, Severity};

/// Compare `addon` with every published copy of it, newest branch first.
pub fn check_existing_addon(
    addon: &Addon,
    target: &BranchVersion,
    snapshots: &BranchSnapshots,
    review_mode: bool,
    compatibility: &CompatibilityTable,
) -> Vec<Diagnostic> {
    let Some(version) = addon.version.as_ref() else {
        return vec![Diagnostic::problem(format!(
            "{} has no version and cannot be compared with published versions",
            addon.id
        ))];
    };

    let mut diagnostics = Vec::new();
    let mut is_new = true;

    for (branch, snapshot) in snapshots.iter().rev() {
        let Some(published) = snapshot.find(&addon.id) else {
            continue;
        };
        let published_version = published.version.as_ref();

        if branch <= target {
            is_new = false;
            diagnostics.extend(check_update_path(
                addon,
                version,
                published_version,
                branch,
                review_mode,
            ));
        } else if !compatibility.is_forward_compatible(&addon.dependencies, target, branch) {
            is_new = false;
            diagnostics.extend(check_migration_path(
                addon,
                version,
                published_version,
                branch,
                review_mode,
            ));
        }
    }

    if is_new {
        diagnostics.push(Diagnostic::information("This is a new addon."));
    }
    diagnostics
}

/// The submission must supersede the copy on an older or equal branch.
fn check_update_path(
    addon: &Addon,
    version: &AddonVersion,
    published: Option<&AddonVersion>,
    branch: &BranchVersion,
    review_mode: bool,
) -> Option<Diagnostic> {
    let submitted = Some(version);
    let acceptable = submitted > published || (submitted == published && !review_mode);
    let published = label(published);

    if !acceptable {
        Some(Diagnostic::problem(format!(
            "{} addon already exists with a higher or equal version: {published} in {branch} branch. \
             Users in {branch} won't be able to receive the addon update.",
            addon.id
        )))
    } else if review_mode {
        Some(Diagnostic::information(format!(
            "{} addon also exists in {branch} branch but with update compatible version: {published}",
            addon.id
        )))
    } else {
        None
    }
}

/// Across an ABI break the submission must stay below the newer branch's
/// copy, so users migrating to that branch still get a replacement.
fn check_migration_path(
    addon: &Addon,
    version: &AddonVersion,
    published: Option<&AddonVersion>,
    branch: &BranchVersion,
    review_mode: bool,
) -> Option<Diagnostic> {
    let submitted = Some(version);
    let acceptable = submitted < published || (submitted == published && review_mode);
    let published = label(published);

    if !acceptable {
        let severity = if review_mode {
            Severity::Problem
        } else {
            Severity::Warning
        };
        Some(Diagnostic::new(
            severity,
            format!(
                "{} addon already exists with a lower or equal version: {published} in {branch} branch. \
                 Users migrating to {branch} won't be able to receive the addon update.",
                addon.id
            ),
        ))
    } else if review_mode {
        Some(Diagnostic::information(format!(
            "{} addon also exists in {branch} branch but with migration compatible version: {published}",
            addon.id
        )))
    } else {
        None
    }
}

fn label(version: Option<&AddonVersion>) -> String {
    version.map_or_else(|| "unknown".to_string(), ToString::to_string)
}
