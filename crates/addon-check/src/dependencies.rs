//! Dependency resolution against one branch's catalog.

use std::collections::BTreeSet;

use addon_meta::{Addon, BranchVersion};
use addon_repo::RepositorySnapshot;

use crate::compat::{CompatibilityTable, ExtensionRequirements, IgnoreSet};
use crate::diagnostic::{Diagnostic, Severity};

/// Check every dependency of `addon` against `snapshot`, the catalog of
/// `branch`.
///
/// For each dependency, in declaration order:
/// 1. required and in `ignore`: nothing to report
/// 2. not published: information if optional, otherwise a warning, or a
///    problem in review mode
/// 3. no minimum version: information if optional, otherwise a warning
/// 4. published version below the minimum: information if optional,
///    otherwise a problem
///
/// When `snapshot` is unavailable, rules 2 to 4 are skipped and a single
/// information record says how many dependencies went unchecked.
///
/// Independently, a dependency listed in `compatibility` for `branch` is a
/// problem when its minimum version is below the branch's minimum
/// compatible version, and a warning when it differs from the advised one.
///
/// The result depends only on the arguments.
pub fn resolve_dependencies(
    addon: &Addon,
    snapshot: &RepositorySnapshot,
    review_mode: bool,
    ignore: &IgnoreSet,
    compatibility: &CompatibilityTable,
    branch: &BranchVersion,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut unchecked = 0usize;

    for dependency in &addon.dependencies {
        let id = &dependency.target_id;
        let kind = dependency.kind_label();
        let optional_or = |severity| {
            if dependency.optional {
                Severity::Information
            } else {
                severity
            }
        };

        if ignore.contains(id) && !dependency.optional {
            tracing::trace!(addon = %addon.id, dependency = %id, "Platform capability");
        } else if !snapshot.is_available() {
            unchecked += 1;
        } else if let Some(available) = snapshot.find(id) {
            match &dependency.min_version {
                None => diagnostics.push(Diagnostic::new(
                    optional_or(Severity::Warning),
                    format!(
                        "{kind} dependency {id} does not require a minimum version, available: {}",
                        available.version_label()
                    ),
                )),
                Some(min) if available.version.as_ref() < Some(min) => {
                    diagnostics.push(Diagnostic::new(
                        optional_or(Severity::Problem),
                        format!(
                            "Version mismatch for {} dependency {id}, required: {min}, available: {}",
                            kind.to_lowercase(),
                            available.version_label()
                        ),
                    ))
                }
                Some(_) => {}
            }
        } else {
            let severity = if review_mode {
                Severity::Problem
            } else {
                Severity::Warning
            };
            diagnostics.push(Diagnostic::new(
                optional_or(severity),
                format!("{kind} dependency {id} is not available in current repository."),
            ));
        }

        let Some(entry) = compatibility.entry(id, branch) else {
            continue;
        };
        match &dependency.min_version {
            Some(min) if entry.min_compatible <= *min => {
                if entry.advised != *min {
                    diagnostics.push(Diagnostic::warning(format!(
                        "For {branch} it is advised to set {id} version to {}",
                        entry.advised
                    )));
                }
            }
            // An unpinned dependency accepts versions below the minimum.
            _ => diagnostics.push(Diagnostic::problem(format!(
                "For {branch} the {id} version must be higher than or equal to {}",
                entry.min_compatible
            ))),
        }
    }

    if unchecked > 0 {
        tracing::debug!(addon = %addon.id, %branch, unchecked, "Catalog unavailable");
        diagnostics.insert(
            0,
            Diagnostic::information(format!(
                "Catalog of {branch} is unavailable, {unchecked} {} not checked against it",
                if unchecked == 1 { "dependency" } else { "dependencies" }
            )),
        );
    }

    diagnostics
}

/// Report extension points whose mandatory dependency is not declared.
///
/// Each `(dependency, point)` pair is reported once.
pub fn check_extension_requirements(
    addon: &Addon,
    extension_points: &[&str],
    requirements: &ExtensionRequirements,
) -> Vec<Diagnostic> {
    let mut reported = BTreeSet::new();
    extension_points
        .iter()
        .filter_map(|point| {
            let dependency = requirements.required_dependency(point)?;
            if addon.depends_on(dependency) || !reported.insert((dependency, *point)) {
                return None;
            }
            Some(Diagnostic::problem(format!(
                "{dependency} dependency is required for {point} extensions"
            )))
        })
        .collect()
}
