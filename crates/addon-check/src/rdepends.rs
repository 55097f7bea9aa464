//! Reverse dependencies across branches.

use addon_meta::{Addon, BranchVersion};
use addon_repo::BranchSnapshots;

use crate::diagnostic::Diagnostic;

/// Published add-ons depending on an add-on, split by branch bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseDependencies {
    /// Dependents on the target branch and the newer branches that still
    /// publish the same artifact.
    pub current: Vec<Addon>,
    /// Dependents on branches older than the target.
    pub lower: Vec<Addon>,
}

impl ReverseDependencies {
    /// Total number of dependents.
    pub fn len(&self) -> usize {
        self.current.len() + self.lower.len()
    }

    /// Whether nothing depends on the add-on.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn contains_id(addons: &[Addon], id: &str) -> bool {
    addons.iter().any(|a| a.id == id)
}

/// Collect the dependents of `addon_id`, oldest branch first.
///
/// From `target` upwards the scan stops at the first branch whose published
/// `addon_id` differs from the one seen first at or above `target`. A
/// dependent is listed once, in the first bucket it was found in.
pub fn reverse_dependencies(
    addon_id: &str,
    target: &BranchVersion,
    snapshots: &BranchSnapshots,
) -> ReverseDependencies {
    let mut result = ReverseDependencies::default();
    let mut anchor: Option<&Addon> = None;

    for (branch, snapshot) in snapshots {
        if branch < target {
            for dependent in snapshot.reverse_dependents(addon_id) {
                if !contains_id(&result.lower, &dependent.id) {
                    result.lower.push(dependent.clone());
                }
            }
            continue;
        }

        if let Some(published) = snapshot.find(addon_id) {
            match anchor {
                Some(first) if first != published => {
                    tracing::debug!(
                        addon = addon_id,
                        branch = %branch,
                        "Published version diverges; stopping reverse dependency scan"
                    );
                    break;
                }
                Some(_) => {}
                None => anchor = Some(published),
            }
        }

        for dependent in snapshot.reverse_dependents(addon_id) {
            if !contains_id(&result.lower, &dependent.id)
                && !contains_id(&result.current, &dependent.id)
            {
                result.current.push(dependent.clone());
            }
        }
    }

    result
}

fn sorted_ids(addons: &[Addon]) -> String {
    let mut ids: Vec<&str> = addons.iter().map(|a| a.id.as_str()).collect();
    ids.sort_unstable();
    ids.join(", ")
}

/// Report who depends on `addon_id`.
///
/// A library (id starting with `library_prefix`) nobody depends on is a
/// warning; everything else gets an informational summary.
pub fn check_reverse_dependencies(
    addon_id: &str,
    target: &BranchVersion,
    snapshots: &BranchSnapshots,
    library_prefix: &str,
) -> Diagnostic {
    let rdepends = reverse_dependencies(addon_id, target, snapshots);

    if rdepends.is_empty() && addon_id.starts_with(library_prefix) {
        return Diagnostic::warning("This module isn't required by any add-on.");
    }

    Diagnostic::information(format!(
        "Reverse dependencies: {} in {target} and newer [{}], {} in older branches [{}]",
        rdepends.current.len(),
        sorted_ids(&rdepends.current),
        rdepends.lower.len(),
        sorted_ids(&rdepends.lower),
    ))
}
