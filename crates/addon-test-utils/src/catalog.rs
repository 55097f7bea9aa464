//! In-memory catalog fixtures.

use addon_meta::{Addon, BranchVersion, Dependency, ImportDecl, ManifestDocument};
use addon_repo::{BranchSnapshots, RepositorySnapshot};

/// A canonical branch by codename. Panics on unknown names.
pub fn branch(name: &str) -> BranchVersion {
    BranchVersion::new(name).unwrap_or_else(|e| panic!("fixture branch: {e}"))
}

/// An add-on with a version and no dependencies.
pub fn addon(id: &str, version: &str) -> Addon {
    Addon::new(id, Some(version))
}

/// A snapshot of one canonical branch.
pub fn snapshot(branch_name: &str, entries: Vec<Addon>) -> RepositorySnapshot {
    RepositorySnapshot::from_entries(branch(branch_name), entries)
}

/// Snapshots for the listed branches only.
pub fn snapshots(branches: Vec<(&str, Vec<Addon>)>) -> BranchSnapshots {
    branches
        .into_iter()
        .map(|(name, entries)| (branch(name), snapshot(name, entries)))
        .collect()
}

/// Convert an add-on back into the catalog record it would be published as.
pub fn record(addon: &Addon) -> ManifestDocument {
    ManifestDocument {
        id: Some(addon.id.clone()),
        version: addon.version.as_ref().map(ToString::to_string),
        requires: addon
            .dependencies
            .iter()
            .map(|d: &Dependency| ImportDecl {
                addon: d.target_id.clone(),
                version: d.min_version.as_ref().map(ToString::to_string),
                optional: d.optional,
            })
            .collect(),
        ..Default::default()
    }
}

/// Two add-ons requiring each other, both published on krypton.
///
/// Returns the submitted `plugin.test.one` and the krypton snapshot.
pub fn circular_fixture() -> (Addon, RepositorySnapshot) {
    let one = addon("plugin.test.one", "1.0.0")
        .with_dependency(Dependency::required("plugin.test.two", Some("1.0.0")));
    let two = addon("plugin.test.two", "1.0.0")
        .with_dependency(Dependency::required("plugin.test.one", Some("1.0.0")));
    let catalog = snapshot("krypton", vec![one.clone(), two]);
    (one, catalog)
}
