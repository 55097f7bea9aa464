//! Immutable per-branch add-on catalog.

use std::collections::{BTreeMap, HashMap};

use addon_meta::{Addon, BranchVersion, ManifestDocument};

use crate::catalog::{self, CatalogDocument};
use crate::error::Result;

/// Snapshots of every known branch, ordered oldest branch first.
pub type BranchSnapshots = BTreeMap<BranchVersion, RepositorySnapshot>;

/// The add-ons published on one branch.
///
/// A snapshot may hold several entries with the same id (historical or
/// duplicate publications); lookups by id resolve to the highest version,
/// which is what the host application installs. Snapshots are never mutated
/// after construction. Refreshing a branch means building a new one.
///
/// An unavailable snapshot stands in for a catalog that could not be
/// retrieved. It is empty like a catalog that publishes nothing, but checks
/// must read it as "nothing known" rather than "nothing published".
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    branch: BranchVersion,
    entries: Vec<Addon>,
    /// id -> index of the entry `find` resolves to.
    latest: HashMap<String, usize>,
    available: bool,
}

impl RepositorySnapshot {
    /// A snapshot for a branch whose catalog could not be retrieved.
    pub fn unavailable(branch: BranchVersion) -> Self {
        Self {
            available: false,
            ..Self::from_entries(branch, Vec::new())
        }
    }

    /// Build a snapshot from already-constructed add-ons.
    pub fn from_entries(branch: BranchVersion, entries: Vec<Addon>) -> Self {
        let mut latest: HashMap<String, usize> = HashMap::new();
        for (index, addon) in entries.iter().enumerate() {
            match latest.get(&addon.id) {
                // Strictly newer only: the first-seen entry wins ties.
                Some(&best) if entries[best].version >= addon.version => {}
                _ => {
                    latest.insert(addon.id.clone(), index);
                }
            }
        }
        Self {
            branch,
            entries,
            latest,
            available: true,
        }
    }

    /// Build a snapshot from catalog records. Records without an id are
    /// skipped with a warning.
    pub fn from_records<I>(branch: BranchVersion, records: I) -> Self
    where
        I: IntoIterator<Item = ManifestDocument>,
    {
        let entries = records
            .into_iter()
            .filter_map(|record| match Addon::from_manifest(&record) {
                Ok(addon) => Some(addon),
                Err(e) => {
                    tracing::warn!(branch = %branch, error = %e, "Skipping catalog record");
                    None
                }
            })
            .collect();
        Self::from_entries(branch, entries)
    }

    /// Build a snapshot from a catalog document.
    pub fn from_document(branch: BranchVersion, document: CatalogDocument) -> Self {
        Self::from_records(branch, document.addons)
    }

    /// Decode a raw catalog payload (JSON, optionally gzip-compressed) and
    /// build a snapshot from it.
    pub fn build(branch: BranchVersion, payload: &[u8]) -> Result<Self> {
        let document = catalog::decode(payload)?;
        Ok(Self::from_document(branch, document))
    }

    /// The branch this snapshot describes.
    pub fn branch(&self) -> &BranchVersion {
        &self.branch
    }

    /// Number of published entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the branch publishes nothing, or nothing is known about it.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the catalog was retrieved. `false` means nothing is known
    /// about the branch.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Whether any entry has the given id.
    pub fn contains(&self, addon_id: &str) -> bool {
        self.latest.contains_key(addon_id)
    }

    /// The entry with the highest version among those sharing `addon_id`.
    pub fn find(&self, addon_id: &str) -> Option<&Addon> {
        self.latest.get(addon_id).map(|&index| &self.entries[index])
    }

    /// Every entry that declares `addon_id` as a dependency.
    pub fn reverse_dependents(&self, addon_id: &str) -> Vec<&Addon> {
        self.entries
            .iter()
            .filter(|addon| addon.depends_on(addon_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_meta::{AddonVersion, Dependency};

    fn leia() -> BranchVersion {
        BranchVersion::new("leia").unwrap()
    }

    #[test]
    fn test_unavailable_snapshot_knows_nothing() {
        let snapshot = RepositorySnapshot::unavailable(leia());
        assert!(!snapshot.is_available());
        assert!(snapshot.is_empty());
        assert!(!snapshot.contains("anything"));
        assert!(snapshot.find("anything").is_none());
        assert!(snapshot.reverse_dependents("anything").is_empty());
        assert_eq!(snapshot.branch().name(), "leia");
    }

    #[test]
    fn test_empty_catalog_is_available() {
        let snapshot = RepositorySnapshot::from_records(leia(), Vec::new());
        assert!(snapshot.is_available());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_find_returns_highest_version() {
        let snapshot = RepositorySnapshot::from_entries(
            leia(),
            vec![
                Addon::new("script.module.six", Some("1.11.0")),
                Addon::new("script.module.six", Some("1.15.0")),
                Addon::new("script.module.six", Some("1.13.0")),
            ],
        );
        let found = snapshot.find("script.module.six").unwrap();
        assert_eq!(found.version, Some(AddonVersion::parse("1.15.0")));
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_find_ties_keep_first_seen() {
        let first = Addon::new("a", Some("1.0")).with_dependency(Dependency::required("x", None));
        let second = Addon::new("a", Some("1.0.0"));
        let snapshot = RepositorySnapshot::from_entries(leia(), vec![first, second]);
        assert!(snapshot.find("a").unwrap().depends_on("x"));
    }

    #[test]
    fn test_versionless_entry_loses_to_versioned() {
        let snapshot = RepositorySnapshot::from_entries(
            leia(),
            vec![Addon::new("a", None), Addon::new("a", Some("0.0.1"))],
        );
        assert_eq!(
            snapshot.find("a").unwrap().version,
            Some(AddonVersion::parse("0.0.1"))
        );
    }

    #[test]
    fn test_reverse_dependents() {
        let snapshot = RepositorySnapshot::from_entries(
            leia(),
            vec![
                Addon::new("plugin.a", Some("1.0.0"))
                    .with_dependency(Dependency::required("script.module.six", None)),
                Addon::new("plugin.b", Some("1.0.0"))
                    .with_dependency(Dependency::optional("script.module.six", None)),
                Addon::new("plugin.c", Some("1.0.0")),
            ],
        );
        let ids: Vec<&str> = snapshot
            .reverse_dependents("script.module.six")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["plugin.a", "plugin.b"]);
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let records = vec![
            ManifestDocument {
                id: Some("plugin.a".to_string()),
                version: Some("1.0.0".to_string()),
                ..Default::default()
            },
            ManifestDocument {
                version: Some("2.0.0".to_string()),
                ..Default::default()
            },
        ];
        let snapshot = RepositorySnapshot::from_records(leia(), records);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("plugin.a"));
    }
}
