//! Static compatibility data: per-branch ABI versions of platform
//! dependencies, the ids treated as built-in platform capabilities, and the
//! dependencies implied by extension points.
//!
//! All three tables ship with built-in defaults and can be replaced section
//! by section through configuration (see [`crate::config`]).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use addon_meta::{AddonVersion, BranchVersion, Dependency};
use serde::{Deserialize, Serialize};

/// The versions of one platform dependency that are safe and advised on a
/// branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    /// Lowest version that still works on the branch.
    pub min_compatible: AddonVersion,
    /// Version add-ons should declare for the branch.
    pub advised: AddonVersion,
}

impl CompatibilityEntry {
    /// Create an entry from version strings.
    pub fn new(min_compatible: &str, advised: &str) -> Self {
        Self {
            min_compatible: AddonVersion::parse(min_compatible),
            advised: AddonVersion::parse(advised),
        }
    }
}

/// `dependency id -> branch name -> entry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityTable {
    entries: BTreeMap<String, BTreeMap<String, CompatibilityEntry>>,
}

/// `(branch, min_compatible, advised)` rows of a built-in dependency.
type BuiltinRows = &'static [(&'static str, &'static str, &'static str)];

const PYTHON_ABI: BuiltinRows = &[
    ("gotham", "2.1.0", "2.14.0"),
    ("helix", "2.1.0", "2.19.0"),
    ("isengard", "2.1.0", "2.20.0"),
    ("jarvis", "2.1.0", "2.24.0"),
    ("krypton", "2.1.0", "2.25.0"),
    ("leia", "2.1.0", "2.26.0"),
    ("matrix", "3.0.0", "3.0.0"),
    ("nexus", "3.0.0", "3.0.1"),
    ("omega", "3.0.0", "3.0.1"),
    ("piers", "3.0.0", "3.0.1"),
];

const GUI_ABI: BuiltinRows = &[
    ("gotham", "5.0.1", "5.0.1"),
    ("helix", "5.0.1", "5.3.0"),
    ("isengard", "5.0.1", "5.9.0"),
    ("jarvis", "5.0.1", "5.10.0"),
    ("krypton", "5.0.1", "5.12.0"),
    ("leia", "5.0.1", "5.14.0"),
    ("matrix", "5.15.0", "5.15.0"),
    ("nexus", "5.15.0", "5.16.0"),
    ("omega", "5.15.0", "5.17.0"),
    ("piers", "5.15.0", "5.18.0"),
];

const JSON_RPC_ABI: BuiltinRows = &[
    ("gotham", "6.0.0", "6.0.0"),
    ("helix", "6.0.0", "6.20.0"),
    ("isengard", "6.0.0", "6.25.1"),
    ("jarvis", "6.0.0", "6.32.4"),
    ("krypton", "6.0.0", "7.0.0"),
    ("leia", "6.0.0", "9.7.2"),
    ("matrix", "6.0.0", "11.2.0"),
    ("nexus", "6.0.0", "12.4.0"),
    ("omega", "6.0.0", "13.0.0"),
    ("piers", "6.0.0", "13.0.0"),
];

impl CompatibilityTable {
    /// The built-in table for the scripting runtime, GUI and JSON-RPC APIs.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (dependency, rows) in [
            ("xbmc.python", PYTHON_ABI),
            ("xbmc.gui", GUI_ABI),
            ("xbmc.json", JSON_RPC_ABI),
        ] {
            for (branch, min_compatible, advised) in rows {
                table.insert(
                    dependency,
                    branch,
                    CompatibilityEntry::new(min_compatible, advised),
                );
            }
        }
        table
    }

    /// Set the entry of `dependency` on `branch`.
    pub fn insert(&mut self, dependency: &str, branch: &str, entry: CompatibilityEntry) {
        self.entries
            .entry(dependency.to_string())
            .or_default()
            .insert(branch.to_string(), entry);
    }

    /// Replace every branch entry of the dependencies present in `other`.
    pub fn merge(&mut self, other: CompatibilityTable) {
        self.entries.extend(other.entries);
    }

    /// The entry for `dependency` on `branch`, if one is configured.
    pub fn entry(&self, dependency: &str, branch: &BranchVersion) -> Option<&CompatibilityEntry> {
        self.entries.get(dependency)?.get(branch.name())
    }

    /// Dependency ids with entries.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Branch names mentioned for `dependency`.
    pub fn branches_of(&self, dependency: &str) -> Vec<&str> {
        self.entries
            .get(dependency)
            .map(|branches| branches.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether an add-on built against `target` with `dependencies` keeps
    /// working on the `higher` branch.
    ///
    /// It does not when some dependency's minimum compatible version is
    /// raised between the two branches. Dependencies without entries for
    /// both branches never break compatibility.
    pub fn is_forward_compatible(
        &self,
        dependencies: &[Dependency],
        target: &BranchVersion,
        higher: &BranchVersion,
    ) -> bool {
        !dependencies.iter().any(|d| {
            match (
                self.entry(&d.target_id, target),
                self.entry(&d.target_id, higher),
            ) {
                (Some(old), Some(new)) => new.min_compatible > old.min_compatible,
                _ => false,
            }
        })
    }
}

const COMMON_IGNORED: &[&str] = &[
    "xbmc.metadata.scraper.albums",
    "xbmc.metadata.scraper.movies",
    "xbmc.metadata.scraper.musicvideos",
    "xbmc.metadata.scraper.tvshows",
    "xbmc.metadata.scraper.library",
    "xbmc.ui.screensaver",
    "xbmc.player.musicviz",
    "xbmc.python.pluginsource",
    "xbmc.python.script",
    "xbmc.python.weather",
    "xbmc.python.lyrics",
    "xbmc.python.library",
    "xbmc.python.module",
    "xbmc.subtitle.module",
    "kodi.context.item",
    "kodi.game.controller",
    "xbmc.gui.skin",
    "xbmc.webinterface",
    "xbmc.addon.repository",
    "xbmc.pvrclient",
    "kodi.gameclient",
    "kodi.peripheral",
    "kodi.resource",
    "xbmc.addon.video",
    "xbmc.addon.audio",
    "xbmc.addon.image",
    "xbmc.addon.executable",
    "kodi.addon.game",
    "kodi.audioencoder",
    "kodi.audiodecoder",
    "xbmc.service",
    "kodi.resource.images",
    "kodi.resource.language",
    "kodi.resource.uisounds",
    "kodi.resource.games",
    "kodi.resource.font",
    "kodi.inputstream",
    "kodi.vfs",
    "kodi.imagedecoder",
    "xbmc.addon",
    "xbmc.gui",
    "xbmc.json",
    "xbmc.metadata",
    "xbmc.python",
    "script.module.pil",
];

/// Dependency ids that are platform capabilities rather than installable
/// add-ons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// Ignored on every branch.
    #[serde(default)]
    pub common: BTreeSet<String>,
    /// Extra ids ignored on specific branches, keyed by branch name.
    #[serde(default)]
    pub branches: BTreeMap<String, BTreeSet<String>>,
}

impl IgnoreRules {
    /// The built-in rules.
    pub fn builtin() -> Self {
        fn owned(ids: &[&str]) -> BTreeSet<String> {
            ids.iter().map(|id| id.to_string()).collect()
        }
        Self {
            common: owned(COMMON_IGNORED),
            branches: BTreeMap::from([
                ("krypton".to_string(), owned(&["inputstream.adaptive", "inputstream.rtmp"])),
                ("leia".to_string(), owned(&["script.module.pycryptodome"])),
            ]),
        }
    }

    /// The ids ignored on `branch`. Every call builds a new set.
    pub fn ignore_set_for(&self, branch: &BranchVersion) -> IgnoreSet {
        let extra = self.branches.get(branch.name()).into_iter().flatten();
        IgnoreSet {
            ids: self.common.iter().chain(extra).cloned().collect(),
        }
    }
}

/// The ignored ids for one branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    ids: HashSet<String>,
}

impl IgnoreSet {
    /// Whether `addon_id` is ignored.
    pub fn contains(&self, addon_id: &str) -> bool {
        self.ids.contains(addon_id)
    }

    /// Number of ignored ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is ignored.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// `extension point -> dependency id` the point cannot work without.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionRequirements {
    points: BTreeMap<String, String>,
}

impl ExtensionRequirements {
    /// The built-in requirements.
    pub fn builtin() -> Self {
        let python_points = [
            "xbmc.python.pluginsource",
            "xbmc.python.script",
            "xbmc.python.module",
            "xbmc.python.weather",
            "xbmc.python.lyrics",
            "xbmc.python.library",
            "xbmc.service",
            "kodi.context.item",
        ];
        let mut points: BTreeMap<String, String> = python_points
            .iter()
            .map(|point| (point.to_string(), "xbmc.python".to_string()))
            .collect();
        points.insert("xbmc.gui.skin".to_string(), "xbmc.gui".to_string());
        Self { points }
    }

    /// Add or replace requirements.
    pub fn merge(&mut self, other: ExtensionRequirements) {
        self.points.extend(other.points);
    }

    /// The dependency `point` requires, if any.
    pub fn required_dependency(&self, point: &str) -> Option<&str> {
        self.points.get(point).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtensionRequirements {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            points: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_test_utils::branch;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_python_entries() {
        let table = CompatibilityTable::builtin();
        let leia = table.entry("xbmc.python", &branch("leia")).unwrap();
        assert_eq!(leia.advised, AddonVersion::parse("2.26.0"));
        assert_eq!(leia.min_compatible, AddonVersion::parse("2.1.0"));
        assert!(table.entry("script.module.six", &branch("leia")).is_none());
        assert!(!table.branches_of("xbmc.gui").is_empty());
    }

    #[test]
    fn test_python_abi_breaks_at_matrix() {
        let table = CompatibilityTable::builtin();
        let deps = vec![Dependency::required("xbmc.python", Some("2.26.0"))];
        assert!(table.is_forward_compatible(&deps, &branch("krypton"), &branch("leia")));
        assert!(!table.is_forward_compatible(&deps, &branch("leia"), &branch("matrix")));
        assert!(table.is_forward_compatible(&deps, &branch("matrix"), &branch("piers")));
    }

    #[test]
    fn test_unlisted_dependencies_are_forward_compatible() {
        let table = CompatibilityTable::builtin();
        let deps = vec![Dependency::required("script.module.six", None)];
        assert!(table.is_forward_compatible(&deps, &branch("leia"), &branch("matrix")));
        assert!(table.is_forward_compatible(&[], &branch("gotham"), &branch("piers")));
    }

    #[test]
    fn test_merge_replaces_whole_dependency() {
        let mut table = CompatibilityTable::builtin();
        let mut custom = CompatibilityTable::default();
        custom.insert("xbmc.python", "matrix", CompatibilityEntry::new("3.0.0", "3.0.1"));
        table.merge(custom);

        assert_eq!(table.branches_of("xbmc.python"), vec!["matrix"]);
        assert!(table.entry("xbmc.python", &branch("leia")).is_none());
        assert!(!table.branches_of("xbmc.json").is_empty());
    }

    #[test]
    fn test_ignore_set_is_branch_specific() {
        let rules = IgnoreRules::builtin();
        let leia = rules.ignore_set_for(&branch("leia"));
        let krypton = rules.ignore_set_for(&branch("krypton"));
        let matrix = rules.ignore_set_for(&branch("matrix"));

        assert!(leia.contains("script.module.pycryptodome"));
        assert!(!leia.contains("inputstream.adaptive"));
        assert!(krypton.contains("inputstream.adaptive"));
        assert!(!krypton.contains("script.module.pycryptodome"));
        assert!(matrix.contains("xbmc.python"));
        assert_eq!(matrix.len(), COMMON_IGNORED.len());
    }

    #[test]
    fn test_ignore_set_calls_do_not_accumulate() {
        let rules = IgnoreRules::builtin();
        let first = rules.ignore_set_for(&branch("leia"));
        let _ = rules.ignore_set_for(&branch("krypton"));
        let again = rules.ignore_set_for(&branch("leia"));
        assert_eq!(first, again);
        assert!(!rules.ignore_set_for(&branch("nexus")).contains("script.module.pycryptodome"));
    }

    #[test]
    fn test_extension_requirements() {
        let requirements = ExtensionRequirements::builtin();
        assert_eq!(
            requirements.required_dependency("xbmc.python.pluginsource"),
            Some("xbmc.python")
        );
        assert_eq!(requirements.required_dependency("xbmc.gui.skin"), Some("xbmc.gui"));
        assert_eq!(requirements.required_dependency("xbmc.metadata.scraper.movies"), None);
    }

    #[test]
    fn test_table_from_toml() {
        // Ids contain dots, so they must be quoted keys.
        let table: CompatibilityTable = toml::from_str(
            r#"
            ["xbmc.python".matrix]
            min_compatible = "3.0.0"
            advised = "3.0.0"
            "#,
        )
        .unwrap();
        assert!(table.entry("xbmc.python", &branch("matrix")).is_some());
    }
}
