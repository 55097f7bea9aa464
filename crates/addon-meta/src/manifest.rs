//! Add-on manifest parsing for `addon.toml` files.
//!
//! A manifest declares an add-on's identity, the add-ons it imports and the
//! extension points it plugs into. Catalog records published per branch use
//! the same shape, so the same [`ManifestDocument`] type is used for both.
//!
//! # Example TOML
//!
//! ```toml
//! id = "plugin.video.example"
//! version = "1.2.0+matrix.1"
//! name = "Example"
//!
//! [[requires]]
//! addon = "xbmc.python"
//! version = "3.0.0"
//!
//! [[requires]]
//! addon = "script.module.requests"
//! version = "2.22.0"
//! optional = true
//!
//! [[extension]]
//! point = "xbmc.python.pluginsource"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::AddonVersion;

/// An add-on manifest or catalog record, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestDocument {
    /// Add-on id (e.g. "plugin.video.example"). Required by [`Addon::from_manifest`].
    #[serde(default)]
    pub id: Option<String>,
    /// Version string, parsed later into an [`AddonVersion`].
    #[serde(default)]
    pub version: Option<String>,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Reason the add-on was marked broken, if it was.
    #[serde(default)]
    pub broken: Option<String>,
    /// Lifecycle state declared by the add-on.
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
    /// Imported add-ons.
    #[serde(default)]
    pub requires: Vec<ImportDecl>,
    /// Extension points the add-on plugs into.
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionDecl>,
}

/// One `[[requires]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportDecl {
    /// Target add-on id.
    pub addon: String,
    /// Minimum acceptable version.
    #[serde(default)]
    pub version: Option<String>,
    /// Whether the add-on works without the import.
    #[serde(default)]
    pub optional: bool,
}

/// One `[[extension]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtensionDecl {
    /// Extension point name (e.g. "xbmc.python.pluginsource").
    pub point: String,
}

/// Lifecycle state of an add-on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Lifecycle {
    /// State name, e.g. "normal", "deprecated" or "broken".
    #[serde(rename = "type")]
    pub state: String,
    /// Optional explanation shown to users.
    #[serde(default)]
    pub message: Option<String>,
}

impl ManifestDocument {
    /// Parse a manifest from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Convert one catalog record that has already been read as JSON.
    pub fn from_json_value(record: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(record)?)
    }

    /// Read and parse `addon.toml` from an add-on directory.
    pub fn from_dir(addon_dir: &Path) -> Result<Self> {
        let path = addon_dir.join(crate::MANIFEST_FILENAME);
        if !path.is_file() {
            return Err(Error::ManifestNotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Whether the add-on has been flagged as broken, either directly or
    /// through its lifecycle state.
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
            || self
                .lifecycle
                .as_ref()
                .is_some_and(|l| l.state.eq_ignore_ascii_case("broken"))
    }

    /// Declared extension point names, in manifest order.
    pub fn extension_points(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.point.as_str()).collect()
    }
}

/// A single dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Id of the add-on depended upon.
    pub target_id: String,
    /// Lowest acceptable version; `None` accepts any version.
    pub min_version: Option<AddonVersion>,
    /// Whether the dependency may be absent.
    pub optional: bool,
}

impl Dependency {
    /// A required dependency.
    pub fn required(target_id: impl Into<String>, min_version: Option<&str>) -> Self {
        Self {
            target_id: target_id.into(),
            min_version: min_version.map(AddonVersion::parse),
            optional: false,
        }
    }

    /// An optional dependency.
    pub fn optional(target_id: impl Into<String>, min_version: Option<&str>) -> Self {
        Self {
            optional: true,
            ..Self::required(target_id, min_version)
        }
    }

    /// "Optional" or "Required", for diagnostics.
    pub fn kind_label(&self) -> &'static str {
        if self.optional { "Optional" } else { "Required" }
    }
}

impl From<&ImportDecl> for Dependency {
    fn from(decl: &ImportDecl) -> Self {
        Self {
            target_id: decl.addon.clone(),
            min_version: decl.version.as_deref().map(AddonVersion::parse),
            optional: decl.optional,
        }
    }
}

/// A published or submitted add-on.
///
/// Two add-ons are the same artifact when both id and version match; the
/// dependency list does not take part in equality.
#[derive(Debug, Clone)]
pub struct Addon {
    /// Add-on id.
    pub id: String,
    /// Version, absent when the manifest did not declare one.
    pub version: Option<AddonVersion>,
    /// Declared dependencies, in manifest order.
    pub dependencies: Vec<Dependency>,
}

impl Addon {
    /// Create an add-on without dependencies.
    pub fn new(id: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            id: id.into(),
            version: version.map(AddonVersion::parse),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency, builder style.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Build an add-on from a parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedManifest`] when the manifest has no `id`.
    pub fn from_manifest(manifest: &ManifestDocument) -> Result<Self> {
        let id = manifest
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MalformedManifest {
                reason: "missing add-on id".to_string(),
            })?;

        Ok(Self {
            id: id.to_string(),
            version: manifest.version.as_deref().map(AddonVersion::parse),
            dependencies: manifest.requires.iter().map(Dependency::from).collect(),
        })
    }

    /// Whether any declared dependency targets `addon_id`.
    pub fn depends_on(&self, addon_id: &str) -> bool {
        self.dependencies.iter().any(|d| d.target_id == addon_id)
    }

    /// The version as text, or `"unknown"` when absent.
    pub fn version_label(&self) -> String {
        self.version
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    }
}

impl PartialEq for Addon {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for Addon {}

impl TryFrom<&ManifestDocument> for Addon {
    type Error = Error;

    fn try_from(manifest: &ManifestDocument) -> Result<Self> {
        Self::from_manifest(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"
id = "plugin.video.example"
version = "1.2.0"

[[requires]]
addon = "xbmc.python"
version = "3.0.0"

[[requires]]
addon = "script.module.requests"
optional = true

[[extension]]
point = "xbmc.python.pluginsource"

[[extension]]
point = "xbmc.addon.metadata"
"#;

    #[test]
    fn test_parse_addon() {
        let manifest = ManifestDocument::from_toml(MANIFEST).unwrap();
        let addon = Addon::from_manifest(&manifest).unwrap();

        assert_eq!(addon.id, "plugin.video.example");
        assert_eq!(addon.version, Some(AddonVersion::parse("1.2.0")));
        assert_eq!(
            addon.dependencies,
            vec![
                Dependency::required("xbmc.python", Some("3.0.0")),
                Dependency::optional("script.module.requests", None),
            ]
        );
        assert_eq!(
            manifest.extension_points(),
            vec!["xbmc.python.pluginsource", "xbmc.addon.metadata"]
        );
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let manifest = ManifestDocument::from_toml("version = \"1.0.0\"").unwrap();
        let err = Addon::from_manifest(&manifest).unwrap_err();
        assert!(matches!(err, Error::MalformedManifest { .. }));
    }

    #[test]
    fn test_missing_version_is_tolerated() {
        let manifest = ManifestDocument::from_toml("id = \"script.module.six\"").unwrap();
        let addon = Addon::try_from(&manifest).unwrap();
        assert!(addon.version.is_none());
        assert_eq!(addon.version_label(), "unknown");
    }

    #[test]
    fn test_equality_ignores_dependencies() {
        let a = Addon::new("a", Some("1.0.0"))
            .with_dependency(Dependency::required("b", None));
        let b = Addon::new("a", Some("1.0"));
        assert_eq!(a, b);
        assert_ne!(a, Addon::new("a", Some("1.0.1")));
    }

    #[test]
    fn test_depends_on() {
        let addon = Addon::new("a", Some("1.0.0")).with_dependency(Dependency::optional("b", None));
        assert!(addon.depends_on("b"));
        assert!(!addon.depends_on("c"));
    }

    #[test]
    fn test_broken_flags() {
        let broken = ManifestDocument::from_toml("id = \"a\"\nbroken = \"no longer works\"").unwrap();
        assert!(broken.is_broken());

        let lifecycle = ManifestDocument::from_toml(
            "id = \"a\"\n[lifecycle]\ntype = \"broken\"\nmessage = \"gone\"",
        )
        .unwrap();
        assert!(lifecycle.is_broken());

        let healthy = ManifestDocument::from_toml("id = \"a\"").unwrap();
        assert!(!healthy.is_broken());
    }

    #[test]
    fn test_from_json_record() {
        let record = ManifestDocument::from_json_value(serde_json::json!({
            "id": "script.module.six",
            "version": "1.15.0",
            "requires": [{"addon": "xbmc.python", "version": "2.25.0"}]
        }))
        .unwrap();
        let addon = Addon::from_manifest(&record).unwrap();
        assert!(addon.depends_on("xbmc.python"));
    }

    #[test]
    fn test_json_record_with_bad_import_is_rejected() {
        let err = ManifestDocument::from_json_value(serde_json::json!({
            "id": "plugin.bad",
            "requires": [{"version": "1.0"}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let numeric = ManifestDocument::from_json_value(serde_json::json!({
            "id": "plugin.num",
            "version": 1.0
        }));
        assert!(numeric.is_err());
    }

    #[test]
    fn test_from_dir_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestDocument::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound(_)));
    }
}
