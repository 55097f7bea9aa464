//! [`TestRepo`] builder for add-on repository scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use addon_meta::Addon;
use addon_repo::CatalogDocument;
use tempfile::TempDir;

use crate::catalog::record;

/// A temporary directory holding add-on folders and, under `catalogs/`,
/// one catalog file per branch.
///
/// # Example
///
/// ```rust,no_run
/// use addon_test_utils::{TestRepo, addon};
///
/// let repo = TestRepo::new();
/// repo.add_addon_with_manifest("plugin.video.example", "id = \"plugin.video.example\"\nversion = \"1.0.0\"\n");
/// repo.write_catalog("matrix", &[addon("script.module.six", "1.15.0")]);
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the temporary directory; add-on folders live directly below.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory holding the per-branch catalog files.
    pub fn catalog_dir(&self) -> PathBuf {
        self.root().join("catalogs")
    }

    /// Create `<root>/<folder>/addon.toml` with the given content and
    /// return the add-on directory.
    pub fn add_addon_with_manifest(&self, folder: &str, manifest: &str) -> PathBuf {
        let dir = self.root().join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(addon_meta::MANIFEST_FILENAME), manifest).unwrap();
        dir
    }

    /// Write a manifest for `addon` (plus extension points) into a folder
    /// named after its id.
    pub fn add_addon(&self, addon: &Addon, extension_points: &[&str]) -> PathBuf {
        let mut manifest = record(addon);
        manifest.extensions = extension_points
            .iter()
            .map(|point| addon_meta::ExtensionDecl {
                point: point.to_string(),
            })
            .collect();
        let content = toml::to_string(&manifest).unwrap();
        self.add_addon_with_manifest(&addon.id, &content)
    }

    /// Write `catalogs/<branch>.json` listing `addons`.
    pub fn write_catalog(&self, branch: &str, addons: &[Addon]) -> PathBuf {
        let dir = self.catalog_dir();
        fs::create_dir_all(&dir).unwrap();
        let document = CatalogDocument {
            addons: addons.iter().map(record).collect(),
        };
        let path = dir.join(format!("{branch}.json"));
        fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
        path
    }

    /// Write a file relative to the root.
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}
