//! Checker configuration with layered resolution.
//!
//! [`CheckerConfig::default`] carries the built-in tables. A
//! [`ConfigResolver`] applies, in order:
//! 1. Global config (`<config_dir>/addon-checker/config.toml`)
//! 2. Repository config (`<repo>/.addon-checker.toml`)
//!
//! Each layer replaces whole sections of the previous one; the
//! `compatibility` and `extension_requirements` tables are replaced per
//! dependency / per point, and `ignore.branches` per branch.
//!
//! # Example TOML
//!
//! ```toml
//! branches = ["leia", "matrix", "nexus"]
//! library_prefix = "script.module."
//! workers = 4
//!
//! [compatibility."xbmc.python".matrix]
//! min_compatible = "3.0.0"
//! advised = "3.0.0"
//!
//! [ignore]
//! common = ["xbmc.python", "xbmc.gui"]
//!
//! [ignore.branches]
//! leia = ["script.module.pycryptodome"]
//!
//! [extension_requirements]
//! "xbmc.python.pluginsource" = "xbmc.python"
//!
//! [catalog]
//! url_template = "https://mirror.example.org/addons/{branch}/addons.json.gz"
//! connect_timeout_secs = 10
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use addon_meta::BranchList;
use addon_repo::HttpSettings;
use serde::Deserialize;

use crate::compat::{CompatibilityEntry, CompatibilityTable, ExtensionRequirements, IgnoreRules};
use crate::error::{Error, Result};

/// Repository-level config file name.
pub const CONFIG_FILENAME: &str = ".addon-checker.toml";

/// Ids starting with this prefix are shared libraries.
pub const DEFAULT_LIBRARY_PREFIX: &str = "script.module.";

/// Everything the checks need besides the add-on and the catalogs.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerConfig {
    /// Known branches, oldest first.
    pub branches: BranchList,
    /// ABI versions of platform dependencies per branch.
    pub compatibility: CompatibilityTable,
    /// Platform capability ids.
    pub ignore: IgnoreRules,
    /// Dependencies implied by extension points.
    pub extension_requirements: ExtensionRequirements,
    /// Prefix of library add-on ids.
    pub library_prefix: String,
    /// Worker threads for repository scans.
    pub workers: usize,
    /// Where catalogs come from.
    pub catalog: CatalogConfig,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            branches: BranchList::canonical(),
            compatibility: CompatibilityTable::builtin(),
            ignore: IgnoreRules::builtin(),
            extension_requirements: ExtensionRequirements::builtin(),
            library_prefix: DEFAULT_LIBRARY_PREFIX.to_string(),
            workers: default_workers(),
            catalog: CatalogConfig::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Catalog source settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// HTTP URL with a `{branch}` placeholder.
    pub url_template: Option<String>,
    /// Local directory with `<branch>.json[.gz]` files. Takes precedence
    /// over `url_template`.
    pub directory: Option<PathBuf>,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Retries on redirects, rate limiting and server errors.
    pub max_retries: u32,
    /// Minimum spacing between requests to one host.
    pub min_request_interval_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let http = HttpSettings::default();
        Self {
            url_template: None,
            directory: None,
            connect_timeout_secs: http.connect_timeout.as_secs(),
            read_timeout_secs: http.read_timeout.as_secs(),
            max_retries: http.max_retries,
            min_request_interval_ms: http.min_request_interval.as_millis() as u64,
        }
    }
}

impl CatalogConfig {
    /// HTTP settings for [`addon_repo::HttpCatalogSource`].
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            max_retries: self.max_retries,
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            ..HttpSettings::default()
        }
    }
}

/// One config file as written. Absent keys leave the previous layer alone.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    branches: Option<Vec<String>>,
    compatibility: Option<BTreeMap<String, BTreeMap<String, CompatibilityEntry>>>,
    ignore: Option<IgnoreLayer>,
    extension_requirements: Option<BTreeMap<String, String>>,
    library_prefix: Option<String>,
    workers: Option<usize>,
    catalog: Option<CatalogLayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IgnoreLayer {
    common: Option<BTreeSet<String>>,
    #[serde(default)]
    branches: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogLayer {
    url_template: Option<String>,
    directory: Option<PathBuf>,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    min_request_interval_ms: Option<u64>,
}

impl CheckerConfig {
    /// Built-in defaults overridden by a single TOML document.
    ///
    /// Relative catalog directories are kept as written.
    pub fn parse(content: &str) -> Result<Self> {
        let layer: ConfigLayer = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply(layer, None)?;
        Ok(config)
    }

    /// Built-in defaults overridden by the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(path)?;
        Ok(config)
    }

    /// Apply the file at `path` on top of this config.
    ///
    /// A relative `catalog.directory` is resolved against the file's
    /// directory.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let layer: ConfigLayer = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply(layer, path.parent())
    }

    fn apply(&mut self, layer: ConfigLayer, base_dir: Option<&Path>) -> Result<()> {
        if let Some(names) = layer.branches {
            self.branches = BranchList::new(names)?;
        }
        if let Some(compatibility) = layer.compatibility {
            let mut table = CompatibilityTable::default();
            for (dependency, branches) in compatibility {
                for (branch, entry) in branches {
                    table.insert(&dependency, &branch, entry);
                }
            }
            self.compatibility.merge(table);
        }
        if let Some(ignore) = layer.ignore {
            if let Some(common) = ignore.common {
                self.ignore.common = common;
            }
            self.ignore.branches.extend(ignore.branches);
        }
        if let Some(points) = layer.extension_requirements {
            self.extension_requirements
                .merge(points.into_iter().collect());
        }
        if let Some(prefix) = layer.library_prefix {
            self.library_prefix = prefix;
        }
        if let Some(workers) = layer.workers {
            if workers == 0 {
                return Err(Error::InvalidConfig {
                    reason: "workers must be at least 1".to_string(),
                });
            }
            self.workers = workers;
        }
        if let Some(catalog) = layer.catalog {
            self.apply_catalog(catalog, base_dir);
        }
        Ok(())
    }

    fn apply_catalog(&mut self, layer: CatalogLayer, base_dir: Option<&Path>) {
        let catalog = &mut self.catalog;
        if let Some(template) = layer.url_template {
            catalog.url_template = Some(template);
        }
        if let Some(directory) = layer.directory {
            catalog.directory = Some(match base_dir {
                Some(base) if directory.is_relative() => base.join(directory),
                _ => directory,
            });
        }
        if let Some(secs) = layer.connect_timeout_secs {
            catalog.connect_timeout_secs = secs;
        }
        if let Some(secs) = layer.read_timeout_secs {
            catalog.read_timeout_secs = secs;
        }
        if let Some(retries) = layer.max_retries {
            catalog.max_retries = retries;
        }
        if let Some(ms) = layer.min_request_interval_ms {
            catalog.min_request_interval_ms = ms;
        }
    }

    /// Log table entries naming branches outside the branch list. They are
    /// kept but can never match.
    pub fn warn_unknown_branches(&self) {
        let known = self.branches.names();
        for dependency in self.compatibility.dependencies() {
            for branch in self.compatibility.branches_of(dependency) {
                if !known.contains(&branch) {
                    tracing::warn!(dependency, branch, "Compatibility entry for unknown branch");
                }
            }
        }
        for branch in self.ignore.branches.keys() {
            if !known.contains(&branch.as_str()) {
                tracing::warn!(branch = %branch, "Ignore list for unknown branch");
            }
        }
    }
}

/// Resolves the effective configuration for a repository.
pub struct ConfigResolver {
    /// Repository root holding the optional `.addon-checker.toml`
    root: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()/addon-checker` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(root: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("addon-checker"))
    }

    /// Merge defaults, the global config and the repository config.
    ///
    /// Missing files are skipped. Invalid TOML in any layer is an error.
    pub fn resolve(&self) -> Result<CheckerConfig> {
        let mut config = CheckerConfig::default();

        // Layer 1 - Global config
        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join("config.toml");
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config (layer 1)");
                config.apply_file(&global_config_path)?;
            } else {
                tracing::debug!(?global_config_path, "No global config found (layer 1)");
            }
        }

        // Layer 2 - Repository config
        let repo_config_path = self.root.join(CONFIG_FILENAME);
        if repo_config_path.is_file() {
            tracing::debug!(?repo_config_path, "Loading repository config (layer 2)");
            config.apply_file(&repo_config_path)?;
        }

        config.warn_unknown_branches();
        Ok(config)
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the repository has its own config file.
    pub fn has_config(&self) -> bool {
        self.root.join(CONFIG_FILENAME).is_file()
    }
}
