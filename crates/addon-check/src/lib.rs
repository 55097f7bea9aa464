//! Dependency and version compatibility checks for add-on submissions.
//!
//! Given a submitted add-on, the branch it targets and the published
//! catalog of every branch, the checks report:
//!
//! - unresolved or outdated dependencies ([`resolve_dependencies`])
//! - extension points used without their mandatory dependency
//!   ([`check_extension_requirements`])
//! - who depends on the add-on, and libraries nobody uses
//!   ([`check_reverse_dependencies`])
//! - versions that would break the upgrade path between branches
//!   ([`check_existing_addon`])
//! - circular dependencies ([`check_circular_dependencies`])
//!
//! Findings are [`Diagnostic`] values, never errors. [`check_path`] runs
//! everything on an add-on directory or a whole repository.

pub mod branches;
pub mod compat;
pub mod config;
pub mod cycles;
pub mod dependencies;
pub mod diagnostic;
pub mod error;
pub mod manifest_checks;
pub mod rdepends;
pub mod scan;

pub use branches::check_existing_addon;
pub use compat::{CompatibilityEntry, CompatibilityTable, ExtensionRequirements, IgnoreRules, IgnoreSet};
pub use config::{CONFIG_FILENAME, CatalogConfig, CheckerConfig, ConfigResolver};
pub use cycles::{DependencyGraph, build_dependency_graph, check_circular_dependencies, detect_cycles};
pub use dependencies::{check_extension_requirements, resolve_dependencies};
pub use diagnostic::{Diagnostic, Report, Severity};
pub use error::{Error, Result};
pub use manifest_checks::{check_folder_matches_id, check_version_format};
pub use rdepends::{ReverseDependencies, check_reverse_dependencies, reverse_dependencies};
pub use scan::{CheckContext, addon_dirs, check_addon_dir, check_manifest, check_path, check_repository};
