//! Add-on model for the add-on checker.
//!
//! This crate provides the leaf value types every check is built on:
//!
//! - [`AddonVersion`]: a totally ordered add-on version parsed from any string
//! - [`BranchList`] / [`BranchVersion`]: the ordered release lines of the host application
//! - [`Addon`] / [`Dependency`]: an add-on identity and its declared imports
//! - [`ManifestDocument`]: the `addon.toml` document an [`Addon`] is parsed from

pub mod branch;
pub mod error;
pub mod manifest;
pub mod version;

/// The canonical filename for add-on manifest files.
pub const MANIFEST_FILENAME: &str = "addon.toml";

pub use branch::{BranchList, BranchVersion, CANONICAL_BRANCHES};
pub use error::{Error, Result};
pub use manifest::{Addon, Dependency, ExtensionDecl, ImportDecl, Lifecycle, ManifestDocument};
pub use version::AddonVersion;
