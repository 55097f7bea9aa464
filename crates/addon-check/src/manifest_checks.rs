//! Checks on the submitted manifest itself.

use std::path::Path;

use addon_meta::{AddonVersion, ManifestDocument};

use crate::diagnostic::Diagnostic;

/// The manifest must declare a `major.minor[.patch…]` version, optionally
/// with a `+local` or `~pre` tag.
pub fn check_version_format(manifest: &ManifestDocument) -> Option<Diagnostic> {
    match manifest.version.as_deref() {
        None => Some(Diagnostic::problem("Missing version in addon manifest")),
        Some(version) if !AddonVersion::is_well_formed(version) => {
            Some(Diagnostic::problem(format!(
                "Invalid version {version} in addon manifest. Please use the major.minor.revision \
                 (e.g. 1.0.0) format or major.minor.revision+localversion_identifier \
                 (e.g. 1.0.0+matrix.1)"
            )))
        }
        Some(_) => None,
    }
}

/// The add-on directory must be named after the add-on id.
pub fn check_folder_matches_id(addon_dir: &Path, addon_id: &str) -> Option<Diagnostic> {
    let folder = addon_dir.file_name()?.to_string_lossy();
    (folder != addon_id).then(|| {
        Diagnostic::problem(format!(
            "Add-on id '{addon_id}' does not match folder name '{folder}'"
        ))
    })
}
