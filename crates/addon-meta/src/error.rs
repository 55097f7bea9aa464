use std::path::PathBuf;

/// Errors that can occur while building the add-on model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest lacks a field every add-on must carry.
    #[error("malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    /// A branch codename that is not part of the configured branch list.
    #[error("invalid branch '{name}'")]
    InvalidBranch { name: String },

    /// The configured branch list itself is unusable.
    #[error("invalid branch list: {reason}")]
    InvalidBranchList { reason: String },

    /// Failed to parse manifest TOML.
    #[error("failed to parse add-on manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    /// Failed to parse a JSON add-on record.
    #[error("failed to parse add-on record: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest file not found at the expected path.
    #[error("add-on manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// I/O error reading manifest files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
