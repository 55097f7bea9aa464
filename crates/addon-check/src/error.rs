//! Error types for addon-check

use std::path::PathBuf;

/// Result type for addon-check operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running checks.
///
/// Dependency and version mismatches are never errors: they are reported as
/// [`Diagnostic`](crate::Diagnostic) values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at an explicitly requested path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file is not valid TOML or has unknown keys
    #[error("Invalid configuration in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Inline configuration is not valid TOML
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The worker pool for a repository scan could not be started
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Add-on model error (malformed manifest, invalid branch)
    #[error(transparent)]
    Meta(#[from] addon_meta::Error),

    /// Catalog error
    #[error(transparent)]
    Repo(#[from] addon_repo::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
