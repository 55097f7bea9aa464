use std::path::PathBuf;

/// Errors raised while retrieving or decoding a branch catalog.
///
/// None of these are fatal to a check: [`fetch_snapshots`](crate::fetch_snapshots)
/// turns every one of them into an unavailable snapshot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    /// The request could not be completed (connection, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The catalog URL template does not produce a valid URL.
    #[error("invalid catalog URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No catalog file exists for the branch in a catalog directory.
    #[error("catalog not found: {0}")]
    CatalogNotFound(PathBuf),

    /// The payload looked compressed but could not be inflated.
    #[error("failed to decompress catalog: {0}")]
    Decompress(#[source] std::io::Error),

    /// The catalog is not a valid catalog document.
    #[error("failed to parse catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),

    /// I/O error reading catalog files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the add-on model.
    #[error(transparent)]
    Meta(#[from] addon_meta::Error),
}

impl Error {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limiting, redirects that were not followed, server errors and
    /// transport failures are transient; everything else is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                *status == 429 || (300..400).contains(status) || *status >= 500
            }
            Self::Request { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
