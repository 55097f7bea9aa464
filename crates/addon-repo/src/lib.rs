//! Published add-on catalogs, one per branch.
//!
//! A [`RepositorySnapshot`] is the immutable list of add-ons published on one
//! branch. Snapshots are built from catalog documents handed over by a
//! [`CatalogSource`]; [`fetch_snapshots`] fetches every branch and degrades a
//! failed fetch to an unavailable snapshot so one unreachable mirror never aborts a
//! check.

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod snapshot;

pub use catalog::CatalogDocument;
pub use error::{Error, Result};
pub use fetch::{
    CatalogSource, DirectoryCatalogSource, HostThrottle, HttpCatalogSource, HttpSettings,
    fetch_snapshots,
};
pub use snapshot::{BranchSnapshots, RepositorySnapshot};
