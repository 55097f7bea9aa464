//! Catalog retrieval.
//!
//! [`CatalogSource`] is the seam between the checks and wherever catalogs
//! live. Two sources are provided:
//!
//! - [`HttpCatalogSource`]: blocking HTTP with connect/request timeouts,
//!   bounded retry with exponential backoff on transient failures, and
//!   per-host serialization so one mirror is never hit concurrently
//! - [`DirectoryCatalogSource`]: `<dir>/<branch>.json.gz` or `<dir>/<branch>.json`
//!
//! [`fetch_snapshots`] fetches every branch concurrently and never fails:
//! a branch whose catalog cannot be retrieved or decoded gets an
//! unavailable snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use addon_meta::{BranchList, BranchVersion};
use backoff::ExponentialBackoffBuilder;
use rayon::prelude::*;
use reqwest::blocking::Client;

use crate::error::{Error, Result};
use crate::snapshot::{BranchSnapshots, RepositorySnapshot};

/// Placeholder substituted with the branch codename in URL templates.
pub const BRANCH_PLACEHOLDER: &str = "{branch}";

/// Something that can produce the raw catalog payload of a branch.
pub trait CatalogSource: Send + Sync {
    /// Where the catalog of `branch` comes from, for log messages.
    fn location(&self, branch: &BranchVersion) -> String;

    /// Retrieve the raw (possibly compressed) catalog payload.
    fn fetch(&self, branch: &BranchVersion) -> Result<Vec<u8>>;
}

/// Fetch and decode the catalog of every branch in `branches`.
///
/// Branches are fetched concurrently. Any failure is logged and replaced by
/// an unavailable snapshot, so the result always holds one entry per branch.
pub fn fetch_snapshots(source: &dyn CatalogSource, branches: &BranchList) -> BranchSnapshots {
    let branches: Vec<BranchVersion> = branches.iter().collect();
    branches
        .into_par_iter()
        .map(|branch| {
            let snapshot = fetch_snapshot(source, &branch);
            (branch, snapshot)
        })
        .collect()
}

fn fetch_snapshot(source: &dyn CatalogSource, branch: &BranchVersion) -> RepositorySnapshot {
    let location = source.location(branch);
    let started = Instant::now();
    let result = source
        .fetch(branch)
        .and_then(|payload| RepositorySnapshot::build(branch.clone(), &payload));

    match result {
        Ok(snapshot) => {
            tracing::debug!(
                branch = %branch,
                %location,
                entries = snapshot.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Fetched catalog"
            );
            snapshot
        }
        Err(e) => {
            tracing::warn!(
                branch = %branch,
                %location,
                error = %e,
                "Catalog unavailable; treating branch as empty"
            );
            RepositorySnapshot::unavailable(branch.clone())
        }
    }
}

/// Tunables for [`HttpCatalogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum time for the whole request, body included.
    pub read_timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// First backoff delay; later delays grow exponentially.
    pub initial_backoff: Duration,
    /// Minimum spacing between two requests to the same host.
    pub min_request_interval: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            min_request_interval: Duration::from_millis(0),
        }
    }
}

/// Serializes requests per host and spaces them by a minimum interval.
#[derive(Debug, Default)]
pub struct HostThrottle {
    min_interval: Duration,
    hosts: Mutex<HashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

impl HostThrottle {
    /// Create a throttle with the given minimum spacing per host.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Run `op` while holding the host's slot.
    ///
    /// Calls for the same host run one at a time; calls for different hosts
    /// do not block each other.
    pub fn run<T>(&self, host: &str, op: impl FnOnce() -> T) -> T {
        let slot = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(hosts.entry(host.to_string()).or_default())
        };

        let mut last_sent = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last_sent {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        let result = op();
        *last_sent = Some(Instant::now());
        result
    }
}

/// Fetches catalogs over HTTP from a URL template such as
/// `https://mirror.example.org/addons/{branch}/addons.json.gz`.
#[derive(Debug)]
pub struct HttpCatalogSource {
    client: Client,
    url_template: String,
    settings: HttpSettings,
    throttle: HostThrottle,
}

impl HttpCatalogSource {
    /// Create a source for `url_template`.
    pub fn new(url_template: impl Into<String>, settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.read_timeout)
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            client,
            url_template: url_template.into(),
            throttle: HostThrottle::new(settings.min_request_interval),
            settings,
        })
    }

    /// The URL for `branch`.
    pub fn url_for(&self, branch: &BranchVersion) -> String {
        self.url_template.replace(BRANCH_PLACEHOLDER, branch.name())
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let request_error = |source| Error::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(request_error)?;
        Ok(body.to_vec())
    }
}

impl CatalogSource for HttpCatalogSource {
    fn location(&self, branch: &BranchVersion) -> String {
        self.url_for(branch)
    }

    fn fetch(&self, branch: &BranchVersion) -> Result<Vec<u8>> {
        let url = self.url_for(branch);
        let host = reqwest::Url::parse(&url)
            .map_err(|e| Error::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .host_str()
            .unwrap_or_default()
            .to_string();

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.settings.initial_backoff)
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0u32;
        let outcome = backoff::retry(policy, || {
            attempt += 1;
            match self.throttle.run(&host, || self.fetch_once(&url)) {
                Ok(payload) => Ok(payload),
                Err(e) if e.is_transient() && attempt <= self.settings.max_retries => {
                    tracing::debug!(%url, attempt, error = %e, "Retrying catalog fetch");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        });

        outcome.map_err(|e| match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

/// Reads catalogs from a local directory, one file per branch.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogSource {
    root: PathBuf,
}

impl DirectoryCatalogSource {
    /// Create a source reading from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The catalog file of `branch`: `<branch>.json.gz` when present,
    /// otherwise `<branch>.json`, which may not exist.
    fn catalog_path(&self, branch: &BranchVersion) -> PathBuf {
        let compressed = self.root.join(format!("{}.json.gz", branch.name()));
        if compressed.is_file() {
            compressed
        } else {
            self.root.join(format!("{}.json", branch.name()))
        }
    }
}

impl CatalogSource for DirectoryCatalogSource {
    fn location(&self, branch: &BranchVersion) -> String {
        self.catalog_path(branch).display().to_string()
    }

    fn fetch(&self, branch: &BranchVersion) -> Result<Vec<u8>> {
        let path = self.catalog_path(branch);
        if !path.is_file() {
            return Err(Error::CatalogNotFound(path));
        }
        Ok(fs::read(&path)?)
    }
}
