//! Tests for catalog fetching and snapshot degradation.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Mutex;

use addon_meta::{BranchList, BranchVersion};
use addon_repo::{CatalogSource, DirectoryCatalogSource, Error, Result, fetch_snapshots};
use addon_test_utils::{TestRepo, addon};
use flate2::Compression;
use flate2::write::GzEncoder;
use pretty_assertions::assert_eq;

#[test]
fn test_directory_source_yields_one_snapshot_per_branch() {
    let repo = TestRepo::new();
    repo.write_catalog("leia", &[addon("script.module.six", "1.13.0")]);
    repo.write_catalog("matrix", &[addon("script.module.six", "1.15.0")]);

    let branches = BranchList::canonical();
    let snapshots = fetch_snapshots(&DirectoryCatalogSource::new(repo.catalog_dir()), &branches);

    assert_eq!(snapshots.len(), branches.len());
    let leia = &snapshots[&BranchVersion::new("leia").unwrap()];
    assert_eq!(
        leia.find("script.module.six").unwrap().version_label(),
        "1.13.0"
    );
    assert!(leia.is_available());
    // Branches without a catalog file degrade to unavailable snapshots.
    let gotham = &snapshots[&BranchVersion::new("gotham").unwrap()];
    assert!(gotham.is_empty());
    assert!(!gotham.is_available());
}

#[test]
fn test_directory_source_prefers_gzip() {
    let repo = TestRepo::new();
    repo.write_catalog("nexus", &[addon("plain", "1.0.0")]);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"{"addons": [{"id": "compressed", "version": "2.0.0"}]}"#)
        .unwrap();
    std::fs::write(
        repo.catalog_dir().join("nexus.json.gz"),
        encoder.finish().unwrap(),
    )
    .unwrap();

    let source = DirectoryCatalogSource::new(repo.catalog_dir());
    let branches = BranchList::new(["nexus"]).unwrap();
    let snapshots = fetch_snapshots(&source, &branches);
    let nexus = snapshots.values().next().unwrap();
    assert!(nexus.contains("compressed"));
    assert!(!nexus.contains("plain"));

    let branch = branches.branch("nexus").unwrap();
    assert!(source.location(&branch).ends_with("nexus.json.gz"));
}

#[test]
fn test_directory_location_falls_back_to_plain_json() {
    let repo = TestRepo::new();
    repo.write_catalog("nexus", &[addon("plain", "1.0.0")]);
    let source = DirectoryCatalogSource::new(repo.catalog_dir());
    let branch = BranchVersion::new("nexus").unwrap();
    assert!(source.location(&branch).ends_with("nexus.json"));

    let missing = BranchVersion::new("omega").unwrap();
    assert!(source.location(&missing).ends_with("omega.json"));
    assert!(matches!(source.fetch(&missing), Err(Error::CatalogNotFound(_))));
}

#[test]
fn test_malformed_catalog_degrades_to_empty() {
    let repo = TestRepo::new();
    repo.write_file("catalogs/omega.json", "this is not json");

    let branches = BranchList::new(["omega"]).unwrap();
    let snapshots = fetch_snapshots(&DirectoryCatalogSource::new(repo.catalog_dir()), &branches);
    assert!(snapshots.values().all(|s| s.is_empty() && !s.is_available()));
}

#[test]
fn test_malformed_record_keeps_rest_of_branch() {
    let repo = TestRepo::new();
    repo.write_file(
        "catalogs/leia.json",
        r#"{"addons": [
            {"id": "good", "version": "1.0.0"},
            {"id": "bad", "requires": [{"version": "1.0"}]},
            {"id": "num", "version": 1.0}
        ]}"#,
    );

    let branches = BranchList::new(["leia"]).unwrap();
    let snapshots = fetch_snapshots(&DirectoryCatalogSource::new(repo.catalog_dir()), &branches);
    let leia = snapshots.values().next().unwrap();
    assert!(leia.is_available());
    assert_eq!(leia.len(), 1);
    assert!(leia.contains("good"));
    assert!(!leia.contains("bad"));
    assert!(!leia.contains("num"));
}

/// Fails for some branches and records every branch it was asked for.
struct FlakySource {
    failing: HashSet<&'static str>,
    requested: Mutex<Vec<String>>,
}

impl CatalogSource for FlakySource {
    fn location(&self, branch: &BranchVersion) -> String {
        format!("flaky://{branch}")
    }

    fn fetch(&self, branch: &BranchVersion) -> Result<Vec<u8>> {
        self.requested.lock().unwrap().push(branch.name().to_string());
        if self.failing.contains(branch.name()) {
            return Err(Error::Http {
                url: self.location(branch),
                status: 503,
            });
        }
        Ok(format!(r#"{{"addons": [{{"id": "only.in.{branch}", "version": "1.0.0"}}]}}"#)
            .into_bytes())
    }
}

#[test]
fn test_failed_branch_does_not_affect_others() {
    let source = FlakySource {
        failing: HashSet::from(["leia"]),
        requested: Mutex::new(Vec::new()),
    };
    let branches = BranchList::new(["krypton", "leia", "matrix"]).unwrap();
    let snapshots = fetch_snapshots(&source, &branches);

    let mut requested = source.requested.lock().unwrap().clone();
    requested.sort();
    assert_eq!(requested, vec!["krypton", "leia", "matrix"]);

    let names: Vec<&str> = snapshots.keys().map(|b| b.name()).collect();
    assert_eq!(names, vec!["krypton", "leia", "matrix"]);
    assert!(snapshots[&branches.branch("krypton").unwrap()].contains("only.in.krypton"));
    assert!(!snapshots[&branches.branch("leia").unwrap()].is_available());
    assert!(snapshots[&branches.branch("matrix").unwrap()].contains("only.in.matrix"));
}
