//! Whole-pipeline tests: catalogs on disk, add-on folders, repository scans.

use std::io::Write;

use addon_check::{CheckContext, CheckerConfig, Report, Severity, check_path};
use addon_meta::{Addon, Dependency};
use addon_repo::{CatalogDocument, DirectoryCatalogSource, fetch_snapshots};
use addon_test_utils::{TestRepo, addon, record};
use flate2::Compression;
use flate2::write::GzEncoder;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn write_gzip_catalog(repo: &TestRepo, branch: &str, addons: &[Addon]) {
    let document = CatalogDocument {
        addons: addons.iter().map(record).collect(),
    };
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(document.to_json().unwrap().as_bytes())
        .unwrap();
    std::fs::create_dir_all(repo.catalog_dir()).unwrap();
    std::fs::write(
        repo.catalog_dir().join(format!("{branch}.json.gz")),
        encoder.finish().unwrap(),
    )
    .unwrap();
}

fn python(version: &str) -> Dependency {
    Dependency::required("xbmc.python", Some(version))
}

/// A repository whose catalogs span the python ABI break at matrix.
fn multi_branch_repo() -> TestRepo {
    let repo = TestRepo::new();
    let six = |version: &str| addon("script.module.six", version).with_dependency(python("2.26.0"));
    write_gzip_catalog(
        &repo,
        "krypton",
        &[six("1.11.0"), addon("plugin.video.legacy", "0.5.0").with_dependency(
            Dependency::required("script.module.six", Some("1.11.0")),
        )],
    );
    write_gzip_catalog(&repo, "leia", &[six("1.13.0")]);
    repo.write_catalog(
        "matrix",
        &[
            addon("script.module.six", "1.15.0+matrix.1").with_dependency(python("3.0.0")),
            addon("plugin.video.modern", "2.0.0")
                .with_dependency(Dependency::required("script.module.six", Some("1.15.0"))),
        ],
    );
    repo
}

fn context(repo: &TestRepo, target: &str, review: bool, workers: usize) -> CheckContext {
    let config = CheckerConfig {
        workers,
        ..CheckerConfig::default()
    };
    let snapshots = fetch_snapshots(
        &DirectoryCatalogSource::new(repo.catalog_dir()),
        &config.branches,
    );
    CheckContext::new(config, target, snapshots)
        .unwrap()
        .with_review_mode(review)
}

fn find<'a>(report: &'a Report, artifact: &str) -> &'a Report {
    report
        .children
        .iter()
        .find(|c| c.artifact == artifact)
        .unwrap_or_else(|| panic!("no report for {artifact}"))
}

#[test]
fn test_library_update_on_leia() {
    let repo = multi_branch_repo();
    let dir = repo.add_addon(
        &addon("script.module.six", "1.14.0").with_dependency(python("2.26.0")),
        &["xbmc.python.module"],
    );

    let report = check_path(&dir, &context(&repo, "leia", true, 1)).unwrap();
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();

    assert_eq!(report.problem_count(), 0, "{messages:#?}");
    // The matrix copy sits across the ABI break and is newer: fine.
    assert!(messages.contains(
        &"script.module.six addon also exists in matrix branch but with migration compatible version: 1.15.0+matrix.1"
    ));
    assert!(messages.contains(
        &"script.module.six addon also exists in leia branch but with update compatible version: 1.13.0"
    ));
    assert!(messages.contains(
        &"script.module.six addon also exists in krypton branch but with update compatible version: 1.11.0"
    ));
    // leia publishes a different version than matrix, so the matrix
    // dependents belong to another lineage.
    assert!(messages.contains(
        &"Reverse dependencies: 0 in leia and newer [], 1 in older branches [plugin.video.legacy]"
    ));
}

#[test]
fn test_library_overtaking_newer_branch() {
    let repo = multi_branch_repo();
    let dir = repo.add_addon(
        &addon("script.module.six", "1.16.0").with_dependency(python("2.26.0")),
        &["xbmc.python.module"],
    );

    let audit = check_path(&dir, &context(&repo, "leia", false, 1)).unwrap();
    assert_eq!(audit.problem_count(), 0);
    assert_eq!(audit.warning_count(), 1);

    let review = check_path(&dir, &context(&repo, "leia", true, 1)).unwrap();
    assert_eq!(review.problem_count(), 1);
    assert!(review
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Problem && d.message.contains("Users migrating to matrix")));
}

#[rstest]
#[case(1)]
#[case(4)]
fn test_repository_scan_is_deterministic(#[case] workers: usize) {
    let repo = multi_branch_repo();
    repo.add_addon(
        &addon("plugin.video.modern", "2.1.0")
            .with_dependency(python("3.0.0"))
            .with_dependency(Dependency::required("script.module.six", Some("1.16.0"))),
        &["xbmc.python.pluginsource"],
    );
    repo.add_addon(&addon("script.module.orphan", "1.0.0").with_dependency(python("3.0.0")), &[]);
    repo.add_addon(&addon("plugin.video.broken.deps", "1.0.0"), &["xbmc.python.pluginsource"]);

    let ctx = context(&repo, "matrix", true, workers);
    let first = check_path(repo.root(), &ctx).unwrap();
    let second = check_path(repo.root(), &ctx).unwrap();
    assert_eq!(first, second);

    let names: Vec<&str> = first.children.iter().map(|c| c.artifact.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "catalogs",
            "plugin.video.broken.deps",
            "plugin.video.modern",
            "script.module.orphan"
        ]
    );

    let modern = find(&first, "plugin.video.modern");
    assert!(modern.diagnostics.iter().any(|d| d.message
        == "Version mismatch for required dependency script.module.six, required: 1.16.0, available: 1.15.0+matrix.1"));

    let orphan = find(&first, "script.module.orphan");
    assert_eq!(orphan.warning_count(), 1);
    assert_eq!(orphan.problem_count(), 0);

    let missing_python = find(&first, "plugin.video.broken.deps");
    assert!(missing_python.diagnostics.iter().any(|d| d.message
        == "xbmc.python dependency is required for xbmc.python.pluginsource extensions"));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_unreachable_catalogs_suppress_dependency_problems(#[case] review: bool) {
    let repo = TestRepo::new();
    std::fs::create_dir_all(repo.catalog_dir()).unwrap();
    let dir = repo.add_addon(
        &addon("plugin.video.lonely", "1.0.0")
            .with_dependency(python("3.0.1"))
            .with_dependency(Dependency::required("script.module.requests", Some("2.22.0")))
            .with_dependency(Dependency::optional("script.module.six", Some("1.15.0"))),
        &["xbmc.python.pluginsource"],
    );

    let report = check_path(&dir, &context(&repo, "nexus", review, 1)).unwrap();
    assert_eq!(report.problem_count(), 0);
    assert_eq!(report.warning_count(), 0);
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"Catalog of nexus is unavailable, 2 dependencies not checked against it"));
    assert!(messages.contains(&"This is a new addon."));
    assert!(!messages.iter().any(|m| m.contains("is not available in current repository")));
}

#[test]
fn test_empty_catalog_still_reports_missing_dependencies() {
    let repo = TestRepo::new();
    repo.write_catalog("nexus", &[]);
    let dir = repo.add_addon(
        &addon("plugin.video.lonely", "1.0.0")
            .with_dependency(python("3.0.1"))
            .with_dependency(Dependency::required("script.module.requests", Some("2.22.0"))),
        &["xbmc.python.pluginsource"],
    );

    let report = check_path(&dir, &context(&repo, "nexus", true, 1)).unwrap();
    assert_eq!(report.problem_count(), 1);
    assert!(report.diagnostics.iter().any(|d| d.severity == Severity::Problem
        && d.message
            == "Required dependency script.module.requests is not available in current repository."));
}
