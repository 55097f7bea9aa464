//! Add-on version ordering.
//!
//! Add-on versions follow PEP 440 ordering with the legacy extensions that
//! published add-ons still rely on:
//!
//! - `~alpha` / `~beta` pre-release markers (`1.0.0~beta2`) read as `1.0.0beta2`
//! - a trailing `-N` is a post release, so `1.0.0-1 > 1.0.0`
//! - a `+tag` local identifier only breaks ties between equal releases and
//!   compares case-insensitively
//!
//! Parsing never fails. Strings outside the release grammar become legacy
//! versions, which sort below every well-formed version and among themselves
//! by their alphanumeric runs.
//!
//! # Examples
//!
//! ```
//! use addon_meta::AddonVersion;
//!
//! assert!(AddonVersion::parse("1.0.0+matrix.1") > AddonVersion::parse("1.0.0+leia.1"));
//! assert!(AddonVersion::parse("0.5.4.1") > AddonVersion::parse("0.5.4+matrix.1"));
//! assert!(AddonVersion::parse("1.0.0~beta") > AddonVersion::parse("1.0.0~alpha"));
//! assert_eq!(AddonVersion::parse("1.0.0+leia.1"), AddonVersion::parse("1.0.0+Leia.1"));
//! ```

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static RELEASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .unwrap()
});

/// The shape accepted for the version attribute of a submitted manifest,
/// e.g. `1.0.0`, `1.0.0+matrix.1` or `1.2.0~beta1`.
static WELL_FORMED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+(\.\d+){0,4}([+~\w]+(\.\d+)?)?)$").unwrap());

/// A totally ordered add-on version.
///
/// Equality, ordering and hashing all go through the normalized sort key, so
/// `1.0` and `1.0.0` are the same version while [`Display`](fmt::Display)
/// still shows the string the version was parsed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AddonVersion {
    raw: String,
    key: VersionKey,
}

impl AddonVersion {
    /// Parse a version string. Every input yields a version.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let key = VersionKey::from_normalized(&normalize(&raw));
        Self { raw, key }
    }

    /// The version string as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the string fell outside the release grammar.
    ///
    /// Legacy versions still order deterministically but sort below every
    /// release.
    pub fn is_legacy(&self) -> bool {
        matches!(self.key, VersionKey::Legacy(_))
    }

    /// Check a manifest version attribute against the accepted
    /// `major.minor[.patch...][+local|~pre]` shape.
    pub fn is_well_formed(raw: &str) -> bool {
        WELL_FORMED_PATTERN.is_match(raw)
    }
}

fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    if lowered.contains("~alpha") || lowered.contains("~beta") {
        lowered.replace('~', "")
    } else {
        lowered
    }
}

impl PartialEq for AddonVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for AddonVersion {}

impl PartialOrd for AddonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AddonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for AddonVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for AddonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for AddonVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for AddonVersion {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for AddonVersion {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<AddonVersion> for String {
    fn from(version: AddonVersion) -> Self {
        version.raw
    }
}

/// Sort key. Variant order matters: every legacy version sorts below every
/// release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum VersionKey {
    Legacy(Vec<LegacyPart>),
    Release(ReleaseKey),
}

/// Field order is comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ReleaseKey {
    epoch: u64,
    /// Numeric segments with trailing zeros removed.
    release: Vec<u64>,
    pre: PreRelease,
    post: Option<u64>,
    dev: DevRelease,
    /// Empty when there is no local identifier.
    local: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreRelease {
    /// A bare `.devN` release sorts below every pre-release of the same version.
    DevOnly,
    Marked(PreLabel, u64),
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreLabel {
    Alpha,
    Beta,
    Candidate,
}

impl PreLabel {
    fn from_label(label: &str) -> Self {
        match label {
            "a" | "alpha" => Self::Alpha,
            "b" | "beta" => Self::Beta,
            _ => Self::Candidate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DevRelease {
    Dev(u64),
    Final,
}

/// One run of a local identifier or legacy version. Text sorts below numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Segment {
    Text(String),
    Number(u64),
}

type LegacyPart = Segment;

impl Segment {
    fn from_run(run: &str) -> Self {
        if !run.is_empty() && run.bytes().all(|b| b.is_ascii_digit()) {
            Self::Number(saturating_number(run))
        } else {
            Self::Text(run.to_string())
        }
    }
}

/// Out-of-range numbers collapse to `u64::MAX` so parsing stays total.
fn saturating_number(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

impl VersionKey {
    fn from_normalized(normalized: &str) -> Self {
        match RELEASE_PATTERN.captures(normalized) {
            Some(caps) => Self::Release(ReleaseKey::from_captures(&caps)),
            None => Self::Legacy(legacy_parts(normalized)),
        }
    }
}

impl ReleaseKey {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let number = |name: &str| caps.name(name).map(|m| saturating_number(m.as_str()));

        let mut release: Vec<u64> = caps["release"].split('.').map(saturating_number).collect();
        while release.last() == Some(&0) {
            release.pop();
        }

        let post = number("post_n1").or_else(|| {
            caps.name("post_l")
                .map(|_| number("post_n2").unwrap_or(0))
        });
        let dev = caps.name("dev_l").map(|_| number("dev_n").unwrap_or(0));

        let pre = match caps.name("pre_l") {
            Some(label) => PreRelease::Marked(
                PreLabel::from_label(label.as_str()),
                number("pre_n").unwrap_or(0),
            ),
            None if post.is_none() && dev.is_some() => PreRelease::DevOnly,
            None => PreRelease::Final,
        };

        let local = caps
            .name("local")
            .map(|m| {
                m.as_str()
                    .split(['-', '_', '.'])
                    .map(Segment::from_run)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            epoch: number("epoch").unwrap_or(0),
            release,
            pre,
            post,
            dev: dev.map_or(DevRelease::Final, DevRelease::Dev),
            local,
        }
    }
}

/// Split a free-form string into alternating digit and letter runs,
/// dropping everything else.
fn legacy_parts(normalized: &str) -> Vec<LegacyPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in normalized.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                parts.push(Segment::from_run(&current));
                current.clear();
            }
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            parts.push(Segment::from_run(&current));
            current.clear();
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(Segment::from_run(&current));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> AddonVersion {
        AddonVersion::parse(s)
    }

    #[test]
    fn test_simple_patch_minor_major() {
        assert!(v("1.0.1") > v("1.0.0"));
        assert!(v("1.1.0") > v("1.0.0"));
        assert!(v("2.0.0") > v("1.0.0"));
    }

    #[test]
    fn test_local_identifier_orders_after_release() {
        assert!(v("1.0.0+matrix.1") > v("1.0.0+leia.1"));
        assert!(v("1.0.0+matrix.1") > v("1.0.0"));
        assert!(v("1.0.0+matrix.2") > v("1.0.0+matrix.1"));
    }

    #[test]
    fn test_local_identifier_case_insensitive() {
        assert_eq!(v("1.0.0+leia.1"), v("1.0.0+Leia.1"));
    }

    #[test]
    fn test_longer_release_beats_local_identifier() {
        assert!(v("0.5.4.1") > v("0.5.4+matrix.1"));
        assert!(v("0.5.4.1") > v("0.5.4"));
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("2"), v("2.0.0.0"));
    }

    #[test]
    fn test_legacy_revision_is_post_release() {
        assert!(v("1.0.0-1") > v("1.0.0"));
        assert!(v("1.0.0-2") > v("1.0.0-1"));
        assert!(v("1.0.1") > v("1.0.0-5"));
    }

    #[test]
    fn test_tilde_pre_releases() {
        assert!(v("1.0.0~beta2") > v("1.0.0~beta1"));
        assert!(v("1.0.0~beta") > v("1.0.0~alpha"));
        assert!(v("1.0.0~alpha3") > v("1.0.0~alpha2"));
        assert!(v("1.0.0") > v("1.0.0~beta9"));
        assert_eq!(v("1.1.0~beta01"), v("1.1.0beta1"));
    }

    #[test]
    fn test_dev_releases_sort_first() {
        assert!(v("1.0.0.dev1") < v("1.0.0a1"));
        assert!(v("1.0.0a1.dev1") < v("1.0.0a1"));
        assert!(v("1.0.0.post1.dev1") < v("1.0.0.post1"));
    }

    #[test]
    fn test_epoch_dominates() {
        assert!(v("1!0.1") > v("99.0"));
    }

    #[test]
    fn test_unparseable_is_legacy_and_lowest() {
        let legacy = v("someinvalidversion");
        assert!(legacy.is_legacy());
        assert!(legacy < v("0.0.1"));
        assert!(!v("1.2.3").is_legacy());
    }

    #[test]
    fn test_legacy_versions_order_among_themselves() {
        assert!(v("2.3.0-backported-leia") > v("2.2.0-backported-leia"));
        assert_eq!(v("foo"), v("FOO"));
    }

    #[test]
    fn test_display_keeps_original_text() {
        assert_eq!(v(" 1.0.0+Leia.1 ").to_string(), "1.0.0+Leia.1");
    }

    #[test]
    fn test_serde_as_string() {
        let version: AddonVersion = serde_json::from_str("\"2.26.0\"").unwrap();
        assert_eq!(version, v("2.26.0"));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"2.26.0\"");
    }

    #[test]
    fn test_well_formed() {
        assert!(AddonVersion::is_well_formed("1.0.1"));
        assert!(AddonVersion::is_well_formed("1.0.1+matrix.1"));
        assert!(AddonVersion::is_well_formed("1.0.1+matrix.2"));
        assert!(AddonVersion::is_well_formed("1.2.0~beta1"));
        assert!(!AddonVersion::is_well_formed("someinvalidversion"));
        assert!(!AddonVersion::is_well_formed("2.3.0-backported-Leia"));
    }
}
