//! Release branch ordering.
//!
//! Every branch of the add-on repository corresponds to one release line of
//! the host application. Branches are compared purely by their position in an
//! ordered codename list, oldest first.
//!
//! # Example
//!
//! ```
//! use addon_meta::{BranchList, BranchVersion};
//!
//! let branches = BranchList::canonical();
//! let leia = branches.branch("leia").unwrap();
//! let matrix = branches.branch("matrix").unwrap();
//! assert!(matrix > leia);
//!
//! assert!(BranchVersion::new("atlantis").is_err());
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// The known release lines of the host application, oldest first.
pub const CANONICAL_BRANCHES: &[&str] = &[
    "gotham", "helix", "isengard", "jarvis", "krypton", "leia", "matrix", "nexus", "omega",
    "piers",
];

/// An ordered list of branch codenames.
///
/// Cloning is cheap; every [`BranchVersion`] handed out shares the list's
/// codename storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchList {
    names: Arc<[Arc<str>]>,
}

impl BranchList {
    /// Build a branch list from codenames ordered oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranchList`] when the list is empty or contains
    /// a duplicate or blank codename.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ordered: Vec<Arc<str>> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(Error::InvalidBranchList {
                    reason: "blank branch codename".to_string(),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(Error::InvalidBranchList {
                    reason: format!("duplicate branch codename '{name}'"),
                });
            }
            ordered.push(Arc::from(name));
        }
        if ordered.is_empty() {
            return Err(Error::InvalidBranchList {
                reason: "no branches configured".to_string(),
            });
        }
        Ok(Self {
            names: ordered.into(),
        })
    }

    /// The built-in list of host release lines.
    pub fn canonical() -> Self {
        Self {
            names: CANONICAL_BRANCHES.iter().map(|name| Arc::from(*name)).collect(),
        }
    }

    /// Look up a branch by codename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranch`] if the codename is not in the list.
    pub fn branch(&self, name: &str) -> Result<BranchVersion> {
        self.names
            .iter()
            .position(|known| known.as_ref() == name)
            .map(|index| BranchVersion {
                index,
                name: Arc::clone(&self.names[index]),
            })
            .ok_or_else(|| Error::InvalidBranch {
                name: name.to_string(),
            })
    }

    /// All branches, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = BranchVersion> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| BranchVersion {
                index,
                name: Arc::clone(name),
            })
    }

    /// The codenames, oldest first.
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|name| name.as_ref()).collect()
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list has no branches. Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BranchList {
    fn default() -> Self {
        Self::canonical()
    }
}

/// A validated position in a [`BranchList`].
///
/// Comparison uses only the list position; values taken from different lists
/// must not be mixed.
#[derive(Debug, Clone)]
pub struct BranchVersion {
    index: usize,
    name: Arc<str>,
}

impl BranchVersion {
    /// Look up a codename in the canonical branch list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranch`] for an unknown codename.
    pub fn new(name: &str) -> Result<Self> {
        BranchList::canonical().branch(name)
    }

    /// The branch codename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the branch list, `0` being the oldest branch.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for BranchVersion {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for BranchVersion {}

impl PartialOrd for BranchVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BranchVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl Hash for BranchVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for BranchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for BranchVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
