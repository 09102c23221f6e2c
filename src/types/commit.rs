//! Commit identity and the deduplicating commit set.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single commit in a source repository.
///
/// Identity is the pair (commit id, repository URL). Two commits built
/// independently from the same pair are equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// Commit id (usually a SHA-1).
    pub id: String,
    /// URL of the repository the commit belongs to.
    #[serde(rename = "repository")]
    pub repository_url: String,
}

impl Commit {
    /// Create a new commit reference.
    pub fn new(id: impl Into<String>, repository_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            repository_url: repository_url.into(),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.repository_url)
    }
}

/// Set of unique commits.
///
/// Used when grouping raw fix-change records into fixes: adding a commit
/// that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSet {
    data: HashSet<Commit>,
}

impl CommitSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the set contains no commits.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of commits in the set.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// All commits, in no particular order.
    pub fn elements(&self) -> Vec<Commit> {
        self.data.iter().cloned().collect()
    }

    /// Check membership.
    pub fn contains(&self, commit: &Commit) -> bool {
        self.data.contains(commit)
    }

    /// Add a commit. Idempotent.
    pub fn add(&mut self, commit: Commit) {
        self.data.insert(commit);
    }

    /// Add every commit of a slice.
    pub fn add_slice(&mut self, commits: &[Commit]) {
        self.data.extend(commits.iter().cloned());
    }

    /// Remove a commit; removing an absent commit is a no-op.
    pub fn remove(&mut self, commit: &Commit) {
        self.data.remove(commit);
    }
}

impl FromIterator<Commit> for CommitSet {
    fn from_iter<I: IntoIterator<Item = Commit>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl Extend<Commit> for CommitSet {
    fn extend<I: IntoIterator<Item = Commit>>(&mut self, iter: I) {
        self.data.extend(iter);
    }
}
