//! Fixes: named groups of commits.

use std::cell::Cell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::commit::{Commit, CommitSet};
use crate::canonical::Checksum;
use crate::DEFAULT_BRANCH;

/// A group of commits that together fix a vulnerability on one branch.
///
/// `id` names the branch the fix applies to; fixes built from records
/// with no branch use [`DEFAULT_BRANCH`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fix {
    /// Branch identifier.
    pub id: String,
    /// Commits implementing the fix.
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(skip)]
    hash: Cell<Checksum>,
}

impl Fix {
    /// Create a fix for a branch.
    pub fn new(id: impl Into<String>, commits: Vec<Commit>) -> Self {
        Self {
            id: id.into(),
            commits,
            hash: Cell::new(Checksum::ZERO),
        }
    }

    /// Create a fix on the default branch.
    pub fn on_default_branch(commits: Vec<Commit>) -> Self {
        Self::new(DEFAULT_BRANCH, commits)
    }

    /// Content checksum over the fix id and each commit's URL + id.
    ///
    /// Computed on first call and cached; later mutation of `id` or
    /// `commits` is not reflected until [`Fix::reset_hash`] is called.
    pub fn hash(&self) -> Checksum {
        if self.hash.get().is_zero() {
            let mut x = String::new();
            x.push_str(&self.id);
            for c in &self.commits {
                x.push_str(&c.repository_url);
                x.push_str(&c.id);
            }
            self.hash.set(Checksum::of(x.as_bytes()));
        }
        self.hash.get()
    }

    /// Drop the cached checksum.
    pub fn reset_hash(&self) {
        self.hash.set(Checksum::ZERO);
    }

    /// Group raw fix-change records into one fix per branch.
    ///
    /// Each record's `repo_path` is either `sha` or `branch:sha`; records
    /// without a branch are grouped under [`DEFAULT_BRANCH`]. Duplicate
    /// (commit, repository) pairs within a branch collapse. Fixes come out
    /// ordered by branch name, commits ordered by (id, repository).
    pub fn group_changes(changes: &[FixChange]) -> Result<Vec<Fix>, FixChangeError> {
        let mut groups: BTreeMap<String, CommitSet> = BTreeMap::new();

        for change in changes {
            let segments: Vec<&str> = change.repo_path.split(':').collect();
            let branch = match segments.as_slice() {
                [_] => DEFAULT_BRANCH,
                [branch, _] => *branch,
                _ => {
                    return Err(FixChangeError::MalformedRepoPath(
                        change.repo_path.clone(),
                    ))
                }
            };

            groups
                .entry(branch.to_string())
                .or_default()
                .add(Commit::new(change.commit.clone(), change.repository.clone()));
        }

        Ok(groups
            .into_iter()
            .map(|(branch, set)| {
                let mut commits = set.elements();
                commits.sort();
                Fix::new(branch, commits)
            })
            .collect())
    }
}

impl PartialEq for Fix {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.commits == other.commits
    }
}

impl Eq for Fix {}

/// A raw fix-change record as reported by a vulnerability tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixChange {
    /// Repository URL.
    #[serde(rename = "repo")]
    pub repository: String,
    /// Commit id.
    pub commit: String,
    /// `sha` or `branch:sha`.
    #[serde(rename = "repoPath")]
    pub repo_path: String,
}

impl FixChange {
    /// Create a new fix-change record.
    pub fn new(
        repository: impl Into<String>,
        commit: impl Into<String>,
        repo_path: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            commit: commit.into(),
            repo_path: repo_path.into(),
        }
    }
}

/// Error raised while grouping fix-change records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixChangeError {
    /// `repo_path` had more than one `:` separator.
    #[error("Unable to parse repo path: {0}")]
    MalformedRepoPath(String),
}
