//! The vulnerability statement.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::{Alias, Artifact};
use super::fix::Fix;
use super::metadata::Metadata;
use super::note::Note;
use crate::canonical::Checksum;

/// A statement about one vulnerability: its aliases, notes, fixes and
/// affected artifacts, plus the provenance of the file it was read from.
///
/// ## Checksum cache
///
/// [`Statement::hash`] is computed lazily over the vulnerability id,
/// notes (text + links), fixes (repository URL + commit id of every
/// commit), artifacts (id + reason + affected flag) and aliases, and then
/// cached. Mutating any of those fields through the public fields does
/// **not** refresh the cache; call [`Statement::reset_hash`] after editing
/// a statement whose checksum was already observed. Equality is checksum
/// equality, so a stale cache shows up as a false-negative `==`.
///
/// Metadata is not part of the checksum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    /// Vulnerability identifier (the grouping key). Not validated.
    pub vulnerability_id: String,
    /// Alternative identifiers.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<Alias>,
    /// Notes, in publication order.
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Fixes, in publication order.
    #[serde(default)]
    pub fixes: Vec<Fix>,
    /// Affected (or explicitly unaffected) artifacts.
    #[serde(default, rename = "artifacts")]
    pub affected_artifacts: Vec<Artifact>,
    /// Provenance, attached at ingestion.
    #[serde(default, skip_serializing_if = "Metadata::is_unset")]
    pub metadata: Metadata,
    #[serde(skip)]
    hash: Cell<Checksum>,
}

impl Statement {
    /// Create an empty statement about a vulnerability.
    pub fn new(vulnerability_id: impl Into<String>) -> Self {
        Self {
            vulnerability_id: vulnerability_id.into(),
            ..Self::default()
        }
    }

    /// The empty statement produced by a failed reconciliation.
    pub fn void() -> Self {
        Self::default()
    }

    /// True if this is the void statement.
    pub fn is_void(&self) -> bool {
        self.vulnerability_id.is_empty()
            && self.aliases.is_empty()
            && self.notes.is_empty()
            && self.fixes.is_empty()
            && self.affected_artifacts.is_empty()
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<Alias>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    /// Add a note.
    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Add a fix.
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Add an affected artifact.
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.affected_artifacts.push(artifact);
        self
    }

    /// Attach provenance.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Trust rank of the source this statement came from.
    pub fn rank(&self) -> i32 {
        self.metadata.origin_rank
    }

    /// True if the statement carries at least one fix.
    pub fn has_fixes(&self) -> bool {
        !self.fixes.is_empty()
    }

    /// Content checksum (see the type-level docs for the caching rule).
    pub fn hash(&self) -> Checksum {
        if self.hash.get().is_zero() {
            let mut x = String::new();

            x.push_str(&self.vulnerability_id);
            for n in &self.notes {
                x.push_str(&n.text);
                for l in &n.links {
                    x.push_str(l);
                }
            }

            for f in &self.fixes {
                for c in &f.commits {
                    x.push_str(&c.repository_url);
                    x.push_str(&c.id);
                }
            }

            for a in &self.affected_artifacts {
                x.push_str(&a.id);
                x.push_str(&a.reason);
                x.push_str(if a.affected { "true" } else { "false" });
            }

            for al in &self.aliases {
                x.push_str(al.as_str());
            }

            self.hash.set(Checksum::of(x.as_bytes()));
        }
        self.hash.get()
    }

    /// Drop the cached checksum so the next [`Statement::hash`] recomputes it.
    pub fn reset_hash(&self) {
        self.hash.set(Checksum::ZERO);
    }

    /// Strip trailing slashes from every commit repository URL.
    pub fn normalize_repository_urls(&mut self) {
        for fix in &mut self.fixes {
            for commit in &mut fix.commits {
                let trimmed = commit.repository_url.trim_end_matches('/').len();
                commit.repository_url.truncate(trimmed);
            }
            fix.reset_hash();
        }
        self.reset_hash();
    }

    /// Multi-line provenance summary for logs.
    pub fn pretty_print(&self) -> String {
        format!(
            "{} (branch: {})\n  local path: {}\n  rank:       {}",
            self.metadata.origin,
            self.metadata.branch,
            self.metadata.local_path.display(),
            self.metadata.origin_rank
        )
    }

    /// Pretty JSON rendering of the statement.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Statement {}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vulnerability_id)
    }
}
