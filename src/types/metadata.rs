//! Provenance of a statement.
//!
//! Metadata records where a statement came from. It is attached by the
//! ingestion layer when a statement file is read from a source
//! repository and is never computed or altered by reconciliation. It is
//! also excluded from the statement checksum: two sources publishing the
//! same content produce statements with the same checksum.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Provenance of a statement: source repository, branch, trust rank and
/// the local path of the backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// URL of the source repository.
    pub origin: String,
    /// Branch of the source repository.
    pub branch: String,
    /// Trust rank of the source; lower value = more trusted.
    pub origin_rank: i32,
    /// Directory of the statement file in the local clone.
    pub local_path: PathBuf,
}

impl Metadata {
    /// Create metadata for a source.
    pub fn new(origin: impl Into<String>, branch: impl Into<String>, origin_rank: i32) -> Self {
        Self {
            origin: origin.into(),
            branch: branch.into(),
            origin_rank,
            local_path: PathBuf::new(),
        }
    }

    /// Set the local path of the statement file.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = path.into();
        self
    }

    /// True for statements that were never attached to a source, such as
    /// reconciliation output.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}
