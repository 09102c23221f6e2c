//! Statement model: statements and the values they own.

pub mod statement;
pub mod fix;
pub mod commit;
pub mod note;
pub mod artifact;
pub mod metadata;

pub use statement::Statement;
pub use fix::{Fix, FixChange, FixChangeError};
pub use commit::{Commit, CommitSet};
pub use note::Note;
pub use artifact::{Alias, Artifact};
pub use metadata::Metadata;

use std::collections::BTreeMap;

/// Candidate statements grouped by vulnerability id.
///
/// Within a group, candidates keep the order they were ingested in.
pub type StatementGroups = BTreeMap<String, Vec<Statement>>;
