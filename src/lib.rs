//! # vulnkb-reconcile
//!
//! Deterministic reconciliation of vulnerability statements.
//!
//! Several knowledge-base sources publish statements about the same
//! vulnerability. This crate answers one question:
//!
//! > Given every statement about a vulnerability, what is the **one**
//! > statement the merged knowledge base should contain?
//!
//! ## Core Contract
//!
//! 1. Group incoming statements by vulnerability id, preserving ingestion order
//! 2. Apply the selected [`Policy`] to every group
//! 3. Produce one statement per surviving id, plus a [`MergeLog`] entry per decision
//!
//! ## Architecture
//!
//! ```text
//! Sources → Statements (+ Metadata) → Reducer::group → StatementGroups
//!                                            ↓
//!                               Policy::reduce_into → StatementGroups + MergeLog
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Statement checksums cover content only, never provenance metadata
//! - Groups are visited in vulnerability-id order
//! - Same input + same policy → identical [`MergeLog::fingerprint`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod canonical;
pub mod config;
pub mod mergelog;
pub mod reducer;

// Re-exports
pub use types::{
    Alias, Artifact, Commit, CommitSet, Fix, FixChange, FixChangeError, Metadata, Note,
    Statement, StatementGroups,
};
pub use policy::{
    Conflict, InteractivePolicy, NullPolicy, Operator, OperatorError, Policy, ReconcileError,
    ReconcileResult, Reconciler, Resolution, ResolutionMemoryStats, SmartPolicy, SoftPolicy,
    StrictPolicy,
};
pub use config::{ConfigError, MergeConfig, PolicyKind, SourceConfig};
pub use mergelog::{ExecutionId, MergeLog, MergeLogEntry};
pub use reducer::{MergeSummary, Reducer, Reduction};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes, Checksum};

/// Rank above every real source rank. Lower ranks are more trusted.
pub const RANK_CEILING: i32 = 1000;

/// Fix id used for commits that do not name a branch.
pub const DEFAULT_BRANCH: &str = "DEFAULT_BRANCH";
