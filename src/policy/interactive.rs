//! The interactive policy: an operator resolves conflicts.
//!
//! ## Purpose
//!
//! When several statements describe the same vulnerability, the policy
//! stops and asks an [`Operator`] which parts of which candidates to keep.
//! The operator answers with a [`Resolution`]: for each section (aliases,
//! fixes, notes, artifacts) the set of candidate indices to take it from.
//! Picking several candidates for a section takes the union of their
//! contents.
//!
//! ## Remembered resolutions
//!
//! Resolutions are remembered in an LRU cache keyed by the ordered
//! checksums of the candidates. Seeing the exact same conflict again
//! reuses the stored answer without asking, unless the policy was built
//! with [`InteractivePolicy::force_reresolve`].
//!
//! How the operator is reached (terminal prompt, UI, scripted answers) is
//! up to the [`Operator`] implementation.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use super::{reduce_by_reconciling, ReconcileError, ReconcileResult, Reconciler};
use crate::mergelog::MergeLog;
use crate::types::{Statement, StatementGroups};

/// Default number of remembered resolutions.
pub const DEFAULT_RESOLUTION_MEMORY: usize = 1024;

/// A conflict presented to the operator.
#[derive(Debug, Clone, Copy)]
pub struct Conflict<'a> {
    /// Vulnerability the candidates describe.
    pub vulnerability_id: &'a str,
    /// Candidates, in ingestion order. Resolutions index into this slice.
    pub candidates: &'a [Statement],
}

/// The operator's answer to a conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Candidates whose aliases are kept.
    pub aliases_from: BTreeSet<usize>,
    /// Candidates whose fixes are kept.
    pub fixes_from: BTreeSet<usize>,
    /// Candidates whose notes are kept.
    pub notes_from: BTreeSet<usize>,
    /// Candidates whose artifacts are kept.
    pub artifacts_from: BTreeSet<usize>,
    /// Message recorded in the merge log instead of the default one.
    pub log_message: Option<String>,
}

impl Resolution {
    /// Take every section from a single candidate.
    pub fn take_all_from(index: usize) -> Self {
        let only: BTreeSet<usize> = [index].into_iter().collect();
        Self {
            aliases_from: only.clone(),
            fixes_from: only.clone(),
            notes_from: only.clone(),
            artifacts_from: only,
            log_message: None,
        }
    }

    /// Set the merge-log message.
    pub fn with_log_message(mut self, message: impl Into<String>) -> Self {
        self.log_message = Some(message.into());
        self
    }

    fn max_index(&self) -> Option<usize> {
        [
            &self.aliases_from,
            &self.fixes_from,
            &self.notes_from,
            &self.artifacts_from,
        ]
        .into_iter()
        .filter_map(|s| s.last().copied())
        .max()
    }

    /// Build the statement this resolution selects.
    fn apply(&self, vulnerability_id: &str, candidates: &[Statement]) -> Result<Statement, OperatorError> {
        if let Some(index) = self.max_index() {
            if index >= candidates.len() {
                return Err(OperatorError::IndexOutOfRange {
                    index,
                    count: candidates.len(),
                });
            }
        }

        let mut merged = Statement::new(vulnerability_id);

        for &i in &self.aliases_from {
            merged.aliases.extend(candidates[i].aliases.iter().cloned());
        }
        for &i in &self.fixes_from {
            for fix in &candidates[i].fixes {
                if !merged.fixes.contains(fix) {
                    merged.fixes.push(fix.clone());
                }
            }
        }
        for &i in &self.notes_from {
            for note in &candidates[i].notes {
                if !merged.notes.iter().any(|n| n.hash() == note.hash()) {
                    merged.notes.push(note.clone());
                }
            }
        }
        for &i in &self.artifacts_from {
            for artifact in &candidates[i].affected_artifacts {
                if !merged.affected_artifacts.contains(artifact) {
                    merged.affected_artifacts.push(artifact.clone());
                }
            }
        }

        Ok(merged)
    }
}

/// Error reported by an operator, or by applying its resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperatorError {
    /// The operator declined to resolve the conflict.
    #[error("Operator aborted: {0}")]
    Aborted(String),
    /// The transport to the operator failed.
    #[error("Operator transport failed: {0}")]
    Transport(String),
    /// The resolution refers to a candidate that does not exist.
    #[error("Selection refers to candidate {index} but only {count} candidates exist")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of candidates.
        count: usize,
    },
}

/// Someone (or something) able to resolve conflicts.
pub trait Operator: Send {
    /// Resolve one conflict.
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Result<Resolution, OperatorError>;
}

impl<F> Operator for F
where
    F: FnMut(&Conflict<'_>) -> Result<Resolution, OperatorError> + Send,
{
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Result<Resolution, OperatorError> {
        self(conflict)
    }
}

/// Key identifying a conflict: xxh64 over the ordered candidate checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ConflictKey(u64);

impl ConflictKey {
    fn compute(candidates: &[Statement]) -> Self {
        let mut hasher = Xxh64::new(0);
        for c in candidates {
            hasher.update(c.hash().as_bytes());
        }
        Self(hasher.digest())
    }
}

/// Resolution memory statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionMemoryStats {
    /// Remembered resolutions.
    pub len: usize,
    /// Maximum capacity.
    pub cap: usize,
}

/// Delegates conflicts to an [`Operator`] and remembers the answers.
pub struct InteractivePolicy {
    operator: Mutex<Box<dyn Operator>>,
    memory: Mutex<LruCache<ConflictKey, Resolution>>,
    force_reresolve: bool,
}

impl InteractivePolicy {
    /// Create a policy with the default memory size.
    pub fn new(operator: Box<dyn Operator>) -> Self {
        Self::with_memory(operator, DEFAULT_RESOLUTION_MEMORY)
    }

    /// Create a policy remembering up to `capacity` resolutions.
    pub fn with_memory(operator: Box<dyn Operator>, capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            operator: Mutex::new(operator),
            memory: Mutex::new(LruCache::new(size)),
            force_reresolve: false,
        }
    }

    /// Always ask the operator, even for remembered conflicts. Fresh
    /// answers still replace the remembered ones.
    pub fn force_reresolve(mut self, force: bool) -> Self {
        self.force_reresolve = force;
        self
    }

    /// Memory statistics.
    pub fn memory_stats(&self) -> ResolutionMemoryStats {
        let memory = self.memory.lock();
        ResolutionMemoryStats {
            len: memory.len(),
            cap: memory.cap().get(),
        }
    }

    /// Forget every remembered resolution.
    pub fn forget_all(&self) {
        self.memory.lock().clear();
    }

    fn remembered(&self, key: ConflictKey) -> Option<Resolution> {
        if self.force_reresolve {
            return None;
        }
        self.memory.lock().get(&key).cloned()
    }
}

impl fmt::Debug for InteractivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractivePolicy")
            .field("memory", &self.memory_stats())
            .field("force_reresolve", &self.force_reresolve)
            .finish_non_exhaustive()
    }
}

impl Reconciler for InteractivePolicy {
    fn name(&self) -> &'static str {
        "INTERACTIVE"
    }

    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult {
        let Some(first) = candidates.first() else {
            return ReconcileResult::failed(candidates, "No statements to reconcile");
        };
        let vuln_id = first.vulnerability_id.as_str();
        let key = ConflictKey::compute(candidates);

        let (resolution, source) = match self.remembered(key) {
            Some(r) => (r, "remembered selection"),
            None => {
                let conflict = Conflict {
                    vulnerability_id: vuln_id,
                    candidates,
                };
                match self.operator.lock().resolve(&conflict) {
                    Ok(r) => {
                        self.memory.lock().put(key, r.clone());
                        (r, "operator selection")
                    }
                    Err(e) => {
                        tracing::warn!(vulnerability_id = %vuln_id, error = %e, "Operator did not resolve conflict");
                        return ReconcileResult::failed(
                            candidates,
                            format!("Could not reconcile vuln. '{}': {}", vuln_id, e),
                        );
                    }
                }
            }
        };

        match resolution.apply(vuln_id, candidates) {
            Ok(merged) => {
                tracing::info!(vulnerability_id = %vuln_id, source, "Reconciled by operator");
                let comment = resolution.log_message.clone().unwrap_or_else(|| {
                    format!(
                        "Reconciled {} statements about vuln. '{}' ({})",
                        candidates.len(),
                        vuln_id,
                        source
                    )
                });
                ReconcileResult::reconciled(merged, candidates, comment)
            }
            Err(e) => {
                // A bad answer must not be replayed automatically.
                self.memory.lock().pop(&key);
                tracing::warn!(vulnerability_id = %vuln_id, error = %e, "Invalid resolution");
                ReconcileResult::failed(
                    candidates,
                    format!("Could not reconcile vuln. '{}': {}", vuln_id, e),
                )
            }
        }
    }

    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        reduce_by_reconciling(self, groups, log)
    }
}
