//! The strict policy: conflicts are reported, never resolved.

use super::{single_statement_comment, ReconcileError, ReconcileResult, Reconciler};
use crate::mergelog::{MergeLog, MergeLogEntry};
use crate::types::{Statement, StatementGroups};

/// Keeps vulnerabilities described by exactly one statement and drops
/// every vulnerability with more than one, logging the conflict so the
/// user can retry with another policy or merge by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl Reconciler for StrictPolicy {
    fn name(&self) -> &'static str {
        "STRICT"
    }

    /// Not a valid call path for this policy.
    ///
    /// # Panics
    ///
    /// Always. The strict policy resolves nothing; only `reduce` may be used.
    fn reconcile(&self, _candidates: &[Statement]) -> ReconcileResult {
        panic!("reconcile() must not be invoked on the strict policy");
    }

    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        let mut reduced = StatementGroups::new();

        for (id, candidates) in groups {
            let count = candidates.len();
            match count {
                0 => return Err(ReconcileError::EmptyGroup(id)),
                1 => {
                    let survivor = candidates[0].clone();
                    log.log(
                        MergeLogEntry::new(self.name(), single_statement_comment(&id), true)
                            .with_sources(candidates)
                            .with_result(survivor.clone()),
                    );
                    reduced.insert(id, vec![survivor]);
                }
                _ => {
                    tracing::warn!(
                        vulnerability_id = %id,
                        conflicting = count,
                        "Conflicting statements will not be reconciled with policy 'strict'; \
                         try another policy such as 'soft'"
                    );
                    log.log(
                        MergeLogEntry::new(
                            self.name(),
                            format!(
                                "Found {} conflicting statements about vuln. {}; won't reconcile!",
                                count, id
                            ),
                            false,
                        )
                        .with_sources(candidates),
                    );
                }
            }
        }

        Ok(reduced)
    }
}
