//! The soft policy: reconcile by union and source rank.
//!
//! ## Rules
//!
//! | Section | Rule |
//! |---------|------|
//! | Aliases | union of every candidate's aliases |
//! | Fixes + notes | taken together from the most trusted candidate that has fixes |
//! | Notes of fix-less candidates | appended, whatever their rank |
//! | Artifacts | union by artifact id; the most trusted candidate's record wins |
//!
//! ## Rank selection
//!
//! Lower rank = more trusted. The running best rank starts at
//! [`RANK_CEILING`]. For each fix-bearing candidate, in candidate order:
//!
//! - rank above the best: ignored
//! - rank below the best: replaces the selection outright
//! - rank equal to the best: conflict
//!
//! A conflict at the final best rank fails the whole group: the result is
//! the void statement and nothing is partially merged.

use std::collections::HashSet;

use super::{reduce_by_reconciling, ReconcileError, ReconcileResult, Reconciler};
use crate::mergelog::MergeLog;
use crate::types::{Artifact, Note, Statement, StatementGroups};
use crate::RANK_CEILING;

/// Reconciles conflicting statements automatically, preferring the most
/// trusted source for fixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftPolicy;

/// Two or more fix-bearing candidates share the best rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SameRankConflict {
    rank: i32,
    count: usize,
}

impl SoftPolicy {
    /// Union of all candidates' aliases.
    fn reconcile_aliases(candidates: &[Statement], merged: &mut Statement) {
        for c in candidates {
            merged.aliases.extend(c.aliases.iter().cloned());
        }
    }

    /// Select fixes and notes by rank; see the module docs.
    fn reconcile_fixes_and_notes(
        candidates: &[Statement],
        merged: &mut Statement,
    ) -> Result<(), SameRankConflict> {
        let mut top_rank = RANK_CEILING;
        let mut count_top_rank = 0usize;
        let mut selected: Option<&Statement> = None;
        let mut additional_notes: Vec<Note> = Vec::new();

        for c in candidates {
            if !c.has_fixes() {
                additional_notes.extend(c.notes.iter().cloned());
                continue;
            }

            if c.rank() > top_rank {
                continue;
            }

            if c.rank() == top_rank {
                count_top_rank += 1;
                continue;
            }

            count_top_rank = 1;
            top_rank = c.rank();
            merged.notes = c.notes.clone();
            merged.fixes = c.fixes.clone();
            selected = Some(c);
        }

        merged.notes.extend(additional_notes);

        if count_top_rank > 1 {
            return Err(SameRankConflict {
                rank: top_rank,
                count: count_top_rank,
            });
        }

        if let Some(s) = selected {
            tracing::info!(
                vulnerability_id = %merged.vulnerability_id,
                origin = %s.metadata.origin,
                branch = %s.metadata.branch,
                rank = top_rank,
                "Reconciled by taking the fixes from top-rank source"
            );
        }

        Ok(())
    }

    /// Union of artifacts by id, visiting candidates from most to least
    /// trusted (candidate order breaks ties).
    fn reconcile_artifacts(candidates: &[Statement], merged: &mut Statement) {
        let mut by_rank: Vec<&Statement> = candidates.iter().collect();
        by_rank.sort_by_key(|c| c.rank());

        let mut seen: HashSet<&str> = HashSet::new();
        let mut artifacts: Vec<Artifact> = Vec::new();
        for c in by_rank {
            for a in &c.affected_artifacts {
                if seen.insert(a.id.as_str()) {
                    artifacts.push(a.clone());
                }
            }
        }
        merged.affected_artifacts = artifacts;
    }
}

impl Reconciler for SoftPolicy {
    fn name(&self) -> &'static str {
        "SOFT"
    }

    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult {
        let Some(first) = candidates.first() else {
            return ReconcileResult::failed(candidates, "No statements to reconcile");
        };
        let vuln_id = first.vulnerability_id.clone();

        tracing::info!(
            vulnerability_id = %vuln_id,
            sources = candidates.len(),
            "Reconciling fixes"
        );
        for c in candidates {
            tracing::debug!(
                vulnerability_id = %vuln_id,
                origin = %c.metadata.origin,
                branch = %c.metadata.branch,
                rank = c.rank(),
                "Using source"
            );
        }

        let mut merged = Statement::new(vuln_id.clone());
        Self::reconcile_aliases(candidates, &mut merged);

        if let Err(conflict) = Self::reconcile_fixes_and_notes(candidates, &mut merged) {
            tracing::warn!(
                vulnerability_id = %vuln_id,
                rank = conflict.rank,
                conflicting = conflict.count,
                "Same-rank origins disagree"
            );
            return ReconcileResult::failed(
                candidates,
                format!("Same-rank origins disagree on vulnerability {}", vuln_id),
            );
        }

        Self::reconcile_artifacts(candidates, &mut merged);

        ReconcileResult::reconciled(
            merged,
            candidates,
            format!(
                "Reconciled {} statements about vuln. '{}'",
                candidates.len(),
                vuln_id
            ),
        )
    }

    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        reduce_by_reconciling(self, groups, log)
    }
}
