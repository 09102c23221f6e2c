//! The smart policy.
//!
//! Meant to reconcile tier by tier (candidates grouped by source rank,
//! each tier resolved before moving to the next). Rank tiering is not
//! implemented yet: [`rank_tiers`] returns every candidate as one tier and
//! the policy only carries the vulnerability id forward. It always
//! reports success and never merges fixes, notes, aliases or artifacts.

use super::{ReconcileError, ReconcileResult, Reconciler};
use crate::mergelog::MergeLog;
use crate::types::{Statement, StatementGroups};

/// Placeholder for rank-tiered reconciliation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartPolicy;

/// Group candidates into rank tiers.
///
/// Currently a single tier holding every candidate, in input order.
pub fn rank_tiers(candidates: &[Statement]) -> Vec<&[Statement]> {
    vec![candidates]
}

impl Reconciler for SmartPolicy {
    fn name(&self) -> &'static str {
        "SMART"
    }

    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult {
        let Some(first) = candidates.first() else {
            return ReconcileResult::failed(candidates, "No statements to reconcile");
        };
        let vuln_id = first.vulnerability_id.clone();

        for tier in rank_tiers(candidates) {
            for c in tier {
                tracing::debug!(
                    vulnerability_id = %vuln_id,
                    rank = c.rank(),
                    "Examining candidate"
                );
            }
        }

        ReconcileResult::reconciled(
            Statement::new(vuln_id.clone()),
            candidates,
            format!(
                "Reconciled {} statements about vuln. '{}'",
                candidates.len(),
                vuln_id
            ),
        )
    }

    /// Every group, including groups of one, goes through `reconcile`.
    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        let mut reduced = StatementGroups::new();

        for (id, candidates) in groups {
            if candidates.is_empty() {
                return Err(ReconcileError::EmptyGroup(id));
            }
            let result = self.reconcile(&candidates);
            log.log(result.to_log_entry(self.name()));
            reduced.insert(id, vec![result.into_statement()]);
        }

        Ok(reduced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commit, Fix, Metadata, Note};

    fn stmt(rank: i32) -> Statement {
        Statement::new("cve_id1")
            .with_alias("bug-A")
            .with_note(Note::plain("Text_8"))
            .with_fix(Fix::new("2.x", vec![Commit::new("abcd1234", "https://github.com/abc/def")]))
            .with_metadata(Metadata::new("repo_1", "master", rank))
    }

    #[test]
    fn test_single_tier() {
        let candidates = vec![stmt(3), stmt(4), stmt(3)];
        let tiers = rank_tiers(&candidates);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].len(), 3);
    }

    #[test]
    fn test_always_succeeds_with_id_only() {
        // Same-rank fix bearers would conflict under the soft policy.
        let candidates = vec![stmt(3), stmt(3)];
        let result = SmartPolicy.reconcile(&candidates);

        assert!(result.success());
        let s = result.statement();
        assert_eq!(s.vulnerability_id, "cve_id1");
        assert!(s.fixes.is_empty());
        assert!(s.notes.is_empty());
        assert!(s.aliases.is_empty());
    }

    #[test]
    fn test_reduce_rewrites_every_group() {
        let mut groups = StatementGroups::new();
        groups.insert("cve_id1".to_string(), vec![stmt(3), stmt(3)]);
        groups.insert("cve_id2".to_string(), vec![Statement::new("cve_id2").with_alias("x")]);

        let (reduced, log) = SmartPolicy.reduce(groups).unwrap();

        assert_eq!(log.len(), 2);
        assert!(log.entries().iter().all(|e| e.success()));
        assert_eq!(reduced["cve_id2"][0], Statement::new("cve_id2"));
        assert!(reduced["cve_id1"][0].fixes.is_empty());
    }
}
