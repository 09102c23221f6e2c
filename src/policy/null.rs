//! The null policy: a no-op marker.

use super::{ReconcileError, ReconcileResult, Reconciler};
use crate::mergelog::MergeLog;
use crate::types::{Statement, StatementGroups};

/// Never reconciles anything. `reduce` hands the groups back untouched
/// and logs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPolicy;

impl Reconciler for NullPolicy {
    fn name(&self) -> &'static str {
        "NULL"
    }

    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult {
        ReconcileResult::failed(candidates, "Reconcile does nothing in the null policy")
    }

    fn reduce_into(
        &self,
        groups: StatementGroups,
        _log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        Ok(groups)
    }
}
