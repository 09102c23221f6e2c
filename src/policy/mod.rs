//! Reconciliation policies.
//!
//! A policy decides how several candidate statements about the same
//! vulnerability become one canonical statement. Every policy offers the
//! same two operations through [`Reconciler`]:
//!
//! - `reconcile`: turn one group of candidates into a [`ReconcileResult`]
//! - `reduce`: apply the policy to every group of a [`StatementGroups`]
//!   mapping, logging one [`MergeLogEntry`] per group
//!
//! | Policy | Groups of one | Groups of many |
//! |--------|---------------|----------------|
//! | `Null` | passed through, not logged | passed through, not logged |
//! | `Strict` | kept | dropped, logged as failed |
//! | `Soft` | kept | union of aliases, fixes/notes of the most trusted source |
//! | `Smart` | id only | id only (placeholder) |
//! | `Interactive` | kept | operator selection, remembered |

pub mod null;
pub mod strict;
pub mod soft;
pub mod smart;
pub mod interactive;

pub use null::NullPolicy;
pub use strict::StrictPolicy;
pub use soft::SoftPolicy;
pub use smart::SmartPolicy;
pub use interactive::{
    Conflict, InteractivePolicy, Operator, OperatorError, Resolution, ResolutionMemoryStats,
};

use crate::config::{ConfigError, PolicyKind};
use crate::mergelog::{ExecutionId, MergeLog, MergeLogEntry};
use crate::types::{Statement, StatementGroups};

/// Hard error raised while reducing statement groups.
///
/// Conflicts between candidates are not errors; they are reported through
/// [`ReconcileResult::success`] and the merge log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A vulnerability id was mapped to an empty candidate list.
    #[error("No candidate statements for vulnerability {0}")]
    EmptyGroup(String),
}

/// Outcome of reconciling one group of candidates.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    reconciled: Statement,
    candidates: Vec<Statement>,
    comment: String,
    success: bool,
}

impl ReconcileResult {
    /// A successful reconciliation.
    pub fn reconciled(
        statement: Statement,
        candidates: &[Statement],
        comment: impl Into<String>,
    ) -> Self {
        Self {
            reconciled: statement,
            candidates: candidates.to_vec(),
            comment: comment.into(),
            success: true,
        }
    }

    /// A failed reconciliation; the resulting statement is void.
    pub fn failed(candidates: &[Statement], comment: impl Into<String>) -> Self {
        Self {
            reconciled: Statement::void(),
            candidates: candidates.to_vec(),
            comment: comment.into(),
            success: false,
        }
    }

    /// The resulting statement (void on failure).
    pub fn statement(&self) -> &Statement {
        &self.reconciled
    }

    /// Every candidate that was considered.
    pub fn candidates(&self) -> &[Statement] {
        &self.candidates
    }

    /// Human-readable explanation.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Whether reconciliation succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Turn the result into a merge-log entry for `policy`.
    pub fn to_log_entry(&self, policy: &str) -> MergeLogEntry {
        MergeLogEntry::new(policy, self.comment.clone(), self.success)
            .with_sources(self.candidates.clone())
            .with_result(self.reconciled.clone())
    }

    /// Take the resulting statement.
    pub fn into_statement(self) -> Statement {
        self.reconciled
    }
}

/// Capability shared by every policy.
pub trait Reconciler {
    /// Policy name as written in merge logs.
    fn name(&self) -> &'static str;

    /// Reconcile the candidates of one vulnerability.
    ///
    /// All candidates are expected to share one vulnerability id; this is
    /// not checked. The input is never modified.
    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult;

    /// Reduce every group, appending one entry per decision to `log`.
    ///
    /// Surviving keys map to exactly one statement.
    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError>;

    /// Reduce every group into a fresh merge log with a new execution id.
    fn reduce(&self, groups: StatementGroups) -> Result<(StatementGroups, MergeLog), ReconcileError> {
        let mut log = MergeLog::new(ExecutionId::generate());
        let reduced = self.reduce_into(groups, &mut log)?;
        Ok((reduced, log))
    }
}

/// The policy selected for a run.
#[derive(Debug)]
pub enum Policy {
    /// Does nothing.
    Null(NullPolicy),
    /// Refuses to reconcile conflicts.
    Strict(StrictPolicy),
    /// Reconciles by union and source rank.
    Soft(SoftPolicy),
    /// Placeholder for rank-tiered reconciliation.
    Smart(SmartPolicy),
    /// Delegates conflicts to an operator.
    Interactive(InteractivePolicy),
}

impl Policy {
    /// The null policy.
    pub fn null() -> Self {
        Self::Null(NullPolicy)
    }

    /// The strict policy.
    pub fn strict() -> Self {
        Self::Strict(StrictPolicy)
    }

    /// The soft policy.
    pub fn soft() -> Self {
        Self::Soft(SoftPolicy)
    }

    /// The smart policy.
    pub fn smart() -> Self {
        Self::Smart(SmartPolicy)
    }

    /// The interactive policy, resolving conflicts through `operator`.
    pub fn interactive(operator: impl Operator + 'static) -> Self {
        Self::Interactive(InteractivePolicy::new(Box::new(operator)))
    }

    /// Build the policy named by configuration.
    ///
    /// The interactive policy needs an operator; the others ignore it.
    pub fn from_kind(
        kind: PolicyKind,
        operator: Option<Box<dyn Operator>>,
    ) -> Result<Self, ConfigError> {
        Ok(match kind {
            PolicyKind::None => Self::null(),
            PolicyKind::Strict => Self::strict(),
            PolicyKind::Soft => Self::soft(),
            PolicyKind::Smart => Self::smart(),
            PolicyKind::Interactive => {
                let operator = operator.ok_or(ConfigError::OperatorRequired)?;
                Self::Interactive(InteractivePolicy::new(operator))
            }
        })
    }

    /// Which kind of policy this is.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Null(_) => PolicyKind::None,
            Self::Strict(_) => PolicyKind::Strict,
            Self::Soft(_) => PolicyKind::Soft,
            Self::Smart(_) => PolicyKind::Smart,
            Self::Interactive(_) => PolicyKind::Interactive,
        }
    }

    fn as_reconciler(&self) -> &dyn Reconciler {
        match self {
            Self::Null(p) => p,
            Self::Strict(p) => p,
            Self::Soft(p) => p,
            Self::Smart(p) => p,
            Self::Interactive(p) => p,
        }
    }
}

impl Reconciler for Policy {
    fn name(&self) -> &'static str {
        self.as_reconciler().name()
    }

    fn reconcile(&self, candidates: &[Statement]) -> ReconcileResult {
        self.as_reconciler().reconcile(candidates)
    }

    fn reduce_into(
        &self,
        groups: StatementGroups,
        log: &mut MergeLog,
    ) -> Result<StatementGroups, ReconcileError> {
        self.as_reconciler().reduce_into(groups, log)
    }
}

/// Comment logged when a group has a single candidate.
pub(crate) fn single_statement_comment(vulnerability_id: &str) -> String {
    format!("Found a single statement about vuln. '{}'", vulnerability_id)
}

/// Reduce driver shared by the policies that reconcile conflicting groups.
///
/// Groups of one pass through; larger groups go through
/// `policy.reconcile`. Each group keeps exactly one statement, void when
/// reconciliation failed.
pub(crate) fn reduce_by_reconciling<R: Reconciler + ?Sized>(
    policy: &R,
    groups: StatementGroups,
    log: &mut MergeLog,
) -> Result<StatementGroups, ReconcileError> {
    let mut reduced = StatementGroups::new();

    for (id, candidates) in groups {
        let (entry, survivor) = match candidates.len() {
            0 => return Err(ReconcileError::EmptyGroup(id)),
            1 => {
                let survivor = candidates[0].clone();
                let entry = MergeLogEntry::new(policy.name(), single_statement_comment(&id), true)
                    .with_sources(candidates)
                    .with_result(survivor.clone());
                (entry, survivor)
            }
            _ => {
                let result = policy.reconcile(&candidates);
                let entry = result.to_log_entry(policy.name());
                (entry, result.into_statement())
            }
        };

        log.log(entry);
        reduced.insert(id, vec![survivor]);
    }

    Ok(reduced)
}
