//! Grouping and reduction driver.
//!
//! The [`Reducer`] takes the statements of every source, groups them by
//! vulnerability id and hands the groups to the selected policy:
//!
//! ```text
//! statements ──group()──▶ StatementGroups ──policy.reduce_into()──▶ StatementGroups
//!                                                  │
//!                                                  └──▶ MergeLog
//! ```
//!
//! Grouping keeps ingestion order inside each group; the soft policy's
//! tie-breaking depends on it.

use std::collections::BTreeSet;
use std::fmt;

use crate::mergelog::{ExecutionId, MergeLog};
use crate::policy::{Policy, ReconcileError, Reconciler};
use crate::types::{Statement, StatementGroups};

/// Counters describing one reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Configured sources, or distinct origins among the input statements
    /// when the reducer was not told the source count.
    pub sources: usize,
    /// Input statements.
    pub input_statements: usize,
    /// Distinct vulnerability ids in the input.
    pub input_groups: usize,
    /// Output statements, void ones excluded.
    pub produced: usize,
    /// Log entries recording a failure.
    pub failed: usize,
    /// Vulnerability ids missing from the output.
    pub dropped: usize,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Merged {} sources ({} statements, {} vulnerabilities): yielded {} statements.",
            self.sources, self.input_statements, self.input_groups, self.produced
        )?;
        if self.failed > 0 {
            write!(f, " {} failed.", self.failed)?;
        }
        if self.dropped > 0 {
            write!(f, " {} dropped.", self.dropped)?;
        }
        Ok(())
    }
}

/// Result of [`Reducer::run`].
#[derive(Debug)]
pub struct Reduction {
    /// One statement per surviving vulnerability id.
    pub merged: StatementGroups,
    /// Every decision taken.
    pub log: MergeLog,
    /// Input ids the policy removed, in key order.
    pub dropped: Vec<String>,
    /// Counters.
    pub summary: MergeSummary,
}

impl Reduction {
    /// Merged statements that are not void, in key order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.merged.values().flatten().filter(|s| !s.is_void())
    }
}

/// Runs a policy over a flat list of statements.
#[derive(Debug)]
pub struct Reducer {
    policy: Policy,
    execution_id: Option<ExecutionId>,
    source_count: Option<usize>,
}

impl Reducer {
    /// Create a reducer for `policy`.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            execution_id: None,
            source_count: None,
        }
    }

    /// Report `count` sources in the summary, including sources that
    /// contributed no statement.
    pub fn with_source_count(mut self, count: usize) -> Self {
        self.source_count = Some(count);
        self
    }

    /// Use a fixed execution id instead of generating one per run.
    pub fn with_execution_id(mut self, id: ExecutionId) -> Self {
        self.execution_id = Some(id);
        self
    }

    /// The policy applied by this reducer.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Group statements by vulnerability id, keeping input order inside
    /// each group.
    pub fn group(statements: impl IntoIterator<Item = Statement>) -> StatementGroups {
        let mut groups = StatementGroups::new();
        for s in statements {
            groups.entry(s.vulnerability_id.clone()).or_default().push(s);
        }
        groups
    }

    /// Group, reduce and summarize.
    pub fn run(&self, statements: Vec<Statement>) -> Result<Reduction, ReconcileError> {
        let sources = self.source_count.unwrap_or_else(|| {
            let origins: BTreeSet<&str> = statements
                .iter()
                .map(|s| s.metadata.origin.as_str())
                .collect();
            origins.len()
        });
        let input_statements = statements.len();

        let groups = Self::group(statements);
        let input_ids: Vec<String> = groups.keys().cloned().collect();

        let execution_id = self
            .execution_id
            .clone()
            .unwrap_or_else(ExecutionId::generate);
        let mut log = MergeLog::new(execution_id);

        tracing::info!(
            execution_id = %log.execution_id(),
            policy = self.policy.name(),
            groups = input_ids.len(),
            statements = input_statements,
            "Reducing statement groups"
        );

        let merged = self.policy.reduce_into(groups, &mut log)?;

        let dropped: Vec<String> = input_ids
            .iter()
            .filter(|id| !merged.contains_key(*id))
            .cloned()
            .collect();
        for id in &dropped {
            tracing::warn!(vulnerability_id = %id, "No statement produced");
        }

        let summary = MergeSummary {
            sources,
            input_statements,
            input_groups: input_ids.len(),
            produced: merged.values().flatten().filter(|s| !s.is_void()).count(),
            failed: log.failures().count(),
            dropped: dropped.len(),
        };

        tracing::info!(
            execution_id = %log.execution_id(),
            produced = summary.produced,
            failed = summary.failed,
            dropped = summary.dropped,
            "{}",
            summary
        );

        Ok(Reduction {
            merged,
            log,
            dropped,
            summary,
        })
    }
}
