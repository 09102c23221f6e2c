//! Merge log: the audit trail of one reconciliation run.
//!
//! Every vulnerability group a policy processes produces exactly one
//! [`MergeLogEntry`]. Entries are appended in processing order and are
//! never reordered, deduplicated or removed. A [`MergeLog`] belongs to a
//! single run: logging an entry stamps it with the log's [`ExecutionId`],
//! whatever id the entry carried before.
//!
//! Writing the log somewhere is left to the caller. The log offers a
//! text rendering ([`MergeLog::render`]), `serde` serialization, and a
//! [`MergeLog::fingerprint`] that ignores execution ids and timestamps so
//! that two runs over the same input can be compared.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::canonical_hash_hex;
use crate::types::Statement;

/// Identifier of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh `exec_<uuid>` identifier.
    pub fn generate() -> Self {
        Self(format!("exec_{}", Uuid::new_v4().simple()))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reconciliation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeLogEntry {
    execution_id: ExecutionId,
    timestamp: DateTime<Utc>,
    source_statements: Vec<Statement>,
    resulting_statement: Statement,
    policy: String,
    log_message: String,
    success: bool,
}

impl MergeLogEntry {
    /// Create an entry for a decision taken by `policy`.
    ///
    /// The entry is timestamped now; sources and result start empty.
    pub fn new(policy: impl Into<String>, log_message: impl Into<String>, success: bool) -> Self {
        Self {
            execution_id: ExecutionId::default(),
            timestamp: Utc::now(),
            source_statements: Vec::new(),
            resulting_statement: Statement::void(),
            policy: policy.into(),
            log_message: log_message.into(),
            success,
        }
    }

    /// Set the statements that were considered.
    pub fn with_sources(mut self, sources: Vec<Statement>) -> Self {
        self.source_statements = sources;
        self
    }

    /// Set the statement the decision produced.
    pub fn with_result(mut self, statement: Statement) -> Self {
        self.resulting_statement = statement;
        self
    }

    /// Set the execution id. Overwritten when the entry is logged.
    pub fn with_execution_id(mut self, id: ExecutionId) -> Self {
        self.execution_id = id;
        self
    }

    /// Execution id of the run this entry belongs to.
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// When the decision was taken.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Statements that were considered.
    pub fn source_statements(&self) -> &[Statement] {
        &self.source_statements
    }

    /// Statement the decision produced (void on failure).
    pub fn resulting_statement(&self) -> &Statement {
        &self.resulting_statement
    }

    /// Name of the policy that took the decision.
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// Human-readable explanation.
    pub fn log_message(&self) -> &str {
        &self.log_message
    }

    /// Whether the group was reconciled.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Vulnerability the decision is about.
    pub fn vulnerability_id(&self) -> &str {
        if !self.resulting_statement.vulnerability_id.is_empty() {
            return &self.resulting_statement.vulnerability_id;
        }
        self.source_statements
            .first()
            .map(|s| s.vulnerability_id.as_str())
            .unwrap_or("")
    }
}

impl fmt::Display for MergeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources = String::new();
        for s in &self.source_statements {
            sources.push_str(&indent(&s.pretty_print(), "  "));
            sources.push('\n');
        }

        write!(
            f,
            "-----\nLog Message:  {}\nMerge Policy: {}\nSources:\n{}",
            self.log_message, self.policy, sources
        )
    }
}

/// Ordered, append-only record of the decisions of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeLog {
    execution_id: ExecutionId,
    created_at: DateTime<Utc>,
    entries: Vec<MergeLogEntry>,
}

impl MergeLog {
    /// Create an empty log for a run.
    pub fn new(execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Append an entry, stamping it with this log's execution id.
    pub fn log(&mut self, mut entry: MergeLogEntry) {
        entry.execution_id = self.execution_id.clone();
        self.entries.push(entry);
    }

    /// All entries in logging order.
    pub fn entries(&self) -> &[MergeLogEntry] {
        &self.entries
    }

    /// Execution id of the run.
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// When the log was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries recording a failed reconciliation.
    pub fn failures(&self) -> impl Iterator<Item = &MergeLogEntry> {
        self.entries.iter().filter(|e| !e.success)
    }

    /// Text rendering of every entry, in order.
    pub fn render(&self) -> String {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    /// Fingerprint of the decisions, independent of execution id and time.
    pub fn fingerprint(&self) -> String {
        let records: Vec<DecisionRecord<'_>> = self
            .entries
            .iter()
            .map(|e| DecisionRecord {
                vulnerability_id: e.vulnerability_id(),
                policy: &e.policy,
                log_message: &e.log_message,
                success: e.success,
                sources: e
                    .source_statements
                    .iter()
                    .map(|s| s.hash().to_hex())
                    .collect(),
                result: e.resulting_statement.hash().to_hex(),
            })
            .collect();
        canonical_hash_hex(&records)
    }
}

/// Internal struct for computing the log fingerprint.
#[derive(Serialize)]
struct DecisionRecord<'a> {
    vulnerability_id: &'a str,
    policy: &'a str,
    log_message: &'a str,
    success: bool,
    sources: Vec<String>,
    result: String,
}

/// Prefix every line of `text` with `prefix`.
///
/// A single trailing newline is preserved; otherwise the result carries no
/// trailing newline.
pub fn indent(text: &str, prefix: &str) -> String {
    let keep_newline = text.ends_with('\n');
    let lines: Vec<String> = text
        .trim_end_matches('\n')
        .split('\n')
        .map(|l| format!("{}{}", prefix, l))
        .collect();
    let mut out = lines.join("\n");
    if keep_newline {
        out.push('\n');
    }
    out
}
