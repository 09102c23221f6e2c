//! Knowledge-base merge binary
//!
//! Reads statements from several sources, reconciles them with the
//! configured policy and prints a summary.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `MERGE_INPUT`: path to the JSON input (required)
//! - `MERGE_OUTPUT_DIR`: where merged statements and the merge log are written (optional)
//! - `RUST_LOG`: Log level filter (default: kb_merge=info,vulnkb_reconcile=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Input
//!
//! ```json
//! {
//!   "policy": "soft",
//!   "sources": [
//!     { "repo": "https://github.com/sap/project-kb", "branch": "vulnerability-data",
//!       "rank": 1, "statements": [ { "vulnerability_id": "CVE-2020-1234", "fixes": [] } ] }
//!   ]
//! }
//! ```
//!
//! ## Usage
//!
//! ```bash
//! MERGE_INPUT=sources.json MERGE_OUTPUT_DIR=merged cargo run --bin kb_merge
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vulnkb_reconcile::{
    ConfigError, MergeConfig, Metadata, Policy, PolicyKind, Reducer, Reduction, SourceConfig,
    Statement,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kb_merge=info,vulnkb_reconcile=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
}

/// A source together with the statements read from it.
#[derive(Debug, Deserialize)]
struct SourceInput {
    #[serde(flatten)]
    source: SourceConfig,
    #[serde(default)]
    statements: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct MergeInput {
    #[serde(default)]
    policy: Option<PolicyKind>,
    #[serde(default)]
    sources: Vec<SourceInput>,
}

impl MergeInput {
    fn split(self) -> (MergeConfig, Vec<Statement>) {
        let mut config = MergeConfig {
            policy: self.policy,
            sources: Vec::with_capacity(self.sources.len()),
        };
        let mut statements = Vec::new();

        for input in self.sources {
            for mut s in input.statements {
                // Only the input knows where a statement was read from.
                let local_path = std::mem::take(&mut s.metadata.local_path);
                s.metadata = Metadata::new(&input.source.repo, &input.source.branch, input.source.rank)
                    .with_local_path(local_path);
                statements.push(s);
            }
            config.sources.push(input.source);
        }

        (config, statements)
    }
}

fn build_policy(kind: PolicyKind) -> Result<Policy, ConfigError> {
    if kind == PolicyKind::Interactive {
        error!("The interactive policy needs an operator and cannot be used from kb_merge");
    }
    Policy::from_kind(kind, None)
}

/// Directory for a statement under `dir`, or `None` when the vulnerability
/// id is not a single plain path segment.
fn statement_dir(dir: &Path, vulnerability_id: &str) -> Option<PathBuf> {
    if vulnerability_id.contains(['/', '\\']) {
        return None;
    }
    let mut components = Path::new(vulnerability_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == vulnerability_id => {
            Some(dir.join(segment))
        }
        _ => None,
    }
}

fn write_output(dir: &Path, reduction: &Reduction) -> std::io::Result<()> {
    let mut written = 0usize;
    let mut skipped = 0usize;
    for statement in reduction.statements() {
        let Some(target) = statement_dir(dir, &statement.vulnerability_id) else {
            warn!(
                vulnerability_id = %statement.vulnerability_id,
                "Vulnerability id is not a valid directory name; statement not written"
            );
            skipped += 1;
            continue;
        };

        let mut statement = statement.clone();
        statement.normalize_repository_urls();

        fs::create_dir_all(&target)?;
        let json = statement.to_json().map_err(std::io::Error::other)?;
        fs::write(target.join("statement.json"), json)?;
        written += 1;
    }

    let mut log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("merge.log"))?;
    log_file.write_all(reduction.log.render().as_bytes())?;

    info!(dir = %dir.display(), statements = written, skipped, "Wrote merged statements");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let input_path = match std::env::var("MERGE_INPUT") {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            error!("MERGE_INPUT not set");
            return Err("MERGE_INPUT environment variable is required".into());
        }
    };

    let raw = fs::read_to_string(&input_path).map_err(|e| {
        error!(path = %input_path.display(), error = %e, "Failed to read input");
        e
    })?;
    let input: MergeInput = serde_json::from_str(&raw)?;
    let (config, statements) = input.split();

    let kind = config.validate().map_err(|e| {
        error!(error = %e, "Invalid merge configuration");
        e
    })?;
    for source in &config.sources {
        if source.signed {
            warn!(repo = %source.repo, "Signature verification is not performed");
        }
    }

    let policy = build_policy(kind)?;
    info!(policy = %kind, sources = config.sources.len(), "Starting merge");

    let started = Instant::now();
    let reduction = Reducer::new(policy)
        .with_source_count(config.sources.len())
        .run(statements)?;
    info!(
        execution_id = %reduction.log.execution_id(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Merge finished"
    );

    println!("{}", reduction.summary);
    if !reduction.dropped.is_empty() {
        println!("Dropped (unresolved): {}", reduction.dropped.join(", "));
    }

    if let Ok(dir) = std::env::var("MERGE_OUTPUT_DIR") {
        write_output(Path::new(&dir), &reduction)?;
    }

    Ok(())
}
