//! End-to-end reconciliation tests.
//!
//! These tests run whole reductions through the public API and check the
//! merged statements, the merge log and the run summary.

use vulnkb_reconcile::{
    Alias, Artifact, Commit, ExecutionId, Fix, Metadata, Note, Policy, Reconciler, Reducer,
    Statement, StatementGroups,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn fix(commit: &str) -> Fix {
    Fix::on_default_branch(vec![Commit::new(commit, "https://github.com/abc/def")])
}

fn from(origin: &str, rank: i32, s: Statement) -> Statement {
    s.with_metadata(Metadata::new(origin, "master", rank))
}

/// Three sources ranked 3, 4 and 6. Each publishes one statement of its
/// own; all three publish `cve_shared`, but only the rank-3 source has
/// fixes for it.
fn three_sources() -> Vec<Statement> {
    vec![
        from("repo_3", 3, Statement::new("cve_id1").with_fix(fix("c31")).with_note(Note::plain("from 3"))),
        from(
            "repo_3",
            3,
            Statement::new("cve_shared")
                .with_alias("bug-a")
                .with_fix(fix("s3"))
                .with_note(Note::new("fixed upstream", vec!["https://example.com/advisory".to_string()])),
        ),
        from("repo_4", 4, Statement::new("cve_id2").with_fix(fix("c42"))),
        from(
            "repo_4",
            4,
            Statement::new("cve_shared")
                .with_alias("bug-b")
                .with_note(Note::plain("also seen in 4")),
        ),
        from("repo_6", 6, Statement::new("cve_id3").with_fix(fix("c63"))),
        from(
            "repo_6",
            6,
            Statement::new("cve_shared").with_note(Note::plain("also seen in 6")),
        ),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Soft
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_soft_three_sources() {
    let reduction = Reducer::new(Policy::soft()).run(three_sources()).unwrap();

    assert_eq!(reduction.merged.len(), 4);
    assert_eq!(reduction.statements().count(), 4);
    assert_eq!(reduction.log.len(), 4);
    assert!(reduction.log.entries().iter().all(|e| e.success()));
    assert!(reduction.dropped.is_empty());
    assert_eq!(
        reduction.summary.to_string(),
        "Merged 3 sources (6 statements, 4 vulnerabilities): yielded 4 statements."
    );

    let shared = &reduction.merged["cve_shared"][0];
    assert_eq!(shared.fixes, vec![fix("s3")]);
    let notes: Vec<&str> = shared.notes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(notes, vec!["fixed upstream", "also seen in 4", "also seen in 6"]);
    assert_eq!(
        shared.aliases.iter().map(Alias::as_str).collect::<Vec<_>>(),
        vec!["bug-a", "bug-b"]
    );
}

#[test]
fn test_soft_same_rank_conflict_is_logged_and_voided() {
    let statements = vec![
        from("repo_1", 3, Statement::new("cve_id1").with_fix(fix("a"))),
        from("repo_2", 3, Statement::new("cve_id1").with_fix(fix("b"))),
        from("repo_1", 3, Statement::new("cve_id2").with_fix(fix("c"))),
    ];
    let reduction = Reducer::new(Policy::soft()).run(statements).unwrap();

    assert!(reduction.merged["cve_id1"][0].is_void());
    assert_eq!(reduction.summary.produced, 1);
    assert_eq!(reduction.summary.failed, 1);

    let failure = reduction.log.failures().next().unwrap();
    assert_eq!(failure.vulnerability_id(), "cve_id1");
    assert_eq!(failure.source_statements().len(), 2);
}

#[test]
fn test_soft_artifacts_prefer_trusted_source() {
    let statements = vec![
        from(
            "repo_9",
            9,
            Statement::new("cve_id1")
                .with_fix(fix("a"))
                .with_artifact(Artifact::new("pkg:maven/org.example/lib@1.0", false, "not used"))
                .with_artifact(Artifact::new("pkg:maven/org.example/other@2.0", true, "")),
        ),
        from(
            "repo_1",
            1,
            Statement::new("cve_id1")
                .with_fix(fix("b"))
                .with_artifact(Artifact::new("pkg:maven/org.example/lib@1.0", true, "vulnerable call")),
        ),
    ];
    let reduction = Reducer::new(Policy::soft()).run(statements).unwrap();
    let merged = &reduction.merged["cve_id1"][0];

    assert_eq!(merged.fixes, vec![fix("b")]);
    assert_eq!(merged.affected_artifacts.len(), 2);
    assert!(merged.affected_artifacts[0].affected);
    assert_eq!(merged.affected_artifacts[0].reason, "vulnerable call");
}

// ─────────────────────────────────────────────────────────────────────────────
// Strict and Null
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_strict_three_sources_drops_shared() {
    let reduction = Reducer::new(Policy::strict()).run(three_sources()).unwrap();

    assert_eq!(reduction.dropped, vec!["cve_shared".to_string()]);
    assert_eq!(reduction.merged.len(), 3);
    assert_eq!(reduction.summary.produced, 3);
    assert_eq!(reduction.summary.input_groups, 4);

    let failures: Vec<_> = reduction.log.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].log_message().contains("Found 3 conflicting statements"));

    // The audit block names every conflicting source.
    let rendered = failures[0].to_string();
    assert!(rendered.contains("Merge Policy: STRICT"));
    for origin in ["repo_3", "repo_4", "repo_6"] {
        assert!(rendered.contains(origin));
    }
}

#[test]
fn test_null_returns_groups_untouched() {
    let groups: StatementGroups = Reducer::group(three_sources());
    let (reduced, log) = Policy::null().reduce(groups.clone()).unwrap();

    assert_eq!(reduced, groups);
    assert_eq!(reduced["cve_shared"].len(), 3);
    assert!(log.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_golden_soft_determinism() {
    let first = Reducer::new(Policy::soft()).run(three_sources()).unwrap();
    let second = Reducer::new(Policy::soft()).run(three_sources()).unwrap();

    assert_ne!(first.log.execution_id(), second.log.execution_id());
    assert_eq!(first.log.fingerprint(), second.log.fingerprint());
    for (id, statements) in &first.merged {
        assert_eq!(statements, &second.merged[id]);
    }
}

#[test]
fn test_fingerprint_depends_on_policy() {
    let soft = Reducer::new(Policy::soft()).run(three_sources()).unwrap();
    let strict = Reducer::new(Policy::strict()).run(three_sources()).unwrap();
    assert_ne!(soft.log.fingerprint(), strict.log.fingerprint());
}

#[test]
fn test_log_entries_carry_run_id() {
    let id = ExecutionId::new("exec_golden");
    let reduction = Reducer::new(Policy::smart())
        .with_execution_id(id.clone())
        .run(three_sources())
        .unwrap();

    assert_eq!(reduction.log.len(), 4);
    let ids: Vec<&str> = reduction.log.entries().iter().map(|e| e.vulnerability_id()).collect();
    assert_eq!(ids, vec!["cve_id1", "cve_id2", "cve_id3", "cve_shared"]);
    assert!(reduction.log.entries().iter().all(|e| e.execution_id() == &id));
}

#[test]
fn test_merged_statement_json() {
    let reduction = Reducer::new(Policy::soft()).run(three_sources()).unwrap();
    let json = reduction.merged["cve_shared"][0].to_json().unwrap();

    let back: Statement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reduction.merged["cve_shared"][0]);
    // Merged statements carry no provenance.
    assert!(!json.contains("origin"));
}
