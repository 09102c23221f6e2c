//! Property tests for checksums, commit sets and the soft policy.

use std::collections::BTreeSet;

use proptest::prelude::*;
use vulnkb_reconcile::{
    Alias, Commit, CommitSet, Fix, Metadata, Note, Policy, Reconciler, Reducer, Statement,
};

fn arb_commit() -> impl Strategy<Value = Commit> {
    ("[0-9a-f]{8}", "https://github\\.com/[a-z]{3}/[a-z]{3}")
        .prop_map(|(id, url)| Commit::new(id, url))
}

fn arb_statement() -> impl Strategy<Value = Statement> {
    (
        "cve-[0-9]{4}-[0-9]{4}",
        prop::collection::btree_set("[a-z]{1,4}", 0..4),
        prop::collection::vec("[a-zA-Z ]{0,12}", 0..3),
        prop::collection::vec(arb_commit(), 0..3),
    )
        .prop_map(|(id, aliases, notes, commits)| {
            let mut s = Statement::new(id);
            for a in aliases {
                s = s.with_alias(a);
            }
            for n in notes {
                s = s.with_note(Note::plain(n));
            }
            if !commits.is_empty() {
                s = s.with_fix(Fix::on_default_branch(commits));
            }
            s
        })
}

fn arb_metadata() -> impl Strategy<Value = Metadata> {
    ("repo_[0-9]", "[a-z0-9.]{1,6}", 0i32..100).prop_map(|(o, b, r)| Metadata::new(o, b, r))
}

proptest! {
    #[test]
    fn prop_hash_is_stable(s in arb_statement()) {
        prop_assert_eq!(s.hash(), s.hash());
        prop_assert_eq!(s.clone().hash(), s.hash());
    }

    #[test]
    fn prop_hash_ignores_metadata(s in arb_statement(), m in arb_metadata()) {
        let tagged = s.clone().with_metadata(m);
        prop_assert_eq!(tagged.hash(), s.hash());
    }

    #[test]
    fn prop_hash_survives_json(s in arb_statement()) {
        let json = s.to_json().unwrap();
        let back: Statement = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.hash(), s.hash());
    }

    #[test]
    fn prop_commit_set_add_is_idempotent(commits in prop::collection::vec(arb_commit(), 0..10)) {
        let mut set = CommitSet::new();
        set.add_slice(&commits);
        let size = set.size();
        set.add_slice(&commits);

        prop_assert_eq!(set.size(), size);
        prop_assert_eq!(set.elements().len(), set.size());
        prop_assert!(size <= commits.len());
    }

    #[test]
    fn prop_commit_set_remove(commits in prop::collection::vec(arb_commit(), 1..10)) {
        let mut set: CommitSet = commits.iter().cloned().collect();
        let victim = &commits[0];
        set.remove(victim);
        prop_assert!(!set.contains(victim));
    }

    #[test]
    fn prop_soft_alias_union(
        a in prop::collection::btree_set("[a-z]{1,3}", 0..5),
        b in prop::collection::btree_set("[a-z]{1,3}", 0..5),
    ) {
        let mut first = Statement::new("cve-1").with_metadata(Metadata::new("repo_1", "master", 1));
        for x in &a {
            first = first.with_alias(x.as_str());
        }
        let mut second = Statement::new("cve-1").with_metadata(Metadata::new("repo_2", "master", 2));
        for x in &b {
            second = second.with_alias(x.as_str());
        }

        let result = Policy::soft().reconcile(&[first, second]);
        prop_assert!(result.success());

        let expected: BTreeSet<Alias> = a.union(&b).map(|x| Alias::new(x.as_str())).collect();
        prop_assert_eq!(&result.statement().aliases, &expected);
    }

    #[test]
    fn prop_soft_yields_one_statement_per_group(
        statements in prop::collection::vec((arb_statement(), 0i32..5), 0..12),
    ) {
        let input: Vec<Statement> = statements
            .into_iter()
            .enumerate()
            .map(|(i, (s, rank))| s.with_metadata(Metadata::new(format!("repo_{}", i), "master", rank)))
            .collect();
        let groups = Reducer::group(input.clone()).len();

        let reduction = Reducer::new(Policy::soft()).run(input).unwrap();
        prop_assert_eq!(reduction.merged.len(), groups);
        prop_assert!(reduction.merged.values().all(|v| v.len() == 1));
        prop_assert_eq!(reduction.log.len(), groups);
        prop_assert_eq!(
            reduction.summary.produced + reduction.summary.failed,
            groups
        );
    }
}
