//! Performance benchmarks for statement reduction.
//!
//! Run with: `cargo bench --bench reduce`
//!
//! ## Scenarios
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | Statement checksum | Cold (reset before each call) vs cached |
//! | Soft reduce | Many groups, few candidates per group |
//! | Interactive reduce | Remembered resolutions, operator asked once per conflict |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vulnkb_reconcile::{
    Commit, Conflict, Fix, Metadata, Note, Operator, OperatorError, Policy, Reconciler, Reducer,
    Resolution, Statement,
};

/// Create a statement with a fix, a note and a couple of aliases.
fn make_statement(vuln: usize, source: usize, rank: i32) -> Statement {
    Statement::new(format!("CVE-2024-{:05}", vuln))
        .with_alias(format!("BUG-{}", vuln))
        .with_alias(format!("GHSA-{}-{}", vuln, source))
        .with_note(Note::new(
            format!("Statement {} from source {}", vuln, source),
            vec![format!("https://example.com/{}/{}", source, vuln)],
        ))
        .with_fix(Fix::on_default_branch(vec![Commit::new(
            format!("{:040x}", vuln * 31 + source),
            format!("https://github.com/org{}/project", source),
        )]))
        .with_metadata(Metadata::new(format!("repo_{}", source), "master", rank))
}

/// `sources` sources, each publishing every vulnerability, with distinct ranks.
fn make_input(vulns: usize, sources: usize) -> Vec<Statement> {
    (0..sources)
        .flat_map(|src| (0..vulns).map(move |v| make_statement(v, src, src as i32 + 1)))
        .collect()
}

struct FirstCandidate;

impl Operator for FirstCandidate {
    fn resolve(&mut self, _conflict: &Conflict<'_>) -> Result<Resolution, OperatorError> {
        Ok(Resolution::take_all_from(0))
    }
}

fn bench_checksum(c: &mut Criterion) {
    let s = make_statement(1, 1, 1);

    let mut group = c.benchmark_group("checksum");
    group.bench_function("cold", |b| {
        b.iter(|| {
            s.reset_hash();
            black_box(s.hash())
        })
    });
    group.bench_function("cached", |b| b.iter(|| black_box(s.hash())));
    group.finish();
}

fn bench_soft_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("soft_reduce");

    for vulns in [100usize, 1_000, 10_000] {
        let input = make_input(vulns, 3);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(vulns), &input, |b, input| {
            let reducer = Reducer::new(Policy::soft());
            b.iter(|| black_box(reducer.run(input.clone())))
        });
    }

    group.finish();
}

fn bench_interactive_memory(c: &mut Criterion) {
    let input = make_input(1_000, 2);
    let groups = Reducer::group(input);
    let policy = Policy::interactive(FirstCandidate);

    // Warm the resolution memory.
    let _ = policy.reduce(groups.clone());

    c.bench_function("interactive_reduce_remembered", |b| {
        b.iter(|| black_box(policy.reduce(groups.clone())))
    });
}

criterion_group!(benches, bench_checksum, bench_soft_reduce, bench_interactive_memory);
criterion_main!(benches);
