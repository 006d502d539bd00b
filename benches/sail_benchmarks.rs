use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sailgraph::graph::MemoryGraph;
use sailgraph::rdf::{Iri, Literal, Resource, Term};
use sailgraph::sail::{SailConfig, SailStore};

fn ex(local: &str) -> Iri {
    Iri::new(format!("http://example.org/{}", local))
}

fn populate(store: &SailStore<MemoryGraph>, size: usize) {
    let mut conn = store.connection();
    for i in 0..size {
        conn.add_statement(
            Resource::Iri(ex(&format!("s{}", i % 100))),
            ex(&format!("p{}", i % 10)),
            Term::Literal(Literal::plain(format!("value {}", i))),
            None,
        )
        .unwrap();
    }
}

/// Benchmark statement insertion throughput
fn bench_add_statement(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_statement");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let store = SailStore::open(MemoryGraph::new()).unwrap();
                populate(&store, size);
            });
        });
    }
    group.finish();
}

/// Benchmark index-based retrieval (predicate bound)
fn bench_predicate_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_lookup");

    for size in [1000, 10_000].iter() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        populate(&store, *size);
        let conn = store.connection();
        let predicate = ex("p3");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let count = conn
                    .get_statements(None, Some(&predicate), None, None, false)
                    .unwrap()
                    .count();
                criterion::black_box(count);
            });
        });
    }
    group.finish();
}

/// Benchmark graph-based retrieval (subject bound, not indexed)
fn bench_subject_pivot(c: &mut Criterion) {
    let mut group = c.benchmark_group("subject_pivot");

    for size in [1000, 10_000].iter() {
        let store = SailStore::with_config(
            MemoryGraph::new(),
            SailConfig {
                indexed_patterns: "p,c".to_string(),
                ..SailConfig::default()
            },
        )
        .unwrap();
        populate(&store, *size);
        let conn = store.connection();
        let subject = Resource::Iri(ex("s42"));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let count = conn
                    .get_statements(Some(&subject), None, None, None, false)
                    .unwrap()
                    .count();
                criterion::black_box(count);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_add_statement,
    bench_predicate_lookup,
    bench_subject_pivot
);
criterion_main!(benches);
