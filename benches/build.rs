use criterion::{Criterion, black_box, criterion_group, criterion_main};
use secure_headers::{HeaderKind, Overrides, Pin, PolicyStore, ValueMap};

fn per_call_overrides() -> Overrides {
    Overrides::new()
        .with(
            HeaderKind::Csp,
            ValueMap::new()
                .with("script-src", vec!["self", "https://cdn.example.com", "nonce-abc123"])
                .with("report-only", true),
        )
        .with(
            HeaderKind::Hpkp,
            ValueMap::new().with("pins", vec![Pin::sha256("AAA="), Pin::sha256("BBB=")]),
        )
}

fn benchmark_build(c: &mut Criterion) {
    let store = PolicyStore::new();
    let overrides = per_call_overrides();

    c.bench_function("build_defaults", |b| {
        b.iter(|| black_box(store.build(None).unwrap()))
    });

    c.bench_function("build_with_overrides", |b| {
        b.iter(|| black_box(store.build(Some(&overrides)).unwrap()))
    });
}

criterion_group!(benches, benchmark_build);
criterion_main!(benches);
