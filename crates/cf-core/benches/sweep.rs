//! Sweep pass benchmarks
//!
//! Run with: cargo bench -p cf-core --bench sweep

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use cf_core::synthetic::synthetic_feed;
use cf_core::{Dom, Engine, EngineConfig, SettingsSnapshot};

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pass");
    for units in [20usize, 100, 400] {
        let page = synthetic_feed(units);
        group.throughput(Throughput::Elements(units as u64));
        group.bench_with_input(BenchmarkId::from_parameter(units), &page, |b, page| {
            b.iter_batched(
                || page.clone(),
                |mut dom| {
                    let mut engine = Engine::new(&SettingsSnapshot::defaults(), &EngineConfig::default());
                    black_box(engine.sweep_document(&mut dom))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_steady_state(c: &mut Criterion) {
    // Everything already stamped: the cost of a fallback pass on a quiet page.
    let mut dom = synthetic_feed(100);
    let mut engine = Engine::new(&SettingsSnapshot::defaults(), &EngineConfig::default());
    engine.sweep_document(&mut dom);

    c.bench_function("steady_state_100", |b| {
        b.iter(|| black_box(engine.sweep_document(&mut dom)))
    });
}

fn bench_incremental(c: &mut Criterion) {
    let page = synthetic_feed(100);
    let body = page.body().expect("synthetic page has a body");
    let units: Vec<_> = page
        .descendants(&body)
        .expect("synthetic page is readable")
        .into_iter()
        .filter(|n| page.attribute(n, "data-pagelet").is_some())
        .take(3)
        .collect();

    c.bench_function("incremental_3_units", |b| {
        b.iter_batched(
            || page.clone(),
            |mut dom| {
                let mut engine = Engine::new(&SettingsSnapshot::defaults(), &EngineConfig::default());
                black_box(engine.sweep(&mut dom, &units))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_full_pass, bench_steady_state, bench_incremental);
criterion_main!(benches);
