//! Benchmark suite for fretwise
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fretwise::{serialize, GridConfig, GridSettings, LearningEngine, ReportMeta};

const T0: i64 = 1_700_000_000_000;

fn warmed_engine(questions: u32) -> LearningEngine<GridConfig> {
    let mut engine = LearningEngine::in_memory(GridConfig::with_seed(GridSettings::full_neck(), 1));
    for q in 0..questions {
        let now = T0 + i64::from(q) * 4_000;
        let item = engine.next_at(now);
        let ok = q % 4 != 0;
        engine.report_at(&item, ok, Some(900.0 + f64::from(q % 7) * 100.0), &ReportMeta::default(), now);
    }
    engine
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    for questions in [20u32, 100, 300] {
        group.bench_with_input(BenchmarkId::from_parameter(questions), &questions, |b, &n| {
            b.iter(|| black_box(warmed_engine(n)))
        });
    }
    group.finish();
}

fn bench_next_on_large_store(c: &mut Criterion) {
    let mut engine = warmed_engine(300);
    let mut now = T0 + 300 * 4_000;
    c.bench_function("next_at_after_300", |b| {
        b.iter(|| {
            now += 1_000;
            black_box(engine.next_at(now))
        })
    });
}

fn bench_mastery_report(c: &mut Criterion) {
    let engine = warmed_engine(300);
    c.bench_function("mastery_report_after_300", |b| {
        b.iter(|| black_box(engine.mastery_report_at(T0 + 2_000_000)))
    });
}

fn bench_serialize(c: &mut Criterion) {
    let engine = warmed_engine(300);
    let state = engine.snapshot(T0);
    c.bench_function("serialize_after_300", |b| {
        b.iter(|| black_box(serialize(&state)))
    });
}

criterion_group!(
    benches,
    bench_session,
    bench_next_on_large_store,
    bench_mastery_report,
    bench_serialize
);
criterion_main!(benches);
