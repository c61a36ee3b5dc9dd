//! Benchmarks for full scheduler runs

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shield_core::{FnSink, ShieldEvent, SimTime, StageId};
use shield_runtime::{ScriptConfig, StageScheduler};
use shield_test::StageSimulator;

fn bench_full_cycle(c: &mut Criterion) {
    c.bench_function("full_cycle_recorded", |b| {
        b.iter(|| {
            let mut sim = StageSimulator::new(7).unwrap();
            black_box(sim.run_cycle().unwrap())
        })
    });
}

fn bench_full_cycle_counting(c: &mut Criterion) {
    c.bench_function("full_cycle_counting_sink", |b| {
        b.iter(|| {
            let mut events = 0u64;
            let sink = FnSink(|_: SimTime, _: ShieldEvent| events += 1);
            let mut scheduler = StageScheduler::seeded(ScriptConfig::default(), 7, sink).unwrap();
            scheduler.activate();
            scheduler.advance_by(Duration::from_secs(18)).unwrap();
            scheduler.restart().unwrap();
            drop(scheduler);
            black_box(events)
        })
    });
}

fn bench_chaos_engine_second(c: &mut Criterion) {
    let sink = FnSink(|_: SimTime, _: ShieldEvent| {});
    let mut scheduler = StageScheduler::seeded(ScriptConfig::default(), 7, sink).unwrap();

    c.bench_function("chaos_engine_active_second", |b| {
        b.iter(|| {
            scheduler.navigate(StageId::ChaosEngine).unwrap();
            scheduler.advance_by(Duration::from_millis(2000)).unwrap();
            black_box(scheduler.stats().jitter_ticks)
        })
    });
}

criterion_group!(
    benches,
    bench_full_cycle,
    bench_full_cycle_counting,
    bench_chaos_engine_second,
);
criterion_main!(benches);
