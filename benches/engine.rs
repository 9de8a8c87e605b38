//! Benchmarks for the fixpoint evaluator and the scheduler
//!
//! Evaluator cost is measured on bounded-buffer graphs of growing size,
//! scheduler cost on producer/consumer runs with growing message counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ripple::models::{bounded_buffer, producer_consumer};
use ripple::{Formula, SimulationConfig};

/// Nested fixpoints over a linear chain of buffer states
fn bench_ctl_fixpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("ctl_fixpoints");
    let formula = Formula::and(
        Formula::atom("buffer_empty").ef().ag(),
        Formula::au(Formula::atom("producer_ready"), Formula::atom("buffer_full")).not(),
    );

    for capacity in [8usize, 64, 512, 2048] {
        let graph = bounded_buffer::graph(capacity);
        group.throughput(Throughput::Elements(graph.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &graph, |b, graph| {
            b.iter(|| black_box(formula.sat(graph)));
        });
    }

    group.finish();
}

/// Full producer/consumer runs until quiescence
fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");

    for limit in [10u32, 100, 1000] {
        group.throughput(Throughput::Elements(u64::from(limit) * 2));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                let config = SimulationConfig::default()
                    .with_seed(7)
                    .with_max_steps(limit as usize * 2);
                let mut world = producer_consumer::world(config, limit, 4)
                    .expect("valid benchmark world");
                black_box(world.run())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ctl_fixpoints, bench_scheduler);
criterion_main!(benches);
