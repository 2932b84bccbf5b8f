use contagio_sim::pathogen::VariantParams;
use contagio_sim::region::TransitionMode;
use contagio_sim::simulation::{Configuration, Simulation, SimulationBuilder};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn params() -> VariantParams {
    VariantParams {
        disease_probability: 0.3,
        incubation_time: 5,
        latency_time: 2,
        disease_duration: 8,
        infectious_duration: 4,
        immunity_duration: 90,
        mortality_rate: 0.005,
        contagion_rate: 0.35,
    }
}

/// `n` regions on a ring, each travelling to both neighbors.
fn ring(n: usize, mode: TransitionMode, parallel: bool) -> Simulation {
    let mut builder = SimulationBuilder::new()
        .steps(50)
        .seed(42)
        .transitions(mode)
        .parallel(parallel)
        .family("corona", 10.0)
        .mutating_variant("cov", "corona", params(), 0.001, 0.0005);
    for i in 0..n {
        builder = builder
            .region(format!("r{i}"), 500_000, 3.0)
            .neighbor(format!("r{i}"), format!("r{}", (i + 1) % n), 1.0)
            .neighbor(format!("r{i}"), format!("r{}", (i + n - 1) % n), 1.0);
    }
    builder.seed_infection("r0", "cov", 0.1).build().unwrap()
}

fn bench_simulation_init(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_init");

    group.bench_function("sample_configuration", |b| {
        b.iter(|| {
            black_box(
                SimulationBuilder::from_configuration(black_box(Configuration::sample()))
                    .build()
                    .unwrap(),
            );
        })
    });

    group.finish();
}

fn bench_simulation_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");

    for regions in [8, 64] {
        group.throughput(Throughput::Elements(regions as u64));
        for (label, mode) in [
            ("deterministic", TransitionMode::Deterministic),
            ("stochastic", TransitionMode::Stochastic),
        ] {
            group.bench_with_input(BenchmarkId::new(label, regions), &regions, |b, &n| {
                b.iter_batched(
                    || ring(n, mode, false),
                    |mut sim| {
                        sim.step().unwrap();
                        black_box(sim)
                    },
                    criterion::BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

fn bench_simulation_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_run");
    let regions = 64;

    group.throughput(Throughput::Elements(regions as u64 * 50));

    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::new(if parallel { "parallel" } else { "sequential" }, regions),
            &parallel,
            |b, &parallel| {
                b.iter_batched(
                    || ring(regions, TransitionMode::Stochastic, parallel),
                    |mut sim| {
                        sim.run().unwrap();
                        black_box(sim)
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_simulation_init,
    bench_simulation_step,
    bench_simulation_run
);
criterion_main!(benches);
