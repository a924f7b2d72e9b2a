//! Simulation throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dodgeball::{run_simulation, Direction, SimulationInput};

/// Players scattered on a small grid so most octants are populated.
fn scattered(n: usize, seed: u64) -> SimulationInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let span = (n as i64).max(4);
    let positions: Vec<(i64, i64)> = (0..n)
        .map(|_| (rng.gen_range(-span..=span), rng.gen_range(-span..=span)))
        .collect();
    SimulationInput::new(&positions, 0, Direction::N)
}

/// A single row: every throw goes east, so the ball visits everyone.
fn row(n: usize) -> SimulationInput {
    let positions: Vec<(i64, i64)> = (0..n as i64).map(|i| (i, 0)).collect();
    SimulationInput::new(&positions, 0, Direction::N)
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_simulation");

    for n in [16usize, 256, 2048] {
        let input = scattered(n, 7);
        group.bench_with_input(BenchmarkId::new("scattered", n), &input, |b, input| {
            b.iter(|| run_simulation(black_box(input)))
        });

        let input = row(n);
        group.bench_with_input(BenchmarkId::new("row", n), &input, |b, input| {
            b.iter(|| run_simulation(black_box(input)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulation);
criterion_main!(benches);
