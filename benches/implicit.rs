use cellkern::{Frustum, ImplicitFunction, SelectionLoop};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_POINTS: usize = 100_000;

fn random_points(n: usize) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|_| [rng.gen_range(-2.0..2.0), rng.gen_range(0.0..4.0), rng.gen_range(-2.0..2.0)])
        .collect()
}

fn star_loop(n: usize) -> SelectionLoop {
    let points = (0..n)
        .map(|k| {
            let angle = std::f64::consts::TAU * k as f64 / n as f64;
            let radius = if k % 2 == 0 { 1.5 } else { 0.75 };
            [radius * angle.cos(), 2.0 + radius * angle.sin(), 0.0]
        })
        .collect();
    SelectionLoop::new(points).with_seed(3)
}

fn benchmark_batches(c: &mut Criterion) {
    let points = random_points(NUM_POINTS);
    let functions: Vec<(&str, Box<dyn ImplicitFunction>)> = vec![
        ("frustum", Box::new(Frustum::default())),
        ("loop_8", Box::new(star_loop(8))),
        ("loop_64", Box::new(star_loop(64))),
    ];

    let mut group = c.benchmark_group(format!("implicit_{}k", NUM_POINTS / 1000));
    group.sample_size(20);
    for (name, function) in &functions {
        group.bench_with_input(BenchmarkId::new("sequential", name), function, |b, function| {
            b.iter(|| {
                for x in &points {
                    black_box(function.evaluate(x));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", name), function, |b, function| {
            b.iter(|| black_box(function.evaluate_many(&points)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_batches);
criterion_main!(benches);
