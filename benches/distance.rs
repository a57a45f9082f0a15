//! Benchmarks for the five metrics.
//!
//! Dimensions cover the pooled outputs of the supported extraction models
//! (MobileNet 1024, ResNet50/Inception/Xception 2048, VGG16 4096).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

use cbir_core::Metric;

fn random_histograms(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f32>()).collect())
        .collect()
}

fn bench_metrics(c: &mut Criterion) {
    for metric in Metric::ALL {
        let mut group = c.benchmark_group(metric.as_str());

        for dim in [1024, 2048, 4096].iter() {
            group.throughput(Throughput::Elements(*dim as u64));

            let vectors = random_histograms(2, *dim);
            let a = &vectors[0];
            let b = &vectors[1];

            group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
                bench.iter(|| metric.score(black_box(a), black_box(b)));
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
