use std::hint::black_box;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use hrp_rs::portfolio::CovarianceMatrix;
use hrp_rs::portfolio::HrpEngine;
use hrp_rs::portfolio::HrpEngineConfig;
use ndarray::Array2;

fn block_covariance(n: usize) -> CovarianceMatrix {
  let values = Array2::from_shape_fn((n, n), |(i, j)| {
    let vi = 0.02 + 0.002 * (i % 11) as f64;
    let vj = 0.02 + 0.002 * (j % 11) as f64;
    if i == j {
      vi
    } else if i % 8 == j % 8 {
      0.6 * (vi * vj).sqrt()
    } else {
      0.1 * (vi * vj).sqrt()
    }
  });
  CovarianceMatrix::new((0..n).map(|i| format!("S{i}")).collect(), values).unwrap()
}

fn bench_optimize(c: &mut Criterion) {
  let mut group = c.benchmark_group("HRP");

  for n in [16, 64, 256] {
    let cov = block_covariance(n);

    group.bench_with_input(BenchmarkId::new("sequential", n), &cov, |b, cov| {
      let engine = HrpEngine::default();
      b.iter(|| black_box(engine.optimize(cov).unwrap()));
    });

    group.bench_with_input(BenchmarkId::new("parallel", n), &cov, |b, cov| {
      let engine = HrpEngine::new(HrpEngineConfig {
        parallel: true,
        ..HrpEngineConfig::default()
      });
      b.iter(|| black_box(engine.optimize(cov).unwrap()));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
