//! DRBG and conditioning benchmarks.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lwr_drbg::reseeding::{LwrDrbgCore, LwrParams, DEFAULT_MATRIX_SEED};
use lwr_drbg::{Conditioner, Generation, XofAlgorithm};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("lwr_generate");

    for algorithm in [XofAlgorithm::Shake256, XofAlgorithm::Blake3] {
        let mut core = LwrDrbgCore::with_matrix_seed(
            LwrParams::default(),
            DEFAULT_MATRIX_SEED,
            Conditioner::new(algorithm),
            u64::MAX,
        )
        .unwrap();
        core.update(&[0x5Au8; 48]);

        for size in [32usize, 256, 4096] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", algorithm), size),
                &size,
                |bench, &size| {
                    bench.iter(|| match core.generate(black_box(size)).unwrap() {
                        Generation::Output(bytes) => bytes,
                        Generation::ReseedRequired => unreachable!(),
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut core = LwrDrbgCore::with_matrix_seed(
        LwrParams::default(),
        DEFAULT_MATRIX_SEED,
        Conditioner::default(),
        u64::MAX,
    )
    .unwrap();
    let seed = [0xA5u8; 48];

    c.bench_function("lwr_update", |bench| {
        bench.iter(|| core.update(black_box(&seed)));
    });
}

fn bench_condition(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition");
    let raw = vec![0x3Cu8; 1536];

    for algorithm in [XofAlgorithm::Shake256, XofAlgorithm::Blake3] {
        let conditioner = Conditioner::new(algorithm);
        group.bench_with_input(
            BenchmarkId::new(format!("{:?}", algorithm), raw.len()),
            &raw,
            |bench, raw| {
                bench.iter(|| conditioner.condition(black_box(raw), b"bench", 256));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_update, bench_condition);
criterion_main!(benches);
