use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mrc_core::buckets::BucketLadderConfig;
use mrc_core::engine::evicting_map::{EvictingMapEngine, EvictingMapEngineConfig};
use mrc_core::engine::fixed_rate_shards::{FixedRateShards, FixedRateShardsConfig};
use mrc_core::engine::olken::{Olken, OlkenConfig};
use mrc_core::engine::quickmrc::{EvictingQuickMrc, EvictingQuickMrcConfig};
use mrc_core::engine::ReuseDistanceEngine;
use mrc_core::histogram::OutOfBoundsMode;

const NUM_KEYS: u64 = 10_000;
const NUM_BINS: usize = 4096;

fn workload() -> Vec<u64> {
    // A simple cyclic-working-set trace, large enough to exercise eviction
    // and bucket merging in the bounded-memory engines.
    (0..100_000u64).map(|i| i % NUM_KEYS).collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let trace = workload();
    let mut group = c.benchmark_group("Reuse-Distance Engines");

    group.bench_function("Olken access", |b| {
        b.iter(|| {
            let mut engine = Olken::new(OlkenConfig {
                num_bins: NUM_BINS,
                bin_size: 1,
                mode: OutOfBoundsMode::Realloc,
            })
            .unwrap();
            for &key in &trace {
                engine.access(black_box(key));
            }
        });
    });

    group.bench_function("Fixed-Rate SHARDS access", |b| {
        b.iter(|| {
            let mut engine = FixedRateShards::new(FixedRateShardsConfig {
                ratio: 0.1,
                adjust: true,
                num_bins: NUM_BINS,
                bin_size: 1,
                mode: OutOfBoundsMode::Realloc,
            })
            .unwrap();
            for &key in &trace {
                engine.access(black_box(key));
            }
            engine.post_process();
        });
    });

    group.bench_function("Evicting-Map access", |b| {
        b.iter(|| {
            let mut engine = EvictingMapEngine::new(EvictingMapEngineConfig {
                capacity: 1024,
                num_bins: NUM_BINS,
                bin_size: 1,
                mode: OutOfBoundsMode::Realloc,
            })
            .unwrap();
            for &key in &trace {
                engine.access(black_box(key));
            }
        });
    });

    group.bench_function("Evicting-QuickMRC access", |b| {
        b.iter(|| {
            let mut engine = EvictingQuickMrc::new(EvictingQuickMrcConfig {
                ratio: 0.1,
                capacity: 1024,
                ladder: BucketLadderConfig::new(64),
                num_bins: NUM_BINS,
                bin_size: 1,
                mode: OutOfBoundsMode::Realloc,
            })
            .unwrap();
            for &key in &trace {
                engine.access(black_box(key));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
