//! Benchmark for chunk streaming performance.
//!
//! TARGET: a full radius-8 disc streamed in under 1 second
//!
//! Run with: cargo bench --package strata_world --bench store_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_terrain::{Material, WorldSeed};
use strata_world::{ChunkStore, StoreConfig, WorldPos};

fn bench_config() -> StoreConfig {
    StoreConfig {
        load_radius: 8,
        unload_radius: 10,
        worker_count: 4,
        save_directory: None,
    }
}

fn benchmark_stream_disc(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_disc");
    group.sample_size(10);
    // 197 chunks within radius 8
    group.throughput(Throughput::Elements(197));

    group.bench_function("radius_8_cold_start", |b| {
        b.iter(|| {
            let store = ChunkStore::new(WorldSeed::new(42), bench_config()).unwrap();
            store.update([0.0, 70.0, 0.0], 0.05);
            store.flush_generation_queue();
            black_box(store.resident_count())
        });
    });

    group.finish();
}

fn benchmark_viewer_step(c: &mut Criterion) {
    let store = ChunkStore::new(WorldSeed::new(42), bench_config()).unwrap();
    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();

    c.bench_function("viewer_step_one_chunk", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x += 16.0;
            let report = store.update([x, 70.0, 0.0], 0.05);
            store.flush_generation_queue();
            black_box(report)
        });
    });
}

fn benchmark_block_access(c: &mut Criterion) {
    let store = ChunkStore::new(WorldSeed::new(42), bench_config()).unwrap();
    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();

    c.bench_function("get_block", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 7) % 128;
            black_box(store.get_block(WorldPos::new(i - 64, i, 64 - i)))
        });
    });

    c.bench_function("set_block", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 7) % 128;
            store.set_block(WorldPos::new(i - 64, 100, i - 64), Material::Stone);
        });
    });
}

criterion_group!(
    benches,
    benchmark_stream_disc,
    benchmark_viewer_step,
    benchmark_block_access
);
criterion_main!(benches);
