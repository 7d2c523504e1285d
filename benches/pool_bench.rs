// benches/pool_bench.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::io::Write;
use std::sync::Arc;
use streampool::prelude::*;

fn bench_block_acquire_release(c: &mut Criterion) {
    let manager = Arc::new(PoolManager::default());
    c.bench_function("stream_acquire_release_small", |b| {
        b.iter(|| {
            let mut stream = manager.get_stream();
            stream.write_all(black_box(b"benchmark payload")).unwrap();
            drop(stream);
        });
    });
}

fn bench_write_then_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_then_get_buffer");
    let manager = Arc::new(PoolManager::default());

    for size in [4 * 1024usize, 64 * 1024, 256 * 1024, 2 * 1024 * 1024].iter() {
        let payload = vec![0xABu8; *size];
        group.bench_with_input(BenchmarkId::new("size", size), size, |b, _| {
            b.iter(|| {
                let mut stream = manager.get_stream();
                stream.write_all(black_box(&payload)).unwrap();
                let _ = black_box(stream.get_buffer().unwrap());
            });
        });
    }
    group.finish();
}

fn bench_large_buffer_rental(c: &mut Criterion) {
    let manager = Arc::new(PoolManager::default());
    c.bench_function("large_buffer_rent_return", |b| {
        b.iter(|| {
            let stream = manager
                .get_stream_contiguous("bench", black_box(4 * 1024 * 1024), true)
                .unwrap();
            drop(stream);
        });
    });
}

criterion_group!(
    benches,
    bench_block_acquire_release,
    bench_write_then_promote,
    bench_large_buffer_rental
);
criterion_main!(benches);
