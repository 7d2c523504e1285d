//! Integration tests exercising the pool manager and stream together.

use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use streampool::prelude::*;

fn test_manager() -> Arc<PoolManager> {
    Arc::new(PoolManager::new(PoolManagerConfig::small_test()).unwrap())
}

#[test]
fn test_block_mode_promotion_to_large() {
    // block_size = 16384, large_multiple = 1 MiB, max_buffer = 8 MiB, linear.
    let manager = test_manager();
    let mut stream = manager.get_stream();

    let payload: Vec<u8> = (0..16_385u32).map(|i| (i % 256) as u8).collect();
    stream.write_all(&payload).unwrap();
    assert_eq!(stream.capacity().unwrap(), 32_768);

    let view_len = stream.get_buffer().unwrap().len();
    assert_eq!(view_len, 1_048_576);
    assert_eq!(stream.capacity().unwrap(), 1_048_576);

    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut out = vec![0u8; payload.len()];
    stream.read_exact(&mut out).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn test_linear_large_sizing_and_return() {
    let manager = test_manager();
    let buffer_len;
    {
        let stream = manager.get_stream_contiguous("large", 8_388_609, true).unwrap();
        buffer_len = stream.capacity().unwrap();
    }
    assert_eq!(buffer_len, 9_437_184);
    // The stream above went out of scope and disposed; the oversize
    // rental is never pooled so both counters settle back to zero.
    assert_eq!(manager.stats().large_pool_in_use_size, 0);
    assert_eq!(manager.stats().large_pool_free_size, 0);
}

#[test]
fn test_exponential_large_sizing() {
    let manager = Arc::new(PoolManager::new(PoolManagerConfig::new(100, 1000, 8000, true)).unwrap());
    for (required, expected) in [(1000, 1000), (2000, 2000), (4000, 4000), (8000, 8000), (5000, 8000)] {
        let stream = manager.get_stream_contiguous("x", required, true).unwrap();
        assert_eq!(stream.capacity().unwrap(), expected as u64);
    }
}

#[test]
fn test_small_pool_free_capacity_cap() {
    let mut config = PoolManagerConfig::new(100, 1024, 8192, false);
    config.maximum_free_small_pool_bytes = 200;
    let manager = Arc::new(PoolManager::new(config).unwrap());

    let streams: Vec<_> = (0..3)
        .map(|_| manager.get_stream_with_capacity("b", 100).unwrap())
        .collect();
    drop(streams);

    assert_eq!(manager.stats().small_pool_free_size, 200);
    assert_eq!(manager.stats().small_pool_in_use_size, 0);
}

#[test]
fn test_concurrent_double_dispose_reports_event_once() {
    let manager = test_manager();
    let mut stream = manager.get_stream();
    stream.write_all(b"concurrent").unwrap();
    let in_use_before = manager.stats().small_pool_in_use_size;
    let stream = Arc::new(stream);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let stream = Arc::clone(&stream);
            std::thread::spawn(move || stream.dispose())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(manager.stats().small_pool_in_use_size, 0);
    assert_eq!(manager.stats().small_pool_free_size, in_use_before);
}

#[test]
fn test_safe_read_parallel_correctness() {
    let manager = test_manager();
    let mut stream = manager.get_stream();
    let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 256) as u8).collect();
    stream.write_all(&payload).unwrap();
    let stream = Arc::new(stream);
    let payload = Arc::new(payload);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let stream = Arc::clone(&stream);
            let payload = Arc::clone(&payload);
            std::thread::spawn(move || {
                let mut rng = rand::rngs::StdRng::seed_from_u64(t as u64);
                for _ in 0..50 {
                    let pos = rng.gen_range(0..999_000u64);
                    let len = rng.gen_range(1..=900usize);
                    let mut buf = vec![0u8; len];
                    let mut read_pos = pos;
                    let n = stream.safe_read(&mut buf, &mut read_pos).unwrap();
                    assert_eq!(&buf[..n], &payload[pos as usize..pos as usize + n]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(stream.position().unwrap(), 1_000_000);
}

#[test]
fn test_maximum_stream_capacity_enforcement() {
    let manager = test_manager();
    manager.set_maximum_stream_capacity(2 * 8 * 1024 * 1024);
    let mut stream = manager.get_stream();
    stream.write_all(&vec![0u8; 8 * 1024 * 1024]).unwrap();

    let length_before = stream.length().unwrap();
    let position_before = stream.position().unwrap();
    let capacity_before = stream.capacity().unwrap();

    let result = stream.write_all(&vec![0u8; 8 * 1024 * 1024 + 1]);
    assert!(result.is_err());
    assert_eq!(stream.length().unwrap(), length_before);
    assert_eq!(stream.position().unwrap(), position_before);
    assert_eq!(stream.capacity().unwrap(), capacity_before);
}

#[test]
fn test_aggressive_vs_passive_buffer_return() {
    for aggressive in [false, true] {
        let mut config = PoolManagerConfig::small_test();
        config.aggressive_buffer_return = aggressive;
        let manager = Arc::new(PoolManager::new(config).unwrap());

        let mut stream = manager.get_stream();
        stream.write_all(&vec![1u8; 20_000]).unwrap();
        let in_use_before_promotion = manager.stats().small_pool_in_use_size;
        assert!(in_use_before_promotion > 0);

        stream.get_buffer().unwrap();

        if aggressive {
            assert_eq!(manager.stats().small_pool_in_use_size, 0);
        } else {
            assert_eq!(manager.stats().small_pool_in_use_size, in_use_before_promotion);
        }

        drop(stream);
        assert_eq!(manager.stats().small_pool_in_use_size, 0);
    }
}

#[test]
fn test_disposed_stream_operations_fail() {
    let manager = test_manager();
    let mut stream = manager.get_stream();
    stream.dispose();
    assert!(stream.length().is_err());
    assert!(stream.write_all(b"x").is_err());
    assert!(stream.seek(SeekFrom::Start(0)).is_err());
}

#[test]
fn test_write_to_external_sink() {
    let manager = test_manager();
    let mut stream = manager.get_stream();
    stream.write_all(b"external sink content").unwrap();
    let mut target = Vec::new();
    stream.write_to(&mut target).unwrap();
    assert_eq!(target, b"external sink content");
}
