// demos/large_buffer_promotion.rs
//! Shows a stream outgrowing its block-list backing and being promoted to
//! a single contiguous large buffer, plus the capacity ceiling a pool
//! manager can enforce on every stream it hands out.

use std::io::Write;
use std::sync::Arc;
use streampool::prelude::*;

fn main() {
    let manager = Arc::new(PoolManager::new(PoolManagerConfig::small_test()).unwrap());

    let mut stream = manager.get_stream_with_tag("promotion-demo");
    stream.write_all(&vec![7u8; 20_000]).unwrap();
    println!(
        "block-backed capacity before promotion: {}",
        stream.capacity().unwrap()
    );

    let view = stream.get_buffer().unwrap();
    println!("promoted to a contiguous buffer of {} bytes", view.len());

    drop(stream);
    println!("large pool in use after drop: {}", manager.stats().large_pool_in_use_size);

    manager.set_maximum_stream_capacity(1024);
    let mut capped = manager.get_stream();
    match capped.write_all(&vec![0u8; 2048]) {
        Ok(()) => println!("unexpectedly wrote past the cap"),
        Err(err) => println!("capacity cap rejected an oversized write: {err}"),
    }
}
