// demos/basic_usage.rs
//! Renting a stream from a pool manager, writing through it, and reading
//! the content back out as a contiguous buffer.

use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use streampool::prelude::*;

fn main() {
    tracing_subscriber::fmt::init();

    let manager = Arc::new(PoolManager::default());
    // Route block/large-buffer/stream lifecycle events through `tracing`
    // instead of the default no-op sink.
    manager.set_event_sink(Arc::new(TracingEventSink));

    let mut stream = manager.get_stream_with_tag("demo-basic");
    for chunk in 0..20 {
        writeln!(stream, "chunk {chunk}").unwrap();
    }

    println!(
        "wrote {} bytes across {} bytes of capacity",
        stream.length().unwrap(),
        stream.capacity().unwrap()
    );

    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut content = String::new();
    stream.read_to_string(&mut content).unwrap();
    print!("{content}");

    let stats_before = manager.stats();
    drop(stream);
    let stats_after = manager.stats();
    println!(
        "small pool in-use bytes: {} -> {}",
        stats_before.small_pool_in_use_size, stats_after.small_pool_in_use_size
    );
}
