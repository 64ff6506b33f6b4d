//! Demonstrates entry pinning: a handle keeps an evicted entry alive and
//! readable until it is released.
//!
//! Run with: `cargo run --example pinning`

use shard_cache::config::ShardedCacheConfig;
use shard_cache::ShardedCache;

fn main() {
    // One shard with a 64-unit budget so the eviction order is exact.
    let config = ShardedCacheConfig {
        capacity: 64,
        shard_bits: 0,
    };
    let cache: ShardedCache<Vec<u8>> = ShardedCache::init(config, None);

    // Pin a block and keep the handle.
    let pinned = cache.insert(b"block-0", vec![0xAB; 32], 32);
    println!(
        "inserted block-0 ({} bytes), usage = {}/{}",
        pinned.value().len(),
        cache.usage(),
        cache.capacity()
    );

    // Fill the cache until block-0 is evicted.
    for i in 1..4u8 {
        let key = format!("block-{i}");
        let handle = cache.insert(key.as_bytes(), vec![i; 32], 32);
        cache.release(handle);
        println!("inserted {key}, usage = {}/{}", cache.usage(), cache.capacity());
    }

    match cache.lookup(b"block-0") {
        Some(_) => unreachable!("block-0 should have been evicted"),
        None => println!("block-0 is no longer discoverable by key"),
    }

    // The pinned handle still reads the original bytes.
    println!(
        "pinned handle still sees {} bytes of 0x{:02X}",
        pinned.value().len(),
        pinned.value()[0]
    );

    cache.release(pinned);
    println!("released the pin; block-0 is now freed");
}
