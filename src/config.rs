//! Cache Configuration
//!
//! Configuration for the sharded cache. The struct has all public fields for
//! simple instantiation: create it with every field set and hand it to
//! [`ShardedCache::init`](crate::ShardedCache::init).
//!
//! # Sizing Guidelines
//!
//! - **`capacity`** is a total charge budget in whatever unit insertions are
//!   charged in: bytes for a block cache, a plain count when every entry is
//!   charged 1. It is split across shards with ceiling division, so the sum
//!   of per-shard capacities is at least the requested total.
//! - **`shard_bits`** controls lock granularity: the cache has
//!   `2^shard_bits` shards, each with its own lock. More shards means less
//!   contention but a more fragmented capacity budget, since each shard
//!   evicts against its own slice of the total. The default of 4 (16 shards)
//!   serves most multi-threaded workloads.
//!
//! # Examples
//!
//! ```
//! use shard_cache::config::ShardedCacheConfig;
//! use shard_cache::ShardedCache;
//!
//! // 8MB block cache with the default 16 shards.
//! let config = ShardedCacheConfig {
//!     capacity: 8 * 1024 * 1024,
//!     shard_bits: 4,
//! };
//! let cache: ShardedCache<Vec<u8>> = ShardedCache::init(config, None);
//! ```

use core::fmt;

/// Number of shard-selection bits used when no explicit count is configured.
pub const DEFAULT_SHARD_BITS: u32 = 4;

/// Configuration for a [`ShardedCache`](crate::ShardedCache).
#[derive(Clone, Copy)]
pub struct ShardedCacheConfig {
    /// Total charge budget across all shards.
    pub capacity: u64,
    /// The cache has `2^shard_bits` shards. Must be at most 16.
    pub shard_bits: u32,
}

impl fmt::Debug for ShardedCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCacheConfig")
            .field("capacity", &self.capacity)
            .field("shard_bits", &self.shard_bits)
            .finish()
    }
}
