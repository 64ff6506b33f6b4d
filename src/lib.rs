#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## The cache contract
//!
//! | Operation | Input | Output | Notes |
//! |-----------|-------|--------|-------|
//! | [`insert`](ShardedCache::insert) | key bytes, value, charge | [`Handle`] | May evict cold entries; displaces an existing same-key entry |
//! | [`lookup`](ShardedCache::lookup) | key bytes | `Option<Handle>` | Promotes the entry to most-recently-used on a hit |
//! | [`release`](ShardedCache::release) | `Handle` (by value) | — | Exactly once per handle; enforced by move semantics |
//! | [`erase`](ShardedCache::erase) | key bytes | — | No-op if the key is absent |
//! | [`Handle::value`] | `&Handle` | `&T` | Pure accessor, no lock |
//! | [`new_id`](ShardedCache::new_id) | — | `u64` | Strictly increasing, process-unique |
//!
//! ## Pinning
//!
//! ```rust
//! use shard_cache::{ShardedCache, ShardedCacheConfig};
//!
//! // One shard with a tiny budget: the second insert evicts the first entry.
//! let config = ShardedCacheConfig { capacity: 1, shard_bits: 0 };
//! let cache: ShardedCache<&'static str> = ShardedCache::init(config, None);
//!
//! let pinned = cache.insert(b"block", "payload", 1);
//! let h = cache.insert(b"other", "noise", 1);
//! cache.release(h);
//!
//! // Evicted from the index, but the handle keeps it readable.
//! assert!(cache.lookup(b"block").is_none());
//! assert_eq!(*pinned.value(), "payload");
//! cache.release(pinned);
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration struct for the sharded cache
//! - [`metrics`]: per-shard operation counters and the reporting trait

#![no_std]

/// Intrusive cache entry node.
///
/// The shared node type that the hash table and the LRU list both thread
/// their links through, plus the [`Deleter`] callback type.
mod entry;

/// Open-chaining hash table specialized for entry nodes.
///
/// **Note**: internal infrastructure built on raw pointer chains; not exposed
/// to library consumers.
mod table;

/// A single capacity-bounded LRU shard: hash table, recency list, usage
/// accounting, and the eviction loop.
mod shard;

/// Move-only pin handles returned by insert and lookup.
mod handle;

/// The public sharded cache.
mod cache;

/// Cache configuration structures.
pub mod config;

/// Cache metrics system.
///
/// Per-shard operation counters aggregated across shards, reported through
/// the [`CacheMetrics`] trait as a `BTreeMap` for deterministic ordering.
pub mod metrics;

pub use cache::ShardedCache;
pub use config::ShardedCacheConfig;
pub use entry::Deleter;
pub use handle::Handle;
pub use metrics::CacheMetrics;
