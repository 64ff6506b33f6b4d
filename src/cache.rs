//! Sharded LRU Cache
//!
//! The public cache type. Keys are partitioned across `2^shard_bits`
//! independently locked [`LruShard`]s; every operation hashes the key once,
//! routes to one shard, and runs to completion under that shard's lock.
//! Operations on different shards proceed fully in parallel with no
//! cross-shard coordination.
//!
//! Shard selection uses the *top* bits of the 32-bit key hash while the
//! in-shard hash table indexes with the *low* bits, so the two decisions stay
//! decorrelated without a second hash.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        ShardedCache                            │
//! │                                                                │
//! │  hash(key) >> (32 - shard_bits)  ──▶  shard selection          │
//! │                                                                │
//! │  ┌────────────┐ ┌────────────┐       ┌────────────┐            │
//! │  │  Shard 0   │ │  Shard 1   │  ...  │  Shard N-1 │            │
//! │  │  [Mutex]   │ │  [Mutex]   │       │  [Mutex]   │            │
//! │  │  table     │ │  table     │       │  table     │            │
//! │  │  LRU list  │ │  LRU list  │       │  LRU list  │            │
//! │  └────────────┘ └────────────┘       └────────────┘            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Why Mutex instead of RwLock?
//!
//! Every `lookup` is a write: a hit promotes the entry to the hot end of its
//! shard's LRU list and bumps its reference count. An `RwLock` would give no
//! read parallelism, so each shard uses a plain `parking_lot::Mutex` and
//! concurrency comes from sharding alone.

extern crate alloc;

#[cfg(not(feature = "hashbrown"))]
extern crate std;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::hash::BuildHasher;

use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::config::ShardedCacheConfig;
use crate::entry::Deleter;
use crate::handle::Handle;
use crate::metrics::{CacheMetrics, ShardMetrics};
use crate::shard::LruShard;

/// A sharded, capacity-bounded LRU cache with pinnable entry handles.
///
/// Maps opaque byte-string keys to values of type `T`. Inserting or looking
/// up a key returns a [`Handle`] that pins the entry: the entry stays
/// readable through the handle even after eviction, erase, or same-key
/// replacement, and is destroyed only when its last reference is released.
///
/// # Handle contract
///
/// Every handle must be passed back to [`release`](Self::release) exactly
/// once. Handles are move-only, so a double release does not compile;
/// dropping a handle without releasing it leaks the entry. All entries must
/// be released before the cache itself is dropped.
///
/// # Example
///
/// ```
/// use shard_cache::ShardedCache;
///
/// let cache: ShardedCache<String> = ShardedCache::new(1024);
/// let handle = cache.insert(b"key", String::from("value"), 16);
/// assert_eq!(handle.value(), "value");
/// cache.release(handle);
/// ```
pub struct ShardedCache<T, S = DefaultHashBuilder> {
    shards: Box<[Mutex<LruShard<T>>]>,
    shard_bits: u32,
    hash_builder: S,
    /// Monotonic id counter, guarded independently of all shard locks.
    last_id: Mutex<u64>,
}

// SAFETY: every entry is owned by exactly one shard behind a Mutex; moving
// the cache moves that ownership wholesale, which is fine whenever T is Send.
unsafe impl<T: Send, S: Send> Send for ShardedCache<T, S> {}
// SAFETY: a shared cache hands out handles on any thread, and handles to the
// same entry read &T concurrently, so Sync additionally requires T: Sync.
unsafe impl<T: Send + Sync, S: Sync> Sync for ShardedCache<T, S> {}

impl<T> ShardedCache<T, DefaultHashBuilder> {
    /// Creates a cache with the given total charge capacity and the default
    /// shard count (16).
    pub fn new(capacity: u64) -> Self {
        Self::init(
            ShardedCacheConfig {
                capacity,
                shard_bits: crate::config::DEFAULT_SHARD_BITS,
            },
            None,
        )
    }

    /// Creates a cache from a configuration with an optional hasher.
    ///
    /// The total capacity is divided across shards with ceiling division, so
    /// the sum of per-shard capacities is at least `config.capacity`.
    pub fn init(config: ShardedCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<T, S: BuildHasher> ShardedCache<T, S> {
    /// Creates a cache with a custom hash builder.
    ///
    /// The builder is fixed for the cache's lifetime, so each key hashes to
    /// the same 32-bit value (and therefore the same shard and bucket) on
    /// every operation.
    pub fn init_with_hasher(config: ShardedCacheConfig, hash_builder: S) -> Self {
        debug_assert!(config.shard_bits <= 16, "shard_bits out of range");
        let shard_count = 1usize << config.shard_bits;
        let per_shard = config.capacity.div_ceil(shard_count as u64);

        let shards: Vec<_> = (0..shard_count)
            .map(|_| {
                let mut shard = LruShard::new();
                shard.set_capacity(per_shard);
                Mutex::new(shard)
            })
            .collect();

        ShardedCache {
            shards: shards.into_boxed_slice(),
            shard_bits: config.shard_bits,
            hash_builder,
            last_id: Mutex::new(0),
        }
    }

    /// Hashes a key once; the result is cached on the entry and reused for
    /// both shard routing and bucket placement.
    #[inline]
    fn hash_key(&self, key: &[u8]) -> u32 {
        self.hash_builder.hash_one(key) as u32
    }

    /// Selects a shard from the hash's top bits. The in-shard table uses the
    /// low bits, keeping the two choices decorrelated.
    #[inline]
    fn shard_index(&self, hash: u32) -> usize {
        if self.shard_bits == 0 {
            0
        } else {
            (hash >> (32 - self.shard_bits)) as usize
        }
    }

    /// Inserts a key/value pair, charging `charge` against the owning
    /// shard's capacity, and returns a handle pinning the new entry.
    ///
    /// An existing entry under the same key is displaced immediately:
    /// subsequent lookups see the new value, while outstanding handles to the
    /// old entry keep reading the old value until released. The insert may
    /// evict cold entries from the same shard to get back under capacity.
    pub fn insert(&self, key: &[u8], value: T, charge: u64) -> Handle<T> {
        let hash = self.hash_key(key);
        self.shards[self.shard_index(hash)]
            .lock()
            .insert(key, hash, value, charge, None)
    }

    /// Like [`insert`](Self::insert), but registers a deleter invoked exactly
    /// once, with the key bytes and the owned value, when the entry's
    /// reference count reaches zero.
    ///
    /// The deleter runs while the owning shard's lock is held. It must not
    /// call back into this cache; doing so deadlocks on the same shard.
    pub fn insert_with_deleter(
        &self,
        key: &[u8],
        value: T,
        charge: u64,
        deleter: Deleter<T>,
    ) -> Handle<T> {
        let hash = self.hash_key(key);
        self.shards[self.shard_index(hash)]
            .lock()
            .insert(key, hash, value, charge, Some(deleter))
    }

    /// Looks up a key, promoting the entry to most-recently-used on a hit.
    ///
    /// Returns a pinning handle, or `None` if the key is absent.
    pub fn lookup(&self, key: &[u8]) -> Option<Handle<T>> {
        let hash = self.hash_key(key);
        self.shards[self.shard_index(hash)].lock().lookup(key, hash)
    }

    /// Releases a handle, dropping its reference on the entry.
    ///
    /// The owning shard is re-derived from the hash cached on the entry, so
    /// release needs neither the key nor a re-hash. If this was the entry's
    /// last reference its deleter runs (under the shard lock) and the entry
    /// is freed.
    pub fn release(&self, handle: Handle<T>) {
        let hash = handle.hash();
        self.shards[self.shard_index(hash)].lock().release(handle);
    }

    /// Removes a key from the cache if present; no-op otherwise.
    ///
    /// Like eviction, this only removes the cache's own reference:
    /// outstanding handles keep the entry alive and readable.
    pub fn erase(&self, key: &[u8]) {
        let hash = self.hash_key(key);
        self.shards[self.shard_index(hash)].lock().erase(key, hash);
    }

    /// Returns a process-unique, strictly increasing id.
    ///
    /// Callers that share this cache can prefix their keys with an id to
    /// partition the key space without further coordination.
    pub fn new_id(&self) -> u64 {
        let mut last_id = self.last_id.lock();
        *last_id += 1;
        *last_id
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the total number of indexed entries across all shards.
    ///
    /// Locks each shard in turn, so the value may be stale under concurrent
    /// traffic.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Returns `true` if no shard indexes any entry.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().len() == 0)
    }

    /// Returns the summed charge of all indexed entries. Pinned-but-evicted
    /// entries do not count.
    pub fn usage(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().usage()).sum()
    }

    /// Returns the total capacity across all shards. Due to ceiling division
    /// this can slightly exceed the configured capacity.
    pub fn capacity(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().capacity()).sum()
    }
}

impl<T, S: BuildHasher> CacheMetrics for ShardedCache<T, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut combined = ShardMetrics::default();
        let mut usage = 0u64;
        for shard in self.shards.iter() {
            let shard = shard.lock();
            combined.merge(shard.metrics());
            usage += shard.usage();
        }
        let mut map = combined.to_btreemap();
        map.insert("usage".to_string(), usage as f64);
        map.insert("capacity".to_string(), self.capacity() as f64);
        map
    }

    fn cache_name(&self) -> &'static str {
        "ShardedLRU"
    }
}

impl<T, S> fmt::Debug for ShardedCache<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCache")
            .field("shards", &self.shards.len())
            .finish()
    }
}
