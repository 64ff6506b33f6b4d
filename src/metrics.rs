//! Cache Metrics
//!
//! Per-shard operation counters and a small reporting trait. Metrics are
//! reported as a `BTreeMap<String, f64>` so the key ordering is deterministic,
//! which keeps test output and log lines reproducible across runs.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Operation counters for one shard.
///
/// Updated under the shard's lock, so plain integers suffice. The public
/// cache aggregates these across shards with [`ShardMetrics::merge`].
#[derive(Debug, Default, Clone)]
pub struct ShardMetrics {
    /// Total lookups (hits + misses).
    pub lookups: u64,
    /// Lookups that found the key.
    pub hits: u64,
    /// Entries inserted (including same-key replacements).
    pub insertions: u64,
    /// Entries removed by the capacity eviction loop.
    pub evictions: u64,
    /// Entries removed by explicit erase calls.
    pub erasures: u64,
    /// Total charge inserted over the shard's lifetime.
    pub charge_inserted: u64,
    /// Total charge evicted over the shard's lifetime.
    pub charge_evicted: u64,
}

impl ShardMetrics {
    pub(crate) fn record_hit(&mut self) {
        self.lookups += 1;
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.lookups += 1;
    }

    pub(crate) fn record_insertion(&mut self, charge: u64) {
        self.insertions += 1;
        self.charge_inserted += charge;
    }

    pub(crate) fn record_eviction(&mut self, charge: u64) {
        self.evictions += 1;
        self.charge_evicted += charge;
    }

    pub(crate) fn record_erasure(&mut self) {
        self.erasures += 1;
    }

    /// Folds another shard's counters into this one.
    pub fn merge(&mut self, other: &ShardMetrics) {
        self.lookups += other.lookups;
        self.hits += other.hits;
        self.insertions += other.insertions;
        self.evictions += other.evictions;
        self.erasures += other.erasures;
        self.charge_inserted += other.charge_inserted;
        self.charge_evicted += other.charge_evicted;
    }

    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a `BTreeMap` for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("lookups".to_string(), self.lookups as f64);
        metrics.insert("hits".to_string(), self.hits as f64);
        metrics.insert("misses".to_string(), (self.lookups - self.hits) as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("erasures".to_string(), self.erasures as f64);
        metrics.insert("charge_inserted".to_string(), self.charge_inserted as f64);
        metrics.insert("charge_evicted".to_string(), self.charge_evicted as f64);
        metrics
    }
}

/// Uniform metrics-reporting interface.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Name identifying the cache implementation (e.g. "ShardedLRU").
    fn cache_name(&self) -> &'static str;
}
