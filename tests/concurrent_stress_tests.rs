//! Stress Tests
//!
//! High-contention workloads hammering shared keys across threads, plus a
//! whole-lifetime accounting check that every inserted entry's deleter runs
//! exactly once no matter how it leaves the cache (eviction, erase,
//! replacement, or teardown).

use scoped_threadpool::Pool;
use shard_cache::{Deleter, ShardedCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const NUM_THREADS: usize = 16;
const OPS_PER_THREAD: usize = 10_000;

#[test]
fn stress_high_contention_mixed_ops() {
    let cache: Arc<ShardedCache<usize>> = Arc::new(ShardedCache::new(1000));

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let key = format!("key_{}", i % 500);
                match i % 4 {
                    0 => {
                        let h = cache.insert(key.as_bytes(), t * OPS_PER_THREAD + i, 1);
                        cache.release(h);
                    }
                    1 | 2 => {
                        if let Some(h) = cache.lookup(key.as_bytes()) {
                            cache.release(h);
                        }
                    }
                    _ => cache.erase(key.as_bytes()),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.usage() <= cache.capacity());
}

#[test]
fn stress_scoped_threads_borrow_cache() {
    // The cache works without Arc: scoped threads borrow it directly.
    let cache: ShardedCache<u64> = ShardedCache::new(100_000);
    let mut pool = Pool::new(8);

    pool.scoped(|scope| {
        for t in 0..8u64 {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..1000u64 {
                    let key = format!("scoped_{t}_{i}");
                    let h = cache.insert(key.as_bytes(), t * 1000 + i, 1);
                    assert_eq!(*h.value(), t * 1000 + i);
                    cache.release(h);
                }
            });
        }
    });

    assert_eq!(cache.len(), 8 * 1000);
}

#[test]
fn stress_deleter_runs_exactly_once_per_insert() {
    let deleted = Arc::new(AtomicUsize::new(0));
    let inserted = Arc::new(AtomicUsize::new(0));

    fn tracking_deleter(counter: &Arc<AtomicUsize>) -> Deleter<usize> {
        let counter = Arc::clone(counter);
        Box::new(move |_key, _value| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    {
        // Small capacity so evictions, replacements, and erasures all happen.
        let cache: Arc<ShardedCache<usize>> = Arc::new(ShardedCache::new(64));

        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            let deleted = Arc::clone(&deleted);
            let inserted = Arc::clone(&inserted);
            handles.push(thread::spawn(move || {
                for i in 0..2000usize {
                    let key = format!("k_{}", (t + i) % 200);
                    match i % 3 {
                        0 | 1 => {
                            let h = cache.insert_with_deleter(
                                key.as_bytes(),
                                i,
                                1,
                                tracking_deleter(&deleted),
                            );
                            inserted.fetch_add(1, Ordering::SeqCst);
                            cache.release(h);
                        }
                        _ => cache.erase(key.as_bytes()),
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // Entries still indexed at this point die with the cache.
    }

    assert_eq!(
        deleted.load(Ordering::SeqCst),
        inserted.load(Ordering::SeqCst),
        "every inserted entry must be destroyed exactly once"
    );
}

#[test]
fn stress_pin_release_storm_on_one_entry() {
    // A single entry's refcount is pushed up and down by many threads; the
    // count must balance back so teardown sees exactly the cache's reference.
    let cache: Arc<ShardedCache<u64>> = Arc::new(ShardedCache::new(100));
    let h = cache.insert(b"contended", 1, 1);
    cache.release(h);

    let mut handles = Vec::new();
    for _ in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            let mut pins = Vec::new();
            for i in 0..1000 {
                pins.push(cache.lookup(b"contended").expect("never evicted"));
                if i % 7 == 0 {
                    // Release in bursts to vary the interleaving.
                    for h in pins.drain(..) {
                        cache.release(h);
                    }
                }
            }
            for h in pins {
                cache.release(h);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let h = cache.lookup(b"contended").unwrap();
    assert_eq!(*h.value(), 1);
    cache.release(h);
}
