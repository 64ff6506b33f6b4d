//! LRU Shard
//!
//! One independently locked partition of the cache: a [`HandleTable`] for
//! lookup by key, an intrusive circular LRU list for recency order, and a
//! running usage counter checked against a fixed capacity.
//!
//! # Algorithm
//!
//! Entries enter at the most-recently-used end of the list and are promoted
//! there again on every successful lookup. Once usage exceeds capacity,
//! entries are evicted strictly from the least-recently-used end, regardless
//! of whether callers still hold handles to them. Eviction only removes the
//! shard's own reference and its index entries: a pinned entry stays
//! allocated and readable through its handles, it just stops being
//! discoverable by key and stops counting against usage.
//!
//! # Thread Safety
//!
//! This type is not synchronized; [`ShardedCache`](crate::ShardedCache) wraps
//! each shard in a `Mutex` and holds the lock for the full duration of every
//! operation, including any deleters that run when a reference count reaches
//! zero.

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;
use core::ptr::NonNull;

use crate::entry::{Deleter, Entry};
use crate::handle::Handle;
use crate::metrics::ShardMetrics;
use crate::table::HandleTable;

/// A single capacity-bounded LRU cache partition.
///
/// # Safety
///
/// This struct manages raw pointers to heap-allocated entries. The pointers
/// stay valid because every entry is kept alive by its reference count: the
/// shard's own structures hold one reference while the entry is indexed, and
/// each outstanding handle holds one more.
pub(crate) struct LruShard<T> {
    /// Eviction threshold; set once before the shard takes traffic.
    capacity: u64,
    /// Sum of the charges of all indexed entries.
    usage: u64,
    /// Sentinel of the circular LRU list. `sentinel.next` is the least
    /// recently used entry, `sentinel.prev` the most recently used.
    sentinel: *mut Entry<T>,
    table: HandleTable<T>,
    metrics: ShardMetrics,
}

// SAFETY: LruShard owns every node it points to and all mutation requires
// &mut self; it is safe to move across threads when the values are.
unsafe impl<T: Send> Send for LruShard<T> {}

impl<T> LruShard<T> {
    pub(crate) fn new() -> Self {
        let sentinel = Box::into_raw(Box::new(Entry::sentinel()));
        // SAFETY: sentinel is a fresh valid allocation; linking it to itself
        // forms the empty circular list.
        unsafe {
            (*sentinel).next = sentinel;
            (*sentinel).prev = sentinel;
        }
        LruShard {
            capacity: 0,
            usage: 0,
            sentinel,
            table: HandleTable::new(),
            metrics: ShardMetrics::default(),
        }
    }

    /// Sets the eviction threshold. Not safe to change under traffic; the
    /// owning cache calls this once during construction.
    pub(crate) fn set_capacity(&mut self, capacity: u64) {
        self.capacity = capacity;
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Sum of charges of the entries currently indexed by this shard.
    /// Pinned-but-evicted entries are not counted.
    #[inline]
    pub(crate) fn usage(&self) -> u64 {
        self.usage
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub(crate) fn metrics(&self) -> &ShardMetrics {
        &self.metrics
    }

    /// Inserts an entry, replacing any existing entry with the same key, then
    /// evicts from the cold end until usage fits capacity again.
    ///
    /// The returned handle pins the new entry; it stays valid even if the
    /// eviction loop immediately throws the entry out (possible when `charge`
    /// alone exceeds the shard's capacity).
    pub(crate) fn insert(
        &mut self,
        key: &[u8],
        hash: u32,
        value: T,
        charge: u64,
        deleter: Option<Deleter<T>>,
    ) -> Handle<T> {
        let node = Box::into_raw(Entry::new(key, value, charge, hash, deleter));
        // SAFETY: node is fresh and fully initialized; every pointer touched
        // below is either the node itself, the sentinel, or a live indexed
        // entry kept alive by the shard's reference.
        unsafe {
            self.list_append(node);
            self.usage += charge;
            self.metrics.record_insertion(charge);

            let old = self.table.insert(node);
            if !old.is_null() {
                Self::list_remove(old);
                self.usage -= (*old).charge;
                self.unref(old);
            }

            while self.usage > self.capacity && (*self.sentinel).next != self.sentinel {
                let victim = (*self.sentinel).next;
                self.table.remove((*victim).key(), (*victim).hash);
                Self::list_remove(victim);
                self.usage -= (*victim).charge;
                self.metrics.record_eviction((*victim).charge);
                self.unref(victim);
            }

            Handle::new(NonNull::new_unchecked(node))
        }
    }

    /// Finds an entry by key, promotes it to the hot end of the list, and
    /// returns a pinning handle.
    pub(crate) fn lookup(&mut self, key: &[u8], hash: u32) -> Option<Handle<T>> {
        let node = self.table.lookup(key, hash);
        if node.is_null() {
            self.metrics.record_miss();
            return None;
        }
        // SAFETY: node is indexed, hence alive; relinking moves it within the
        // same circular list.
        unsafe {
            (*node).refs += 1;
            Self::list_remove(node);
            self.list_append(node);
            self.metrics.record_hit();
            Some(Handle::new(NonNull::new_unchecked(node)))
        }
    }

    /// Consumes a handle, dropping its reference. Runs the entry's deleter if
    /// this was the last reference.
    pub(crate) fn release(&mut self, handle: Handle<T>) {
        let node = handle.into_raw();
        // SAFETY: the handle owned one reference, so node is alive.
        unsafe { self.unref(node) };
    }

    /// Removes an entry from the index structures if present. No-op for
    /// absent keys. Outstanding handles keep the entry alive as with eviction.
    pub(crate) fn erase(&mut self, key: &[u8], hash: u32) {
        let node = self.table.remove(key, hash);
        if !node.is_null() {
            // SAFETY: node was indexed until the line above, hence alive.
            unsafe {
                Self::list_remove(node);
                self.usage -= (*node).charge;
                self.metrics.record_erasure();
                self.unref(node);
            }
        }
    }

    /// Drops one reference; destroys the entry when the count reaches zero.
    ///
    /// # Safety
    ///
    /// `node` must be a live non-sentinel entry with a positive refcount.
    unsafe fn unref(&mut self, node: *mut Entry<T>) {
        // SAFETY: caller guarantees node is live with refs > 0.
        unsafe {
            debug_assert!((*node).refs > 0);
            (*node).refs -= 1;
            if (*node).refs == 0 {
                Entry::destroy(node);
            }
        }
    }

    /// Unlinks a node from the circular list.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry currently linked into a list.
    unsafe fn list_remove(node: *mut Entry<T>) {
        // SAFETY: a linked node's neighbors are live list members.
        unsafe {
            (*(*node).next).prev = (*node).prev;
            (*(*node).prev).next = (*node).next;
        }
    }

    /// Links a node in just before the sentinel, making it the most recently
    /// used entry.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry not currently linked into any list.
    unsafe fn list_append(&mut self, node: *mut Entry<T>) {
        // SAFETY: sentinel and its neighbors are always valid list members.
        unsafe {
            (*node).next = self.sentinel;
            (*node).prev = (*self.sentinel).prev;
            (*(*node).prev).next = node;
            (*(*node).next).prev = node;
        }
    }
}

impl<T> Drop for LruShard<T> {
    /// Tears down the shard, dropping the shard's own reference on every
    /// remaining entry. A caller still holding a handle at this point is a
    /// programming error; such an entry is leaked rather than freed out from
    /// under the handle.
    fn drop(&mut self) {
        // SAFETY: the list contains only live entries plus the sentinel, and
        // nothing else references the sentinel allocation.
        unsafe {
            let mut node = (*self.sentinel).next;
            while node != self.sentinel {
                let next = (*node).next;
                debug_assert_eq!((*node).refs, 1, "handle outstanding at cache teardown");
                self.unref(node);
                node = next;
            }
            drop(Box::from_raw(self.sentinel));
        }
    }
}

impl<T> fmt::Debug for LruShard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruShard")
            .field("capacity", &self.capacity)
            .field("usage", &self.usage)
            .field("len", &self.table.len())
            .finish()
    }
}
