//! Intrusive Cache Entry
//!
//! This module provides the `Entry<T>` node shared by the hash table and the
//! LRU list. An entry owns a copy of its key, the cached value, an optional
//! disposal callback, and the two sets of intrusive links: a singly linked
//! hash-chain pointer owned by the table, and doubly linked LRU pointers owned
//! by the shard.
//!
//! # Reference counting
//!
//! Every entry carries a plain (non-atomic) reference count, always mutated
//! under the owning shard's lock. The shard's index structures hold one
//! reference while the entry is reachable by key; each outstanding
//! [`Handle`](crate::Handle) holds one more. The entry is destroyed exactly
//! once, when the count reaches zero.
//!
//! **Note**: This module is internal infrastructure and should not be used
//! directly by library consumers. It exposes unsafe raw pointer operations
//! that require careful invariant maintenance.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr;

/// Disposal callback bound at insertion time.
///
/// Invoked exactly once, with the key bytes and the owned value, when the
/// entry's reference count reaches zero. The callback runs while the owning
/// shard's lock is held, so it must not call back into the same cache.
pub type Deleter<T> = Box<dyn FnOnce(&[u8], T) + Send>;

/// A node in a shard's hash table and LRU list.
///
/// The value is wrapped in `MaybeUninit` so the shard's list sentinel can
/// exist without a value of type `T`. Every non-sentinel entry created by
/// [`Entry::new`] carries an initialized value until [`Entry::destroy`] runs.
pub(crate) struct Entry<T> {
    /// Owned copy of the key. Empty for the sentinel.
    key: Box<[u8]>,
    /// The cached value. Uninitialized only on the sentinel.
    value: MaybeUninit<T>,
    /// Disposal callback; `None` means the value is simply dropped.
    deleter: Option<Deleter<T>>,
    /// Capacity cost this entry counts against shard usage while cached.
    pub(crate) charge: u64,
    /// Hash of the key, computed once at insertion. Reused for bucket
    /// placement and shard routing; never recomputed.
    pub(crate) hash: u32,
    /// References held by the shard's index structures plus outstanding handles.
    pub(crate) refs: usize,
    /// Next entry in the same hash bucket's chain. Owned by the table.
    pub(crate) next_hash: *mut Entry<T>,
    /// Previous entry in the shard's LRU list. Owned by the shard.
    pub(crate) prev: *mut Entry<T>,
    /// Next entry in the shard's LRU list. Owned by the shard.
    pub(crate) next: *mut Entry<T>,
}

impl<T> Entry<T> {
    /// Creates a new entry holding an owned copy of `key`.
    ///
    /// The entry starts with a reference count of 2: one for the shard's
    /// index structures, one for the handle returned to the inserting caller.
    pub(crate) fn new(
        key: &[u8],
        value: T,
        charge: u64,
        hash: u32,
        deleter: Option<Deleter<T>>,
    ) -> Box<Entry<T>> {
        Box::new(Entry {
            key: key.to_vec().into_boxed_slice(),
            value: MaybeUninit::new(value),
            deleter,
            charge,
            hash,
            refs: 2,
            next_hash: ptr::null_mut(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        })
    }

    /// Creates a sentinel entry without initializing the value.
    ///
    /// Sentinels anchor a shard's circular LRU list and are never looked up,
    /// referenced, or destroyed through [`Entry::destroy`].
    pub(crate) fn sentinel() -> Entry<T> {
        Entry {
            key: Vec::new().into_boxed_slice(),
            value: MaybeUninit::uninit(),
            deleter: None,
            charge: 0,
            hash: 0,
            refs: 0,
            next_hash: ptr::null_mut(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Returns the key bytes this entry was inserted under.
    #[inline]
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns a reference to the cached value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sentinel entries that have not been
    /// destroyed; those always carry an initialized value.
    #[inline]
    pub(crate) unsafe fn value(&self) -> &T {
        // SAFETY: guaranteed initialized by the caller contract above.
        unsafe { self.value.assume_init_ref() }
    }

    /// Frees a detached node, running its deleter with the owned value.
    ///
    /// # Safety
    ///
    /// `node` must be a non-sentinel entry created by [`Entry::new`] whose
    /// reference count has reached zero, and must no longer be reachable from
    /// any table chain, LRU list, or handle. After this call the pointer is
    /// dangling.
    pub(crate) unsafe fn destroy(node: *mut Entry<T>) {
        // SAFETY: node came from Box::into_raw of a live entry (caller contract).
        let mut entry = unsafe { Box::from_raw(node) };
        // SAFETY: non-sentinel entries hold an initialized value until destroyed,
        // and the MaybeUninit wrapper prevents a second drop when the Box goes away.
        let value = unsafe { entry.value.assume_init_read() };
        match entry.deleter.take() {
            Some(deleter) => deleter(&entry.key, value),
            None => drop(value),
        }
    }
}

impl<T> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key_len", &self.key.len())
            .field("charge", &self.charge)
            .field("hash", &self.hash)
            .field("refs", &self.refs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_entry_fields() {
        let entry = Entry::new(b"key", String::from("value"), 7, 0xdead_beef, None);
        assert_eq!(entry.key(), b"key");
        assert_eq!(entry.charge, 7);
        assert_eq!(entry.hash, 0xdead_beef);
        assert_eq!(entry.refs, 2);
        assert!(entry.next_hash.is_null());
        assert!(entry.prev.is_null());
        assert!(entry.next.is_null());
        // SAFETY: freshly created non-sentinel entry.
        assert_eq!(unsafe { entry.value() }, "value");
        // SAFETY: detached node, not referenced anywhere else.
        unsafe { Entry::destroy(Box::into_raw(entry)) };
    }

    #[test]
    fn test_destroy_without_deleter_drops_value() {
        let dropped = Arc::new(AtomicUsize::new(0));

        struct Probe(Arc<AtomicUsize>);
        impl Drop for Probe {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let entry = Entry::new(b"k", Probe(Arc::clone(&dropped)), 1, 0, None);
        let node = Box::into_raw(entry);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        // SAFETY: detached node, not referenced anywhere else.
        unsafe { Entry::destroy(node) };
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_destroy_runs_deleter_with_key_and_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let deleter: Deleter<u32> = Box::new(move |key, value| {
            assert_eq!(key, b"the-key");
            assert_eq!(value, 42);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let node = Box::into_raw(Entry::new(b"the-key", 42u32, 1, 9, Some(deleter)));
        // SAFETY: detached node, not referenced anywhere else.
        unsafe { Entry::destroy(node) };
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sentinel_has_no_value() {
        let sentinel: Entry<String> = Entry::sentinel();
        assert!(sentinel.key().is_empty());
        assert_eq!(sentinel.refs, 0);
        assert_eq!(sentinel.charge, 0);
    }
}
