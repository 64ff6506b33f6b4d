//! Pin Handles
//!
//! A [`Handle`] is an opaque, move-only reference to a cached entry. It owns
//! exactly one unit of the entry's reference count, so the entry it points to
//! stays allocated and readable for as long as the handle exists, even if the
//! cache evicts or erases the entry in the meantime.
//!
//! Handles are consumed by [`ShardedCache::release`](crate::ShardedCache::release);
//! because `release` takes the handle by value, releasing the same handle
//! twice is a compile error rather than a use-after-free. Dropping a handle
//! without releasing it leaks the entry's reference (and, eventually, the
//! entry).

use core::fmt;
use core::ptr::NonNull;

use crate::entry::Entry;

/// An owned reference to a cached entry.
///
/// Returned by `insert` and successful `lookup` calls. Reading through a
/// handle needs no lock: the fields it exposes are immutable after the entry
/// is created, and the handle's reference count keeps the entry alive.
#[must_use = "a handle owns a reference count; pass it back to `release` or the entry leaks"]
pub struct Handle<T> {
    node: NonNull<Entry<T>>,
}

// SAFETY: a Handle only permits shared reads of the entry's immutable fields,
// and releasing it on another thread drops the value there; both require the
// value to be thread-safe.
unsafe impl<T: Send + Sync> Send for Handle<T> {}
// SAFETY: concurrent lookups can hold handles to the same entry on different
// threads, so &Handle reads demand T: Sync.
unsafe impl<T: Send + Sync> Sync for Handle<T> {}

impl<T> Handle<T> {
    /// Wraps a node whose reference count already includes this handle.
    pub(crate) fn new(node: NonNull<Entry<T>>) -> Self {
        Handle { node }
    }

    /// Returns a reference to the cached value.
    #[inline]
    pub fn value(&self) -> &T {
        // SAFETY: the handle owns one reference, so the entry is alive, and
        // only non-sentinel entries are ever wrapped in handles.
        unsafe { self.node.as_ref().value() }
    }

    /// Returns the key bytes the entry was inserted under.
    #[inline]
    pub fn key(&self) -> &[u8] {
        // SAFETY: the handle owns one reference, so the entry is alive.
        unsafe { self.node.as_ref().key() }
    }

    /// Returns the charge the entry was inserted with.
    #[inline]
    pub fn charge(&self) -> u64 {
        // SAFETY: the handle owns one reference, so the entry is alive.
        unsafe { self.node.as_ref().charge }
    }

    /// Returns the entry's cached key hash, used to re-derive the owning
    /// shard on release without re-hashing the key.
    #[inline]
    pub(crate) fn hash(&self) -> u32 {
        // SAFETY: the handle owns one reference, so the entry is alive.
        unsafe { self.node.as_ref().hash }
    }

    /// Consumes the handle, surrendering its reference count to the caller.
    pub(crate) fn into_raw(self) -> *mut Entry<T> {
        self.node.as_ptr()
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key_len", &self.key().len())
            .field("charge", &self.charge())
            .finish()
    }
}
