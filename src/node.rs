//! Versioned multi-level list node.

use core::mem::MaybeUninit;
use core::ptr;

/// One key in the ordered chain.
///
/// `i_time` is the version at which the node became visible; `r_time`
/// is 0 while the node is logically present, otherwise the version at
/// which it was logically removed. A tombstoned node stays stitched
/// into the chain until the coordinator decides no in-flight scan can
/// still reach it.
pub(crate) struct Node<K, V> {
    pub(crate) key: MaybeUninit<K>,
    pub(crate) value: MaybeUninit<V>,
    pub(crate) height: usize,

    /// Per-level neighbors. Index 0 is the base level.
    pub(crate) prev: Box<[*mut Node<K, V>]>,
    pub(crate) next: Box<[*mut Node<K, V>]>,

    pub(crate) i_time: u64,
    pub(crate) r_time: u64,

    /// True once the node has been unlinked from every level.
    pub(crate) unstitched: bool,
    /// Head/tail carry no key or value and are never unstitched.
    pub(crate) sentinel: bool,
}

impl<K, V> Node<K, V> {
    pub(crate) fn alloc(key: K, value: V, height: usize, i_time: u64) -> *mut Self {
        Box::into_raw(Box::new(Node {
            key: MaybeUninit::new(key),
            value: MaybeUninit::new(value),
            height,
            prev: vec![ptr::null_mut(); height].into_boxed_slice(),
            next: vec![ptr::null_mut(); height].into_boxed_slice(),
            i_time,
            r_time: 0,
            unstitched: false,
            sentinel: false,
        }))
    }

    pub(crate) fn sentinel(height: usize) -> *mut Self {
        Box::into_raw(Box::new(Node {
            key: MaybeUninit::uninit(),
            value: MaybeUninit::uninit(),
            height,
            prev: vec![ptr::null_mut(); height].into_boxed_slice(),
            next: vec![ptr::null_mut(); height].into_boxed_slice(),
            i_time: 0,
            r_time: 0,
            unstitched: false,
            sentinel: true,
        }))
    }

    /// # Safety
    /// Must not be called on a sentinel.
    #[inline]
    pub(crate) unsafe fn key(&self) -> &K {
        self.key.assume_init_ref()
    }

    /// # Safety
    /// Must not be called on a sentinel.
    #[inline]
    pub(crate) unsafe fn value(&self) -> &V {
        self.value.assume_init_ref()
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.r_time == 0
    }
}

impl<K, V> Drop for Node<K, V> {
    fn drop(&mut self) {
        if !self.sentinel {
            // SAFETY: non-sentinel nodes are always constructed with an
            // initialized key and value.
            unsafe {
                self.key.assume_init_drop();
                self.value.assume_init_drop();
            }
        }
    }
}
