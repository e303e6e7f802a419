//! The skip-hash container: construction, point operations, ordered
//! point queries.

use core::hash::Hash;
use std::collections::HashMap;

use foldhash::fast::FixedState;
use parking_lot::RwLock;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::coordinator::RangeCoordinator;
use crate::node::Node;
use crate::{DEFAULT_FAST_PATH_TRIES, DEFAULT_MAX_LEVEL};

/// A key/value pair returned by queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<K, V> {
    /// The entry's key.
    pub key: K,
    /// The entry's value.
    pub value: V,
}

/// Everything behind the container lock: the chain, the index, the
/// coordinator, and the level RNG.
pub(crate) struct Inner<K, V> {
    pub(crate) max_level: usize,

    pub(crate) head: *mut Node<K, V>,
    pub(crate) tail: *mut Node<K, V>,

    /// Key to live node. Tombstones are never in here.
    pub(crate) index: HashMap<K, *mut Node<K, V>, FixedState>,
    pub(crate) len: usize,

    pub(crate) rng: Box<dyn RngCore + Send>,
    pub(crate) rqc: RangeCoordinator<K, V>,
}

/// Concurrent ordered map: hash index for point operations, skip list
/// for ordered traversal, and a coordinator that keeps range scans
/// consistent under concurrent updates.
///
/// Shared state is guarded by a single reader/writer lock. Reads
/// (lookups, ordered queries, range counting, fast-path scans) take it
/// shared; mutations and slow-path scan bookkeeping take it exclusive.
pub struct SkipHash<K, V> {
    inner: RwLock<Inner<K, V>>,
    fast_path_tries: usize,
}

// SAFETY: the raw node pointers inside `Inner` are owned by the
// container and only ever dereferenced under its lock (slow-path scans
// hold pointers across lock releases, but the coordinator guarantees
// those nodes are not freed until the scan retires). Moving the
// container between threads moves K and V with it.
unsafe impl<K: Send, V: Send> Send for SkipHash<K, V> {}

// SAFETY: all mutation goes through the exclusive lock and all shared
// access through the shared lock; the RNG is only touched under the
// exclusive lock. Concurrent use hands out clones of K and V, so both
// must be Send + Sync.
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for SkipHash<K, V> {}

/// Configuration for a [`SkipHash`].
///
/// ```rust
/// use skiphash::SkipHash;
///
/// let map: SkipHash<u64, &str> = SkipHash::<u64, &str>::builder()
///     .max_level(24)
///     .fast_path_tries(5)
///     .build();
/// map.insert(1, "one");
/// ```
pub struct Builder {
    max_level: usize,
    fast_path_tries: usize,
    rng: Option<Box<dyn RngCore + Send>>,
}

impl Builder {
    fn new() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            fast_path_tries: DEFAULT_FAST_PATH_TRIES,
            rng: None,
        }
    }

    /// Caps node height. Zero is invalid and keeps the default.
    pub fn max_level(mut self, level: usize) -> Self {
        if level > 0 {
            self.max_level = level;
        }
        self
    }

    /// Number of non-blocking shared-lock attempts a range scan makes
    /// before falling back to the slow path. Zero sends every scan
    /// straight to the slow path.
    pub fn fast_path_tries(mut self, tries: usize) -> Self {
        self.fast_path_tries = tries;
        self
    }

    /// Randomness source for level draws. Defaults to an entropy-seeded
    /// [`SmallRng`]; inject a seeded RNG for deterministic layouts.
    pub fn rand_source<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Builds the container.
    pub fn build<K, V>(self) -> SkipHash<K, V>
    where
        K: Ord + Hash + Clone,
        V: Clone,
    {
        let max_level = self.max_level;
        let head = Node::sentinel(max_level);
        let tail = Node::sentinel(max_level);
        // SAFETY: both sentinels were just allocated with towers of
        // `max_level` slots.
        unsafe {
            for level in 0..max_level {
                (*head).next[level] = tail;
                (*tail).prev[level] = head;
            }
        }

        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(SmallRng::from_entropy()));

        SkipHash {
            inner: RwLock::new(Inner {
                max_level,
                head,
                tail,
                index: HashMap::with_hasher(FixedState::default()),
                len: 0,
                rng,
                rqc: RangeCoordinator::new(),
            }),
            fast_path_tries: self.fast_path_tries,
        }
    }
}

impl<K, V> SkipHash<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// Creates an empty container with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a container.
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn inner(&self) -> &RwLock<Inner<K, V>> {
        &self.inner
    }

    pub(crate) fn fast_path_tries(&self) -> usize {
        self.fast_path_tries
    }

    /// Number of logically present keys.
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    /// True if no key is logically present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.read();
        let node = *inner.index.get(key)?;
        // SAFETY: index entries are live non-sentinel nodes; the shared
        // lock keeps them alive for the read.
        Some(unsafe { (*node).value().clone() })
    }

    /// True if `key` is logically present.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().index.contains_key(key)
    }

    /// Adds a new key/value pair. Fails if the key is already present,
    /// leaving the stored value untouched.
    pub fn insert(&self, key: K, value: V) -> bool {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&key) {
            return false;
        }
        let node = inner.insert_node(key.clone(), value);
        inner.index.insert(key, node);
        inner.len += 1;
        true
    }

    /// Inserts or replaces the value for `key`. Returns true if a new
    /// key was inserted.
    ///
    /// Replacement overwrites the existing node in place — no new
    /// version stamp, no reordering — so an in-flight scan never sees
    /// the key flicker out and back in.
    pub fn store(&self, key: K, value: V) -> bool {
        let mut inner = self.inner.write();
        if let Some(&node) = inner.index.get(&key) {
            // SAFETY: the exclusive lock gives sole access to the node;
            // index entries always hold an initialized value.
            unsafe {
                *(*node).value.assume_init_mut() = value;
            }
            return false;
        }
        let node = inner.insert_node(key.clone(), value);
        inner.index.insert(key, node);
        inner.len += 1;
        true
    }

    /// Logically removes `key`. Returns false if it was not present.
    ///
    /// The node is stamped with a removal version and handed to the
    /// coordinator, which either unlinks it immediately or parks it
    /// behind the in-flight range scans that may still need it.
    pub fn remove(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        let Some(node) = inner.index.remove(key) else {
            return false;
        };
        let stamp = inner.rqc.on_update();
        // SAFETY: exclusive lock; the node came out of the index so it
        // is live and stitched.
        unsafe {
            (*node).r_time = stamp;
            let i_time = (*node).i_time;
            if let Some(due) = inner.rqc.after_remove(node, i_time) {
                inner.unstitch(due);
            }
        }
        inner.len -= 1;
        true
    }

    /// Smallest live entry with `entry.key >= key`.
    pub fn ceil(&self, key: &K) -> Option<Entry<K, V>> {
        let inner = self.inner.read();
        if let Some(&node) = inner.index.get(key) {
            return Some(unsafe { inner.entry_at(node) });
        }
        unsafe {
            let node = inner.first_live_ge(key);
            if node == inner.tail {
                None
            } else {
                Some(inner.entry_at(node))
            }
        }
    }

    /// Smallest live entry with `entry.key > key`.
    pub fn succ(&self, key: &K) -> Option<Entry<K, V>> {
        let inner = self.inner.read();
        unsafe {
            let mut node = match inner.index.get(key) {
                Some(&cur) => (*cur).next[0],
                None => inner.lower_bound(key),
            };
            while node != inner.tail && ((*node).key() == key || !(*node).is_live()) {
                node = (*node).next[0];
            }
            if node == inner.tail {
                None
            } else {
                Some(inner.entry_at(node))
            }
        }
    }

    /// Largest live entry with `entry.key <= key`.
    pub fn floor(&self, key: &K) -> Option<Entry<K, V>> {
        let inner = self.inner.read();
        if let Some(&node) = inner.index.get(key) {
            return Some(unsafe { inner.entry_at(node) });
        }
        unsafe {
            let node = inner.predecessor(key, false);
            if node == inner.head {
                None
            } else {
                Some(inner.entry_at(node))
            }
        }
    }

    /// Largest live entry with `entry.key < key`.
    pub fn pred(&self, key: &K) -> Option<Entry<K, V>> {
        let inner = self.inner.read();
        unsafe {
            let node = inner.predecessor(key, true);
            if node == inner.head {
                None
            } else {
                Some(inner.entry_at(node))
            }
        }
    }
}

impl<K, V> Inner<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// # Safety
    /// `node` must be a stitched non-sentinel node.
    pub(crate) unsafe fn entry_at(&self, node: *mut Node<K, V>) -> Entry<K, V> {
        Entry {
            key: (*node).key().clone(),
            value: (*node).value().clone(),
        }
    }
}

impl<K, V> Default for SkipHash<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for SkipHash<K, V> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        // Walk the base level and free every node still stitched in,
        // sentinels included. Unstitched nodes were freed when the
        // coordinator released them; any pointers still sitting on
        // coordinator records alias this chain and must not be freed
        // twice, so only the chain walk deallocates.
        unsafe {
            let mut cur = inner.head;
            while !cur.is_null() {
                let next = (*cur).next[0];
                drop(Box::from_raw(cur));
                cur = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> SkipHash<i32, i32> {
        SkipHash::<i32, i32>::builder()
            .rand_source(SmallRng::seed_from_u64(seed))
            .build()
    }

    #[test]
    fn insert_get_remove() {
        let map = seeded(1);
        assert!(map.insert(10, 100));
        assert!(!map.insert(10, 200));
        assert_eq!(map.get(&10), Some(100));
        assert!(map.remove(&10));
        assert!(!map.remove(&10));
        assert_eq!(map.get(&10), None);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn store_overwrites_in_place() {
        let map = seeded(2);
        assert!(map.store(1, 10));
        assert!(!map.store(1, 20));
        assert_eq!(map.get(&1), Some(20));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn builder_normalizes_invalid_max_level() {
        let map: SkipHash<i32, i32> = SkipHash::<i32, i32>::builder().max_level(0).build();
        for k in 0..64 {
            map.insert(k, k);
        }
        assert_eq!(map.len(), 64);
        assert_eq!(map.range_count(&0, &63), 64);
    }

    #[test]
    fn drop_frees_tombstones() {
        let map: SkipHash<i32, String> = SkipHash::<i32, String>::builder()
            .rand_source(SmallRng::seed_from_u64(3))
            .build();
        for k in 0..100 {
            map.insert(k, format!("v{k}"));
        }
        for k in (0..100).step_by(2) {
            map.remove(&k);
        }
        drop(map);
    }

    #[test]
    fn drop_frees_tombstones_with_string_keys() {
        let map: SkipHash<String, String> = SkipHash::<String, String>::builder()
            .rand_source(SmallRng::seed_from_u64(4))
            .build();
        for k in 0..50 {
            map.insert(format!("k{k:03}"), format!("v{k}"));
        }
        for k in 0..25 {
            map.remove(&format!("k{k:03}"));
        }
        drop(map);
    }
}
