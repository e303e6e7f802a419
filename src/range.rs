//! Range scans: the lock-held fast path and the version-gated slow
//! path, plus range counting and the full-chain walk.

use core::hash::Hash;
use std::thread;

use crate::map::{Entry, Inner, SkipHash};
use crate::node::Node;

impl<K, V> SkipHash<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// Live entries with keys in `[low, high]`, in ascending key order.
    /// An inverted range is empty.
    ///
    /// Tries the fast path first: a bounded number of non-blocking
    /// shared-lock attempts, each walking the chain with the lock held.
    /// Under sustained writer contention it escalates to the slow path,
    /// which registers with the coordinator and observes exactly the
    /// keys live at its starting version. The fast path is linearizable
    /// at the instant the lock is held but takes no version snapshot —
    /// a key removed immediately after the scan returns may still
    /// appear in the result.
    pub fn range(&self, low: &K, high: &K) -> Vec<Entry<K, V>> {
        if low > high {
            return Vec::new();
        }
        match self.range_fast(low, high) {
            Some(entries) => entries,
            None => self.range_slow(low, high),
        }
    }

    fn range_fast(&self, low: &K, high: &K) -> Option<Vec<Entry<K, V>>> {
        for _ in 0..self.fast_path_tries() {
            let Some(inner) = self.inner().try_read() else {
                thread::yield_now();
                continue;
            };
            let mut entries = Vec::with_capacity(16);
            // SAFETY: shared lock held for the whole walk.
            unsafe {
                let mut node = inner.lower_bound(low);
                while node != inner.tail && (*node).key() <= high {
                    if (*node).is_live() {
                        entries.push(inner.entry_at(node));
                    }
                    node = (*node).next[0];
                }
            }
            return Some(entries);
        }
        None
    }

    fn range_slow(&self, low: &K, high: &K) -> Vec<Entry<K, V>> {
        let (start, ver) = {
            let mut inner = self.inner().write();
            // SAFETY: exclusive lock held.
            let start = unsafe { inner.first_live_ge(low) };
            (start, inner.rqc.on_range())
        };

        // Walk one hop per shared-lock acquisition. Between hops the
        // lock is released; the coordinator keeps every node this scan
        // can still reach from being unlinked until the scan retires.
        let mut entries = Vec::with_capacity(16);
        let mut node = start;
        loop {
            let captured;
            let next;
            {
                let inner = self.inner().read();
                // SAFETY: shared lock held; `node` is either a sentinel
                // or a node the coordinator is holding in the chain for
                // this scan's version.
                unsafe {
                    if node == inner.tail || (*node).key() > high {
                        break;
                    }
                    let include = node != inner.head
                        && (*node).i_time < ver
                        && ((*node).is_live() || (*node).r_time >= ver);
                    captured = if include {
                        Some(inner.entry_at(node))
                    } else {
                        None
                    };
                    next = inner.next_safe(node, ver);
                }
            }
            if let Some(entry) = captured {
                entries.push(entry);
            }
            node = next;
        }

        let mut inner = self.inner().write();
        let due = inner.rqc.after_range(ver);
        for node in due {
            // SAFETY: exclusive lock held; the coordinator hands each
            // node out exactly once.
            unsafe {
                inner.unstitch(node);
            }
        }
        entries
    }

    /// Number of live keys in `[low, high]`. An inverted range counts
    /// zero. Always a single shared-lock walk; no coordinator traffic.
    pub fn range_count(&self, low: &K, high: &K) -> usize {
        if low > high {
            return 0;
        }
        let inner = self.inner().read();
        let mut count = 0;
        // SAFETY: shared lock held for the whole walk.
        unsafe {
            let mut node = inner.lower_bound(low);
            while node != inner.tail && (*node).key() <= high {
                if (*node).is_live() {
                    count += 1;
                }
                node = (*node).next[0];
            }
        }
        count
    }

    /// All live entries in ascending key order.
    ///
    /// Holds the shared lock for the duration of the walk, so the
    /// result is a consistent point-in-time view.
    pub fn range_all(&self) -> Vec<Entry<K, V>> {
        let inner = self.inner().read();
        let mut entries = Vec::with_capacity(inner.len);
        // SAFETY: shared lock held for the whole walk.
        unsafe {
            let mut node = (*inner.head).next[0];
            while node != inner.tail {
                if (*node).is_live() {
                    entries.push(inner.entry_at(node));
                }
                node = (*node).next[0];
            }
        }
        entries
    }
}

impl<K, V> Inner<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// Next base-level node a scan at version `ver` may stand on: the
    /// first successor that is a sentinel or visible at `ver`. Nodes
    /// both inserted and removed after `ver` are invisible to the scan
    /// and are skipped.
    pub(crate) unsafe fn next_safe(&self, node: *mut Node<K, V>, ver: u64) -> *mut Node<K, V> {
        let mut next = (*node).next[0];
        while next != self.tail && !self.is_safe(next, ver) {
            next = (*next).next[0];
        }
        next
    }

    unsafe fn is_safe(&self, node: *mut Node<K, V>, ver: u64) -> bool {
        if node == self.head || node == self.tail {
            return true;
        }
        if (*node).i_time >= ver {
            return false;
        }
        (*node).is_live() || (*node).r_time >= ver
    }
}
