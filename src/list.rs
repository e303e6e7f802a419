//! Skip-list chain surgery: search, insert splicing, physical unlink.
//!
//! All of this runs with the container lock held; none of it is safe to
//! call otherwise. Searches ignore `r_time` unless stated — logical
//! liveness is a concern of the callers, ordering is the concern here.

use core::hash::Hash;

use rand::Rng;

use crate::map::Inner;
use crate::node::Node;

impl<K, V> Inner<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// First node at the base level with `key >= target`, possibly the
    /// tail sentinel. Tombstones count.
    pub(crate) unsafe fn lower_bound(&self, target: &K) -> *mut Node<K, V> {
        let mut cur = self.head;
        for level in (0..self.max_level).rev() {
            let mut next = (*cur).next[level];
            while next != self.tail && (*next).key() < target {
                cur = next;
                next = (*cur).next[level];
            }
        }
        (*cur).next[0]
    }

    /// First live node with `key >= target`, or the tail sentinel.
    pub(crate) unsafe fn first_live_ge(&self, target: &K) -> *mut Node<K, V> {
        let mut node = self.lower_bound(target);
        while node != self.tail && !(*node).is_live() {
            node = (*node).next[0];
        }
        node
    }

    /// Last live node with `key < target` (`strict`) or `key <= target`,
    /// or the head sentinel if no such node exists.
    pub(crate) unsafe fn predecessor(&self, target: &K, strict: bool) -> *mut Node<K, V> {
        let mut cur = self.head;
        for level in (0..self.max_level).rev() {
            let mut next = (*cur).next[level];
            while next != self.tail {
                let key = (*next).key();
                if strict {
                    if key >= target {
                        break;
                    }
                } else if key > target {
                    break;
                }
                cur = next;
                next = (*cur).next[level];
            }
        }
        while cur != self.head && !(*cur).is_live() {
            cur = (*cur).prev[0];
        }
        cur
    }

    /// Per-level splice points for a new node with key `target`.
    ///
    /// A reinsertion can race with the deferred physical removal of an
    /// earlier node carrying the same key. The search therefore also
    /// advances past equal-key tombstones, so the new live node lands
    /// strictly after them and base-level ordering stays intact.
    pub(crate) unsafe fn find_insert_neighbors(
        &self,
        target: &K,
    ) -> (Vec<*mut Node<K, V>>, Vec<*mut Node<K, V>>) {
        let mut preds = vec![core::ptr::null_mut(); self.max_level];
        let mut succs = vec![core::ptr::null_mut(); self.max_level];

        let mut cur = self.head;
        for level in (0..self.max_level).rev() {
            let mut next = (*cur).next[level];
            while next != self.tail {
                let key = (*next).key();
                if key < target || (key == target && !(*next).is_live()) {
                    cur = next;
                    next = (*cur).next[level];
                    continue;
                }
                break;
            }
            preds[level] = cur;
            succs[level] = next;
        }

        (preds, succs)
    }

    /// Allocates and splices a new live node, stamping it with a fresh
    /// version. The key must not currently be in the index.
    pub(crate) fn insert_node(&mut self, key: K, value: V) -> *mut Node<K, V> {
        let height = self.random_height();
        let i_time = self.rqc.on_update();
        unsafe {
            let (preds, succs) = self.find_insert_neighbors(&key);
            let node = Node::alloc(key, value, height, i_time);
            for level in 0..height {
                let pred = preds[level];
                let succ = succs[level];
                (*node).prev[level] = pred;
                (*node).next[level] = succ;
                (*pred).next[level] = node;
                (*succ).prev[level] = node;
            }
            node
        }
    }

    /// Geometric height draw: start at 1, keep flipping a fair coin,
    /// cap at `max_level`.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < self.max_level && self.rng.gen_bool(0.5) {
            height += 1;
        }
        height
    }

    /// Unlinks a node from every level and releases it.
    ///
    /// Callers route every unlink through the coordinator, which hands a
    /// node out exactly once and only when no in-flight scan can still
    /// reach it; at that point freeing the box is sound.
    pub(crate) unsafe fn unstitch(&mut self, node: *mut Node<K, V>) {
        if node.is_null() || node == self.head || node == self.tail || (*node).unstitched {
            return;
        }
        for level in 0..(*node).height {
            let pred = (*node).prev[level];
            let succ = (*node).next[level];
            if !pred.is_null() {
                (*pred).next[level] = succ;
            }
            if !succ.is_null() {
                (*succ).prev[level] = pred;
            }
        }
        (*node).unstitched = true;
        drop(Box::from_raw(node));
    }
}
