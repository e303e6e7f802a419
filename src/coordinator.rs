//! Range-operation coordinator.
//!
//! The coordinator owns the version counter and an ordered registry of
//! in-flight range scans. Every mutation and every scan start advances
//! the counter; the counter is the sole time source. When a key is
//! removed while scans are in flight, its node cannot be unlinked yet —
//! the oldest scan may still need to walk through it — so the node is
//! parked on the newest scan's deferred list and migrates backward as
//! scans retire. Only when the oldest in-flight scan retires do its
//! deferred nodes become due for physical unlinking.

use std::collections::HashMap;

use foldhash::fast::FixedState;

use crate::node::Node;

/// Record for one in-flight range scan.
struct RangeOp<K, V> {
    /// Nodes whose physical unlink is parked behind this scan.
    deferred: Vec<*mut Node<K, V>>,

    /// Version links forming the ordered registry (insertion order ==
    /// version order).
    prev: Option<u64>,
    next: Option<u64>,
}

pub(crate) struct RangeCoordinator<K, V> {
    counter: u64,

    /// Oldest and newest in-flight scan versions.
    head: Option<u64>,
    tail: Option<u64>,

    ops: HashMap<u64, RangeOp<K, V>, FixedState>,
}

impl<K, V> RangeCoordinator<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            counter: 1,
            head: None,
            tail: None,
            ops: HashMap::with_hasher(FixedState::default()),
        }
    }

    /// Stamps a mutation: advances the counter and returns the new value.
    pub(crate) fn on_update(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Registers a new range scan at the tail of the registry and
    /// returns its version.
    pub(crate) fn on_range(&mut self) -> u64 {
        self.counter += 1;
        let ver = self.counter;
        let op = RangeOp {
            deferred: Vec::new(),
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail_ver) => {
                self.ops
                    .get_mut(&tail_ver)
                    .expect("tail range-op registered")
                    .next = Some(ver);
            }
            None => self.head = Some(ver),
        }
        self.tail = Some(ver);
        self.ops.insert(ver, op);
        ver
    }

    /// Decides the fate of a freshly tombstoned node. Returns the node
    /// if it is due for immediate unlinking; otherwise parks it on the
    /// newest in-flight scan.
    ///
    /// A node inserted at or after the newest scan's version was never
    /// visible to any in-flight scan, so it can go at once.
    pub(crate) fn after_remove(
        &mut self,
        node: *mut Node<K, V>,
        i_time: u64,
    ) -> Option<*mut Node<K, V>> {
        match self.tail {
            None => Some(node),
            Some(tail_ver) if i_time >= tail_ver => Some(node),
            Some(tail_ver) => {
                self.ops
                    .get_mut(&tail_ver)
                    .expect("tail range-op registered")
                    .deferred
                    .push(node);
                None
            }
        }
    }

    /// Retires the scan registered at `ver` and returns the nodes whose
    /// unlink is now due.
    ///
    /// If the retiring scan was the oldest, no remaining scan can need
    /// its deferred nodes. Otherwise the deferred list is handed to the
    /// next-older in-flight scan, which now owns the obligation.
    pub(crate) fn after_range(&mut self, ver: u64) -> Vec<*mut Node<K, V>> {
        let Some(op) = self.ops.remove(&ver) else {
            return Vec::new();
        };

        match op.prev {
            Some(prev_ver) => {
                self.ops
                    .get_mut(&prev_ver)
                    .expect("predecessor range-op registered")
                    .next = op.next;
            }
            None => self.head = op.next,
        }
        match op.next {
            Some(next_ver) => {
                self.ops
                    .get_mut(&next_ver)
                    .expect("successor range-op registered")
                    .prev = op.prev;
            }
            None => self.tail = op.prev,
        }

        match op.prev {
            None => op.deferred,
            Some(prev_ver) => {
                self.ops
                    .get_mut(&prev_ver)
                    .expect("predecessor range-op registered")
                    .deferred
                    .extend(op.deferred);
                Vec::new()
            }
        }
    }
}
