//! Skip-hash: a concurrent ordered map that pairs a hash index with a
//! skip list, so point operations stay O(1) while the chain serves
//! ordered queries and range scans.
//!
//! Removal is logical first: a removed node is stamped with a version
//! and stays stitched into the chain while any in-flight range scan
//! might still need it. A coordinator tracks live scans and batches the
//! deferred physical unlinks behind the oldest one, which lets scans
//! walk the chain concurrently with point updates without ever seeing
//! a torn view.
//!
//! # Key Features
//!
//! - **O(1) point ops**: get/contains/insert/store/remove go through
//!   the hash index, not the chain.
//! - **Ordered queries**: ceil, floor, successor, predecessor, bounded
//!   range scans and range counting over the skip-list chain.
//! - **Scan-consistent ranges**: slow-path scans observe exactly the
//!   keys live at their starting version, even under concurrent
//!   updates.
//! - **Fast-path reads**: uncontended scans take a non-blocking shared
//!   lock and skip the version machinery entirely.
//!
//! # Example
//!
//! ```rust
//! use skiphash::SkipHash;
//!
//! let map = SkipHash::new();
//! map.insert(3, "c");
//! map.insert(1, "a");
//! map.insert(2, "b");
//! map.remove(&2);
//!
//! assert_eq!(map.get(&1), Some("a"));
//! let keys: Vec<_> = map.range(&1, &3).into_iter().map(|e| e.key).collect();
//! assert_eq!(keys, vec![1, 3]);
//! ```

#![warn(missing_docs)]

mod coordinator;
mod list;
mod map;
mod node;
mod range;

pub use map::{Builder, Entry, SkipHash};

/// Default cap on node height.
pub const DEFAULT_MAX_LEVEL: usize = 20;

/// Default number of non-blocking shared-lock attempts before a range
/// scan falls back to the version-gated slow path.
pub const DEFAULT_FAST_PATH_TRIES: usize = 3;
