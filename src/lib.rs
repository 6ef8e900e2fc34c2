//! # perennial
//!
//! Persistent (immutable) collections for concurrent read-heavy workloads.
//!
//! ## Overview
//!
//! Every collection in this crate is a value: mutating operations return a
//! new logical collection that shares most of its interior structure with
//! the original, and no in-place mutation is ever observable. Because no
//! interior node changes after it is published, any number of threads may
//! read the same collection concurrently without locks (enable the `arc`
//! feature for `Send + Sync` collections).
//!
//! Three collection types are provided:
//!
//! - [`List`]: an indexed sequence backed by a radix-32 trie, with O(log32 N)
//!   get/update/append/prepend and reference-dropping slices.
//! - [`Map`]: an unordered key/value map backed by a Hash Array Mapped Trie
//!   (HAMT), with O(log32 N) get/insert/remove and deterministic iteration.
//! - [`SortedMap`]: a key-ordered map backed by a B+-tree with fan-out 32,
//!   with ordered iteration and seek.
//!
//! Hashing and ordering are pluggable: [`Map`] consults a [`Hasher`] and
//! [`SortedMap`] a [`Comparer`]. Built-in defaults cover integer, text, and
//! byte-sequence keys; other key types supply their own collaborator at
//! construction time.
//!
//! ## Example
//!
//! ```rust
//! use perennial::{List, Map, SortedMap};
//!
//! let list = List::new().push_back(1).push_back(2).push_back(3);
//! let longer = list.push_back(4);
//! assert_eq!(list.len(), 3); // original unchanged
//! assert_eq!(longer.get(3), Some(&4));
//!
//! let map = Map::new().insert("one".to_string(), 1);
//! assert_eq!(map.get(&"one".to_string()), Some(&1));
//!
//! let sorted: SortedMap<i64, &str> = SortedMap::new()
//!     .insert(2, "two")
//!     .insert(1, "one");
//! let keys: Vec<i64> = sorted.iter().map(|(key, _)| *key).collect();
//! assert_eq!(keys, vec![1, 2]);
//! ```
//!
//! ## Feature Flags
//!
//! - `arc`: share interior nodes through `Arc` instead of `Rc`, making every
//!   collection `Send + Sync` at a small reference-counting cost.
//! - `serde`: `Serialize`/`Deserialize` implementations for the three
//!   collection types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type for interior tree nodes.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, which is
/// thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod comparer;
mod error;
mod hasher;
mod list;
mod map;
mod sorted_map;

pub use comparer::Comparer;
pub use comparer::DefaultComparer;
pub use error::Error;
pub use hasher::DefaultHasher;
pub use hasher::HashKey;
pub use hasher::Hasher;
pub use list::List;
pub use list::ListIterator;
pub use map::Map;
pub use map::MapIterator;
pub use sorted_map::SortedMap;
pub use sorted_map::SortedMapIterator;

// =============================================================================
// Tests
// =============================================================================
