//! Persistent (immutable) hash map based on a Hash Array Mapped Trie.
//!
//! This module provides [`Map`], an immutable hash map that uses structural
//! sharing for efficient operations.
//!
//! # Overview
//!
//! `Map` is a Hash Array Mapped Trie (HAMT) keyed on the 32-bit hash of each
//! key. Each tree level consumes 5 hash bits, so the depth is bounded by 7
//! levels regardless of size:
//!
//! - O(log32 N) `get` (effectively O(1) for practical sizes)
//! - O(log32 N) `insert`
//! - O(log32 N) `remove`
//! - O(1) `len` and `is_empty`
//!
//! All operations return new maps without modifying the original, and
//! structural sharing ensures memory efficiency.
//!
//! # Internal Structure
//!
//! Interior nodes adapt to occupancy:
//!
//! - A small unordered *array leaf* serves as the root while hashing does
//!   not yet pay off (up to 8 entries).
//! - Sparse branches are *bitmap-indexed*: a 32-bit occupancy bitmap plus a
//!   packed child array.
//! - Dense branches (more than 16 occupied slots) become *hash-array*
//!   branches with a fixed 32-slot child array.
//! - A single pair is a *value leaf*; pairs whose keys share a full 32-bit
//!   hash live in a *collision leaf*.
//!
//! # Examples
//!
//! ```rust
//! use perennial::Map;
//!
//! let map = Map::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//!
//! assert_eq!(map.get(&"one".to_string()), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get(&"one".to_string()), Some(&1));
//! assert_eq!(updated.get(&"one".to_string()), Some(&100));
//! ```

use std::fmt;

use smallvec::SmallVec;

use crate::ReferenceCounter;
use crate::hasher::{DefaultHasher, HashKey, Hasher};

// =============================================================================
// Constants
// =============================================================================

/// Branching factor (2^5 = 32)
const BRANCHING_FACTOR: usize = 32;

/// Hash bits consumed per level
const BITS_PER_LEVEL: u32 = 5;

/// Bit mask for extracting a 5-bit hash fragment
const MASK: u32 = (BRANCHING_FACTOR - 1) as u32;

/// Maximum entries in the root array leaf before promotion.
const MAX_ARRAY_SIZE: usize = 8;

/// Maximum packed children in a bitmap branch before conversion.
const MAX_BITMAP_SIZE: usize = 16;

/// Inline capacity of the iterator descent stack.
const MAX_DEPTH: usize = 32;

/// Extracts the 5-bit fragment of a hash at the given shift.
#[inline]
const fn fragment(hash: u32, shift: u32) -> usize {
    ((hash >> shift) & MASK) as usize
}

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the HAMT.
#[derive(Clone)]
enum MapNode<K, V> {
    /// Small unordered bucket in insertion order; used only at the root.
    Array { entries: Vec<(K, V)> },
    /// Sparse branch: occupancy bitmap plus packed child array.
    Bitmap {
        bitmap: u32,
        children: Vec<ReferenceCounter<MapNode<K, V>>>,
    },
    /// Dense branch: fixed 32-slot child array plus occupancy count.
    HashArray {
        count: usize,
        children: [Option<ReferenceCounter<MapNode<K, V>>>; BRANCHING_FACTOR],
    },
    /// Leaf holding a single pair and its key hash.
    Value { hash: u32, key: K, value: V },
    /// Leaf holding two or more pairs sharing one key hash.
    Collision { hash: u32, entries: Vec<(K, V)> },
}

/// Outcome of a recursive delete.
enum Removal<K, V> {
    /// The key was absent; the node is unchanged.
    Unchanged,
    /// The node's last reachable entry was removed.
    Removed,
    /// The node was rewritten along the edit path.
    Replaced(MapNode<K, V>),
}

// =============================================================================
// Map Definition
// =============================================================================

/// A persistent (immutable) hash map based on a HAMT.
///
/// `Map` is an immutable data structure that uses structural sharing to
/// efficiently support functional programming patterns. Hashing and key
/// equality go through the [`Hasher`] collaborator `H`; the default covers
/// integer, text, and byte-sequence keys.
///
/// Iteration order is deterministic for a fixed tree shape but unrelated to
/// key order.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `get`          | O(log32 N) |
/// | `insert`       | O(log32 N) |
/// | `remove`       | O(log32 N) |
/// | `len`          | O(1)       |
/// | `is_empty`     | O(1)       |
///
/// # Examples
///
/// ```rust
/// use perennial::Map;
///
/// let map = Map::new().insert(1i64, "one");
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.get(&2), None);
/// ```
#[derive(Clone)]
pub struct Map<K, V, H = DefaultHasher> {
    /// Number of key/value pairs
    size: usize,
    /// Root node of the trie
    root: Option<ReferenceCounter<MapNode<K, V>>>,
    /// Hasher pinned for this map's lineage
    hasher: H,
}

impl<K, V> Map<K, V> {
    /// Creates a new empty map using the default hasher.
    ///
    /// Inserting requires the default collaborator to apply to `K` (that
    /// is, `K: HashKey + Eq`); for any other key type use
    /// [`Map::with_hasher`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::Map;
    ///
    /// let map: Map<String, i32> = Map::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHasher)
    }

    /// Creates a map containing a single key/value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self
    where
        K: HashKey + Eq + Clone,
        V: Clone,
    {
        Self::new().insert(key, value)
    }
}

impl<K, V, H> Map<K, V, H> {
    /// Creates a new empty map using the given hasher.
    ///
    /// The hasher is pinned: every map derived from this one by edits keeps
    /// using it.
    #[inline]
    #[must_use]
    pub fn with_hasher(hasher: H) -> Self {
        Map {
            size: 0,
            root: None,
            hasher,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns an iterator over key/value pairs.
    ///
    /// The order is deterministic for a fixed tree shape, but is not key
    /// order.
    #[must_use]
    pub fn iter(&self) -> MapIterator<'_, K, V> {
        MapIterator::new(self)
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K, V, H: Hasher<K>> Map<K, V, H> {
    /// Returns a reference to the value for the given key.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::Map;
    ///
    /// let map = Map::new().insert("key".to_string(), 42);
    /// assert_eq!(map.get(&"key".to_string()), Some(&42));
    /// assert_eq!(map.get(&"other".to_string()), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let root = self.root.as_ref()?;
        let hash = self.hasher.hash(key);
        Self::get_from_node(root, key, 0, hash, &self.hasher)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Recursive helper for get.
    fn get_from_node<'n>(
        node: &'n MapNode<K, V>,
        key: &K,
        shift: u32,
        hash: u32,
        hasher: &H,
    ) -> Option<&'n V> {
        match node {
            MapNode::Array { entries } => entries
                .iter()
                .find(|(entry_key, _)| hasher.equal(entry_key, key))
                .map(|(_, value)| value),
            MapNode::Value {
                key: node_key,
                value,
                ..
            } => {
                if hasher.equal(node_key, key) {
                    Some(value)
                } else {
                    None
                }
            }
            MapNode::Collision { entries, .. } => entries
                .iter()
                .find(|(entry_key, _)| hasher.equal(entry_key, key))
                .map(|(_, value)| value),
            MapNode::Bitmap { bitmap, children } => {
                let bit = 1u32 << fragment(hash, shift);
                if bitmap & bit == 0 {
                    return None;
                }
                let index = (bitmap & (bit - 1)).count_ones() as usize;
                Self::get_from_node(&children[index], key, shift + BITS_PER_LEVEL, hash, hasher)
            }
            MapNode::HashArray { children, .. } => {
                let child = children[fragment(hash, shift)].as_ref()?;
                Self::get_from_node(child, key, shift + BITS_PER_LEVEL, hash, hasher)
            }
        }
    }
}

impl<K: Clone, V: Clone, H: Hasher<K> + Clone> Map<K, V, H> {
    /// Returns a new map with the key set to the given value.
    ///
    /// A new map is returned even when the value equals the stored one —
    /// value equality is not tracked.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::Map;
    ///
    /// let map = Map::new().insert(1i64, "one");
    /// let updated = map.insert(1i64, "ONE");
    ///
    /// assert_eq!(map.get(&1), Some(&"one")); // Original unchanged
    /// assert_eq!(updated.get(&1), Some(&"ONE"));
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = self.hasher.hash(&key);
        match &self.root {
            // An empty map starts with a simple array leaf.
            None => Map {
                size: 1,
                root: Some(ReferenceCounter::new(MapNode::Array {
                    entries: vec![(key, value)],
                })),
                hasher: self.hasher.clone(),
            },
            Some(root) => {
                let (new_root, resized) =
                    Self::set_in_node(root, key, value, 0, hash, &self.hasher);
                Map {
                    size: if resized { self.size + 1 } else { self.size },
                    root: Some(ReferenceCounter::new(new_root)),
                    hasher: self.hasher.clone(),
                }
            }
        }
    }

    /// Returns a new map with the given key removed.
    ///
    /// Removing an absent key returns a map sharing the same root as the
    /// original.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::Map;
    ///
    /// let map = Map::new().insert(1i64, "one").insert(2i64, "two");
    /// let removed = map.remove(&1);
    ///
    /// assert_eq!(map.len(), 2); // Original unchanged
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let hash = self.hasher.hash(key);
        match Self::delete_from_node(root, key, 0, hash, &self.hasher) {
            Removal::Unchanged => self.clone(),
            Removal::Removed => Map {
                size: self.size - 1,
                root: None,
                hasher: self.hasher.clone(),
            },
            Removal::Replaced(new_root) => Map {
                size: self.size - 1,
                root: Some(ReferenceCounter::new(new_root)),
                hasher: self.hasher.clone(),
            },
        }
    }

    /// Recursive helper for insert.
    /// Returns the rewritten node and whether a new entry was added.
    fn set_in_node(
        node: &MapNode<K, V>,
        key: K,
        value: V,
        shift: u32,
        hash: u32,
        hasher: &H,
    ) -> (MapNode<K, V>, bool) {
        match node {
            MapNode::Array { entries } => {
                Self::set_in_array_node(entries, key, value, hash, hasher)
            }
            MapNode::Value {
                hash: node_hash,
                key: node_key,
                value: node_value,
            } => {
                if hasher.equal(node_key, &key) {
                    let replaced = MapNode::Value {
                        hash: *node_hash,
                        key,
                        value,
                    };
                    (replaced, false)
                } else if *node_hash == hash {
                    // Equal hashes but distinct keys collide.
                    let collision = MapNode::Collision {
                        hash,
                        entries: vec![(node_key.clone(), node_value.clone()), (key, value)],
                    };
                    (collision, true)
                } else {
                    let merged = Self::merge_into_node(node, *node_hash, shift, hash, key, value);
                    (merged, true)
                }
            }
            MapNode::Collision {
                hash: node_hash,
                entries,
            } => {
                if *node_hash != hash {
                    let merged = Self::merge_into_node(node, *node_hash, shift, hash, key, value);
                    return (merged, true);
                }
                let mut new_entries = entries.clone();
                match entries
                    .iter()
                    .position(|(entry_key, _)| hasher.equal(entry_key, &key))
                {
                    Some(index) => {
                        new_entries[index] = (key, value);
                        let collision = MapNode::Collision {
                            hash: *node_hash,
                            entries: new_entries,
                        };
                        (collision, false)
                    }
                    None => {
                        new_entries.push((key, value));
                        let collision = MapNode::Collision {
                            hash: *node_hash,
                            entries: new_entries,
                        };
                        (collision, true)
                    }
                }
            }
            MapNode::Bitmap { bitmap, children } => {
                Self::set_in_bitmap_node(*bitmap, children, key, value, shift, hash, hasher)
            }
            MapNode::HashArray { count, children } => {
                let slot = fragment(hash, shift);
                let (new_child, resized, added) = match &children[slot] {
                    Some(child) => {
                        let (new_child, resized) = Self::set_in_node(
                            child,
                            key,
                            value,
                            shift + BITS_PER_LEVEL,
                            hash,
                            hasher,
                        );
                        (new_child, resized, false)
                    }
                    None => (MapNode::Value { hash, key, value }, true, true),
                };
                let mut new_children = children.clone();
                new_children[slot] = Some(ReferenceCounter::new(new_child));
                let branch = MapNode::HashArray {
                    count: count + usize::from(added),
                    children: new_children,
                };
                (branch, resized)
            }
        }
    }

    /// Inserts into the root array leaf, promoting to hash-driven nodes once
    /// the bucket outgrows its threshold.
    fn set_in_array_node(
        entries: &[(K, V)],
        key: K,
        value: V,
        hash: u32,
        hasher: &H,
    ) -> (MapNode<K, V>, bool) {
        let position = entries
            .iter()
            .position(|(entry_key, _)| hasher.equal(entry_key, &key));

        match position {
            Some(index) => {
                let mut new_entries = entries.to_vec();
                new_entries[index] = (key, value);
                (
                    MapNode::Array {
                        entries: new_entries,
                    },
                    false,
                )
            }
            None if entries.len() >= MAX_ARRAY_SIZE => {
                // Promote: seed a value leaf from the new entry and re-insert
                // every existing entry along the hash-driven path.
                let mut node = MapNode::Value { hash, key, value };
                for (entry_key, entry_value) in entries {
                    let entry_hash = hasher.hash(entry_key);
                    let (next, _) = Self::set_in_node(
                        &node,
                        entry_key.clone(),
                        entry_value.clone(),
                        0,
                        entry_hash,
                        hasher,
                    );
                    node = next;
                }
                (node, true)
            }
            None => {
                let mut new_entries = entries.to_vec();
                new_entries.push((key, value));
                (
                    MapNode::Array {
                        entries: new_entries,
                    },
                    true,
                )
            }
        }
    }

    /// Inserts into a bitmap branch, converting to a hash-array branch once
    /// a new bit would push the packed array past its threshold.
    fn set_in_bitmap_node(
        bitmap: u32,
        children: &[ReferenceCounter<MapNode<K, V>>],
        key: K,
        value: V,
        shift: u32,
        hash: u32,
        hasher: &H,
    ) -> (MapNode<K, V>, bool) {
        let frag = fragment(hash, shift);
        let bit = 1u32 << frag;
        let exists = bitmap & bit != 0;
        let index = (bitmap & (bit - 1)).count_ones() as usize;

        let (new_child, resized) = if exists {
            Self::set_in_node(&children[index], key, value, shift + BITS_PER_LEVEL, hash, hasher)
        } else {
            (MapNode::Value { hash, key, value }, true)
        };

        if !exists && children.len() > MAX_BITMAP_SIZE {
            // Spread the packed children out to their bit positions.
            let mut slots: [Option<ReferenceCounter<MapNode<K, V>>>; BRANCHING_FACTOR] =
                std::array::from_fn(|_| None);
            let mut count = 0usize;
            for position in 0..BRANCHING_FACTOR {
                if bitmap & (1u32 << position) != 0 {
                    slots[position] = Some(children[count].clone());
                    count += 1;
                }
            }
            slots[frag] = Some(ReferenceCounter::new(new_child));
            count += 1;
            return (
                MapNode::HashArray {
                    count,
                    children: slots,
                },
                resized,
            );
        }

        let new_children = if exists {
            let mut new_children = children.to_vec();
            new_children[index] = ReferenceCounter::new(new_child);
            new_children
        } else {
            let mut new_children = Vec::with_capacity(children.len() + 1);
            new_children.extend_from_slice(&children[..index]);
            new_children.push(ReferenceCounter::new(new_child));
            new_children.extend_from_slice(&children[index..]);
            new_children
        };
        (
            MapNode::Bitmap {
                bitmap: bitmap | bit,
                children: new_children,
            },
            resized,
        )
    }

    /// Builds the branch structure joining an existing leaf and a new pair
    /// whose hashes differ at or below the given shift.
    fn merge_into_node(
        node: &MapNode<K, V>,
        node_hash: u32,
        shift: u32,
        hash: u32,
        key: K,
        value: V,
    ) -> MapNode<K, V> {
        let node_frag = fragment(node_hash, shift);
        let new_frag = fragment(hash, shift);
        let bitmap = (1u32 << node_frag) | (1u32 << new_frag);

        if node_frag == new_frag {
            let child =
                Self::merge_into_node(node, node_hash, shift + BITS_PER_LEVEL, hash, key, value);
            return MapNode::Bitmap {
                bitmap,
                children: vec![ReferenceCounter::new(child)],
            };
        }

        let leaf = MapNode::Value { hash, key, value };
        let children = if node_frag < new_frag {
            vec![
                ReferenceCounter::new(node.clone()),
                ReferenceCounter::new(leaf),
            ]
        } else {
            vec![
                ReferenceCounter::new(leaf),
                ReferenceCounter::new(node.clone()),
            ]
        };
        MapNode::Bitmap { bitmap, children }
    }

    /// Recursive helper for remove.
    fn delete_from_node(
        node: &MapNode<K, V>,
        key: &K,
        shift: u32,
        hash: u32,
        hasher: &H,
    ) -> Removal<K, V> {
        match node {
            MapNode::Array { entries } => {
                let Some(index) = entries
                    .iter()
                    .position(|(entry_key, _)| hasher.equal(entry_key, key))
                else {
                    return Removal::Unchanged;
                };
                if entries.len() == 1 {
                    return Removal::Removed;
                }
                let mut new_entries = entries.clone();
                new_entries.remove(index);
                Removal::Replaced(MapNode::Array {
                    entries: new_entries,
                })
            }
            MapNode::Value { key: node_key, .. } => {
                if hasher.equal(node_key, key) {
                    Removal::Removed
                } else {
                    Removal::Unchanged
                }
            }
            MapNode::Collision {
                hash: node_hash,
                entries,
            } => {
                if *node_hash != hash {
                    return Removal::Unchanged;
                }
                let Some(index) = entries
                    .iter()
                    .position(|(entry_key, _)| hasher.equal(entry_key, key))
                else {
                    return Removal::Unchanged;
                };
                if entries.len() == 2 {
                    // Collapse back to a value leaf holding the other entry.
                    let (remaining_key, remaining_value) = entries[index ^ 1].clone();
                    return Removal::Replaced(MapNode::Value {
                        hash: *node_hash,
                        key: remaining_key,
                        value: remaining_value,
                    });
                }
                let mut new_entries = entries.clone();
                new_entries.remove(index);
                Removal::Replaced(MapNode::Collision {
                    hash: *node_hash,
                    entries: new_entries,
                })
            }
            MapNode::Bitmap { bitmap, children } => {
                let bit = 1u32 << fragment(hash, shift);
                if bitmap & bit == 0 {
                    return Removal::Unchanged;
                }
                let index = (bitmap & (bit - 1)).count_ones() as usize;
                match Self::delete_from_node(
                    &children[index],
                    key,
                    shift + BITS_PER_LEVEL,
                    hash,
                    hasher,
                ) {
                    Removal::Unchanged => Removal::Unchanged,
                    Removal::Removed => {
                        if children.len() == 1 {
                            return Removal::Removed;
                        }
                        let mut new_children = children.clone();
                        new_children.remove(index);
                        // Bitmap branches never re-collapse into array leaves.
                        Removal::Replaced(MapNode::Bitmap {
                            bitmap: bitmap ^ bit,
                            children: new_children,
                        })
                    }
                    Removal::Replaced(new_child) => {
                        let mut new_children = children.clone();
                        new_children[index] = ReferenceCounter::new(new_child);
                        Removal::Replaced(MapNode::Bitmap {
                            bitmap: *bitmap,
                            children: new_children,
                        })
                    }
                }
            }
            MapNode::HashArray { count, children } => {
                let slot = fragment(hash, shift);
                let Some(child) = &children[slot] else {
                    return Removal::Unchanged;
                };
                match Self::delete_from_node(child, key, shift + BITS_PER_LEVEL, hash, hasher) {
                    Removal::Unchanged => Removal::Unchanged,
                    Removal::Removed => {
                        if *count <= MAX_BITMAP_SIZE {
                            // Downgrade to a bitmap branch, omitting the
                            // removed slot; exactly count - 1 bits end up set.
                            let mut bitmap = 0u32;
                            let mut packed = Vec::with_capacity(count - 1);
                            for (position, candidate) in children.iter().enumerate() {
                                if position == slot {
                                    continue;
                                }
                                if let Some(candidate) = candidate {
                                    bitmap |= 1u32 << position;
                                    packed.push(candidate.clone());
                                }
                            }
                            return Removal::Replaced(MapNode::Bitmap {
                                bitmap,
                                children: packed,
                            });
                        }
                        let mut new_children = children.clone();
                        new_children[slot] = None;
                        Removal::Replaced(MapNode::HashArray {
                            count: count - 1,
                            children: new_children,
                        })
                    }
                    Removal::Replaced(new_child) => {
                        let mut new_children = children.clone();
                        new_children[slot] = Some(ReferenceCounter::new(new_child));
                        Removal::Replaced(MapNode::HashArray {
                            count: *count,
                            children: new_children,
                        })
                    }
                }
            }
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A node/index pair in the iterator descent stack.
struct MapIteratorFrame<'a, K, V> {
    node: &'a MapNode<K, V>,
    index: usize,
}

/// An iterator over the key/value pairs of a [`Map`].
///
/// Although keys are not sorted, the order is deterministic for a fixed tree
/// shape: nodes are visited in child-array order, entries in entry order.
pub struct MapIterator<'a, K, V> {
    root: Option<&'a MapNode<K, V>>,
    stack: SmallVec<[MapIteratorFrame<'a, K, V>; MAX_DEPTH]>,
}

impl<'a, K, V> MapIterator<'a, K, V> {
    /// Creates an iterator positioned on the first pair.
    fn new<H>(map: &'a Map<K, V, H>) -> Self {
        let mut iterator = MapIterator {
            root: map.root.as_deref(),
            stack: SmallVec::new(),
        };
        iterator.first();
        iterator
    }

    /// Returns `true` if no more pairs remain.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Resets the iterator to the first pair.
    pub fn first(&mut self) {
        self.stack.clear();
        if let Some(root) = self.root {
            self.stack.push(MapIteratorFrame {
                node: root,
                index: 0,
            });
            self.descend_first();
        }
    }

    /// Positions the stack on the left-most pair reachable from the top
    /// frame. Frames below the top are assumed to be correct.
    fn descend_first(&mut self) {
        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                return;
            };
            let node = self.stack[top].node;
            match node {
                MapNode::Bitmap { children, .. } => {
                    self.stack[top].index = 0;
                    let child: &'a MapNode<K, V> = children[0].as_ref();
                    self.stack.push(MapIteratorFrame {
                        node: child,
                        index: 0,
                    });
                }
                MapNode::HashArray { children, .. } => {
                    let Some(position) = children.iter().position(|child| child.is_some()) else {
                        return;
                    };
                    self.stack[top].index = position;
                    if let Some(child) = children[position].as_deref() {
                        self.stack.push(MapIteratorFrame {
                            node: child,
                            index: 0,
                        });
                    }
                }
                MapNode::Array { .. } | MapNode::Value { .. } | MapNode::Collision { .. } => {
                    self.stack[top].index = 0;
                    return;
                }
            }
        }
    }

    /// Moves to the next pair, unwinding the stack until a frame can step
    /// forward and descending left-most into the new subtree.
    fn advance(&mut self) {
        while let Some(top) = self.stack.len().checked_sub(1) {
            let node = self.stack[top].node;
            let index = self.stack[top].index;
            match node {
                MapNode::Array { entries } | MapNode::Collision { entries, .. } => {
                    if index + 1 < entries.len() {
                        self.stack[top].index = index + 1;
                        return;
                    }
                }
                MapNode::Value { .. } => {
                    // A value leaf has a single pair; traverse up.
                }
                MapNode::Bitmap { children, .. } => {
                    if index + 1 < children.len() {
                        self.stack[top].index = index + 1;
                        let child: &'a MapNode<K, V> = children[index + 1].as_ref();
                        self.stack.push(MapIteratorFrame {
                            node: child,
                            index: 0,
                        });
                        self.descend_first();
                        return;
                    }
                }
                MapNode::HashArray { children, .. } => {
                    for position in index + 1..BRANCHING_FACTOR {
                        if let Some(child) = children[position].as_deref() {
                            self.stack[top].index = position;
                            self.stack.push(MapIteratorFrame {
                                node: child,
                                index: 0,
                            });
                            self.descend_first();
                            return;
                        }
                    }
                }
            }
            self.stack.pop();
        }
    }
}

impl<'a, K, V> Iterator for MapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    /// Returns the current pair, then moves the iterator forward.
    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.stack.last()?;
        let node = frame.node;
        let index = frame.index;
        let (key, value) = match node {
            MapNode::Array { entries } | MapNode::Collision { entries, .. } => {
                let (key, value) = entries.get(index)?;
                (key, value)
            }
            MapNode::Value { key, value, .. } => (key, value),
            MapNode::Bitmap { .. } | MapNode::HashArray { .. } => return None,
        };
        self.advance();
        Some((key, value))
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, H: Default> Default for Map<K, V, H> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<'a, K, V, H> IntoIterator for &'a Map<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = MapIterator<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V: PartialEq, H: Hasher<K>> PartialEq for Map<K, V, H> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        self.iter().all(|(key, value)| {
            other
                .get(key)
                .is_some_and(|other_value| other_value == value)
        })
    }
}

impl<K, V: Eq, H: Hasher<K>> Eq for Map<K, V, H> {}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for Map<K, V, H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, H> serde::Serialize for Map<K, V, H>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct MapVisitor<K, V, H> {
    marker: std::marker::PhantomData<(K, V, H)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, H> serde::de::Visitor<'de> for MapVisitor<K, V, H>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    H: Hasher<K> + Default + Clone,
{
    type Value = Map<K, V, H>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = Map::with_hasher(H::default());
        while let Some((key, value)) = access.next_entry()? {
            map = map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, H> serde::Deserialize<'de> for Map<K, V, H>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    H: Hasher<K> + Default + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// A hasher sending every key to one bucket; equality stays exact.
    #[derive(Clone, Copy, Default)]
    struct CollidingHasher;

    impl Hasher<i64> for CollidingHasher {
        fn hash(&self, _key: &i64) -> u32 {
            1
        }

        fn equal(&self, a: &i64, b: &i64) -> bool {
            a == b
        }
    }

    #[rstest]
    fn test_new_creates_empty() {
        let map: Map<String, i32> = Map::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[rstest]
    fn test_insert_and_get() {
        let map = Map::new().insert(1i64, "one").insert(2i64, "two");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&2), Some(&"two"));
        assert_eq!(map.get(&3), None);
    }

    #[rstest]
    fn test_insert_overwrite_keeps_size() {
        let map = Map::new().insert(1i64, 1).insert(1i64, 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&2));
    }

    #[rstest]
    fn test_array_leaf_promotes_past_threshold() {
        let mut map = Map::new();
        for key in 0i64..50 {
            map = map.insert(key, key * 10);
        }
        assert_eq!(map.len(), 50);
        for key in 0i64..50 {
            assert_eq!(map.get(&key), Some(&(key * 10)));
        }
    }

    #[rstest]
    fn test_remove_absent_shares_root() {
        let map = Map::new().insert(1i64, "one");
        let removed = map.remove(&2);
        assert_eq!(removed.len(), 1);
        let (left, right) = (map.root.as_ref().unwrap(), removed.root.as_ref().unwrap());
        assert!(ReferenceCounter::ptr_eq(left, right));
    }

    #[rstest]
    fn test_remove_to_empty() {
        let map = Map::new().insert(1i64, "one");
        let removed = map.remove(&1);
        assert!(removed.is_empty());
        assert_eq!(removed.get(&1), None);
    }

    #[rstest]
    fn test_colliding_keys_coexist() {
        let map = Map::with_hasher(CollidingHasher)
            .insert(1i64, "one")
            .insert(2i64, "two")
            .insert(3i64, "three");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&2), Some(&"two"));
        assert_eq!(map.get(&3), Some(&"three"));

        let removed = map.remove(&2);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed.get(&2), None);
        assert_eq!(removed.get(&1), Some(&"one"));
        assert_eq!(removed.get(&3), Some(&"three"));
    }

    #[rstest]
    fn test_iteration_yields_every_pair_once() {
        let mut map = Map::new();
        for key in 0i64..200 {
            map = map.insert(key, key);
        }
        let mut keys: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..200).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_iteration_order_is_deterministic() {
        let mut map = Map::new();
        for key in 0i64..100 {
            map = map.insert(key, key);
        }
        let first: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
        let second: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_eq_ignores_iteration_order() {
        let left = Map::new().insert(1i64, "a").insert(2i64, "b");
        let right = Map::new().insert(2i64, "b").insert(1i64, "a");
        assert_eq!(left, right);
    }

    /// Walks the trie checking the per-variant structural invariants.
    fn check_node(node: &MapNode<i64, i64>, is_root: bool) {
        match node {
            MapNode::Array { entries } => {
                assert!(is_root);
                assert!(!entries.is_empty() && entries.len() <= MAX_ARRAY_SIZE);
            }
            MapNode::Bitmap { bitmap, children } => {
                assert_eq!(bitmap.count_ones() as usize, children.len());
                assert!(!children.is_empty());
                for child in children {
                    check_node(child, false);
                }
            }
            MapNode::HashArray { count, children } => {
                let occupied = children.iter().filter(|child| child.is_some()).count();
                assert_eq!(*count, occupied);
                for child in children.iter().flatten() {
                    check_node(child, false);
                }
            }
            MapNode::Value { .. } => {}
            MapNode::Collision { entries, .. } => {
                assert!(entries.len() >= 2);
                for (index, (key, _)) in entries.iter().enumerate() {
                    for (other, _) in &entries[index + 1..] {
                        assert_ne!(key, other);
                    }
                }
            }
        }
    }

    #[rstest]
    fn test_structural_invariants_through_transitions() {
        let mut map = Map::new();
        for key in 0i64..2000 {
            map = map.insert(key, key);
            if key % 97 == 0 {
                check_node(map.root.as_deref().unwrap(), true);
            }
        }
        check_node(map.root.as_deref().unwrap(), true);

        for key in 0i64..1990 {
            map = map.remove(&key);
            if key % 97 == 0 && !map.is_empty() {
                check_node(map.root.as_deref().unwrap(), true);
            }
        }
        check_node(map.root.as_deref().unwrap(), true);
    }
}
