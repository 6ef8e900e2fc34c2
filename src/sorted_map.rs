//! Persistent (immutable) ordered map based on a B+-tree.
//!
//! This module provides [`SortedMap`], an immutable map whose keys are kept
//! in order under a pluggable [`Comparer`].
//!
//! # Overview
//!
//! `SortedMap` is a B+-tree with maximum fan-out 32. Data lives in leaves;
//! branches hold separator keys, each equal to the minimum key reachable
//! through its child. Inserts split overflowing nodes in two; deletes never
//! merge siblings.
//!
//! - O(log N) `get`, `insert`, `remove`
//! - O(1) `len` and `is_empty`
//! - Ordered iteration with `seek`, forward and backward
//!
//! All operations return new maps without modifying the original, and
//! structural sharing ensures memory efficiency.
//!
//! # Examples
//!
//! ```rust
//! use perennial::SortedMap;
//!
//! let map = SortedMap::new()
//!     .insert(3i64, "three")
//!     .insert(1i64, "one")
//!     .insert(2i64, "two");
//!
//! // Entries are always in sorted order
//! let keys: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
//! assert_eq!(keys, vec![1, 2, 3]);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert(1i64, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert_eq!(updated.get(&1), Some(&"ONE"));
//! ```

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::ReferenceCounter;
use crate::comparer::{Comparer, DefaultComparer};

// =============================================================================
// Constants
// =============================================================================

/// Maximum entries per leaf and elements per branch.
const BRANCHING_FACTOR: usize = 32;

/// Inline capacity of the iterator descent stack.
const MAX_DEPTH: usize = 32;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the B+-tree.
#[derive(Clone)]
enum SortedMapNode<K, V> {
    /// Branch holding (separator, child) elements; each separator is the
    /// minimum key in its child's subtree.
    Branch {
        elements: Vec<(K, ReferenceCounter<SortedMapNode<K, V>>)>,
    },
    /// Leaf holding sorted (key, value) entries.
    Leaf { entries: Vec<(K, V)> },
}

impl<K, V> SortedMapNode<K, V> {
    /// Returns the lowest key stored in this node's subtree.
    fn min_key(&self) -> &K {
        match self {
            SortedMapNode::Branch { elements } => elements[0].1.min_key(),
            SortedMapNode::Leaf { entries } => &entries[0].0,
        }
    }

    /// Returns the descent position for the key within this node.
    ///
    /// For a branch this is the child whose separator span contains the key
    /// (the largest separator not exceeding it, or child 0). For a leaf this
    /// is the smallest index whose key is >= the target, which may equal the
    /// entry count.
    fn index_of<C: Comparer<K>>(&self, key: &K, comparer: &C) -> usize {
        match self {
            SortedMapNode::Branch { elements } => {
                let index = elements.partition_point(|(element_key, _)| {
                    comparer.compare(element_key, key) != Ordering::Greater
                });
                index.saturating_sub(1)
            }
            SortedMapNode::Leaf { entries } => entries.partition_point(|(entry_key, _)| {
                comparer.compare(entry_key, key) == Ordering::Less
            }),
        }
    }
}

/// Outcome of a recursive delete.
enum Removal<K, V> {
    /// The key was absent; the node is unchanged.
    Unchanged,
    /// The node's last entry was removed.
    Removed,
    /// The node was rewritten along the edit path.
    Replaced(SortedMapNode<K, V>),
}

// =============================================================================
// SortedMap Definition
// =============================================================================

/// A persistent (immutable) ordered map based on a B+-tree.
///
/// `SortedMap` is an immutable data structure that uses structural sharing
/// to efficiently support functional programming patterns. Key ordering goes
/// through the [`Comparer`] collaborator `C`; the default orders any `Ord`
/// key.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `get`          | O(log N)   |
/// | `insert`       | O(log N)   |
/// | `remove`       | O(log N)   |
/// | `len`          | O(1)       |
/// | `is_empty`     | O(1)       |
///
/// # Examples
///
/// ```rust
/// use perennial::SortedMap;
///
/// let map = SortedMap::new().insert(42i64, "answer");
/// assert_eq!(map.get(&42), Some(&"answer"));
/// ```
#[derive(Clone)]
pub struct SortedMap<K, V, C = DefaultComparer> {
    /// Number of key/value pairs
    size: usize,
    /// Root of the B+-tree
    root: Option<ReferenceCounter<SortedMapNode<K, V>>>,
    /// Comparer pinned for this map's lineage
    comparer: C,
}

impl<K, V> SortedMap<K, V> {
    /// Creates a new empty map using the default comparer.
    ///
    /// Inserting requires the default collaborator to apply to `K` (that
    /// is, `K: Ord`); for any other key type use
    /// [`SortedMap::with_comparer`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::SortedMap;
    ///
    /// let map: SortedMap<i64, String> = SortedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparer(DefaultComparer)
    }

    /// Creates a map containing a single key/value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self
    where
        K: Ord + Clone,
        V: Clone,
    {
        Self::new().insert(key, value)
    }
}

impl<K, V, C> SortedMap<K, V, C> {
    /// Creates a new empty map using the given comparer.
    ///
    /// The comparer is pinned: every map derived from this one by edits
    /// keeps using it.
    #[inline]
    #[must_use]
    pub fn with_comparer(comparer: C) -> Self {
        SortedMap {
            size: 0,
            root: None,
            comparer,
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

    /// Returns an iterator positioned on the first (smallest) key.
    ///
    /// The iterator visits keys in ascending comparer order and supports
    /// backward movement and seeking; see [`SortedMapIterator`].
    #[must_use]
    pub fn iter(&self) -> SortedMapIterator<'_, K, V, C> {
        SortedMapIterator::new(self)
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K, V, C: Comparer<K>> SortedMap<K, V, C> {
    /// Returns a reference to the value for the given key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::SortedMap;
    ///
    /// let map = SortedMap::new().insert(1i64, "one");
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut node = self.root.as_deref()?;
        loop {
            let index = node.index_of(key, &self.comparer);
            match node {
                SortedMapNode::Branch { elements } => node = elements[index].1.as_ref(),
                SortedMapNode::Leaf { entries } => {
                    let (entry_key, value) = entries.get(index)?;
                    if self.comparer.compare(entry_key, key) == Ordering::Equal {
                        return Some(value);
                    }
                    return None;
                }
            }
        }
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

impl<K: Clone, V: Clone, C: Comparer<K> + Clone> SortedMap<K, V, C> {
    /// Returns a new map with the key set to the given value.
    ///
    /// A new map is returned even when the value equals the stored one —
    /// value equality is not tracked.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::SortedMap;
    ///
    /// let map = SortedMap::new().insert(2i64, "two").insert(1i64, "one");
    /// assert_eq!(map.len(), 2);
    ///
    /// let keys: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![1, 2]);
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        match &self.root {
            None => SortedMap {
                size: 1,
                root: Some(ReferenceCounter::new(SortedMapNode::Leaf {
                    entries: vec![(key, value)],
                })),
                comparer: self.comparer.clone(),
            },
            Some(root) => {
                let (new_node, split_node, resized) =
                    Self::set_in_node(root, key, value, &self.comparer);

                // A split at the root grows the tree by one level.
                let new_root = match split_node {
                    Some(split_node) => {
                        let elements = vec![
                            (new_node.min_key().clone(), ReferenceCounter::new(new_node)),
                            (
                                split_node.min_key().clone(),
                                ReferenceCounter::new(split_node),
                            ),
                        ];
                        SortedMapNode::Branch { elements }
                    }
                    None => new_node,
                };

                SortedMap {
                    size: if resized { self.size + 1 } else { self.size },
                    root: Some(ReferenceCounter::new(new_root)),
                    comparer: self.comparer.clone(),
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
    /// O(log N)
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let Some(root) = &self.root else {
            return self.clone();
        };
        match Self::delete_from_node(root, key, &self.comparer) {
            Removal::Unchanged => self.clone(),
            Removal::Removed => SortedMap {
                size: self.size - 1,
                root: None,
                comparer: self.comparer.clone(),
            },
            Removal::Replaced(new_root) => SortedMap {
                size: self.size - 1,
                root: Some(ReferenceCounter::new(new_root)),
                comparer: self.comparer.clone(),
            },
        }
    }

    /// Recursive helper for insert. Returns the rewritten node, the new
    /// right sibling when the node split, and whether a new entry was added.
    fn set_in_node(
        node: &SortedMapNode<K, V>,
        key: K,
        value: V,
        comparer: &C,
    ) -> (SortedMapNode<K, V>, Option<SortedMapNode<K, V>>, bool) {
        let index = node.index_of(&key, comparer);
        match node {
            SortedMapNode::Leaf { entries } => {
                let mut new_entries;
                let resized;
                if index < entries.len()
                    && comparer.compare(&entries[index].0, &key) == Ordering::Equal
                {
                    new_entries = entries.clone();
                    new_entries[index] = (key, value);
                    resized = false;
                } else {
                    new_entries = Vec::with_capacity(entries.len() + 1);
                    new_entries.extend_from_slice(&entries[..index]);
                    new_entries.push((key, value));
                    new_entries.extend_from_slice(&entries[index..]);
                    resized = true;
                }

                if new_entries.len() > BRANCHING_FACTOR {
                    let split = new_entries.split_off(new_entries.len() / 2);
                    (
                        SortedMapNode::Leaf {
                            entries: new_entries,
                        },
                        Some(SortedMapNode::Leaf { entries: split }),
                        resized,
                    )
                } else {
                    (
                        SortedMapNode::Leaf {
                            entries: new_entries,
                        },
                        None,
                        resized,
                    )
                }
            }
            SortedMapNode::Branch { elements } => {
                let (new_child, split_child, resized) =
                    Self::set_in_node(&elements[index].1, key, value, comparer);

                let mut new_elements;
                if let Some(split_child) = split_child {
                    new_elements = Vec::with_capacity(elements.len() + 1);
                    new_elements.extend_from_slice(&elements[..index]);
                    new_elements.push((
                        new_child.min_key().clone(),
                        ReferenceCounter::new(new_child),
                    ));
                    new_elements.push((
                        split_child.min_key().clone(),
                        ReferenceCounter::new(split_child),
                    ));
                    new_elements.extend_from_slice(&elements[index + 1..]);
                } else {
                    // Refresh the separator: the child's minimum may have
                    // changed, notably after a leaf split below it.
                    new_elements = elements.clone();
                    new_elements[index] = (
                        new_child.min_key().clone(),
                        ReferenceCounter::new(new_child),
                    );
                }

                if new_elements.len() > BRANCHING_FACTOR {
                    let split = new_elements.split_off(new_elements.len() / 2);
                    (
                        SortedMapNode::Branch {
                            elements: new_elements,
                        },
                        Some(SortedMapNode::Branch { elements: split }),
                        resized,
                    )
                } else {
                    (
                        SortedMapNode::Branch {
                            elements: new_elements,
                        },
                        None,
                        resized,
                    )
                }
            }
        }
    }

    /// Recursive helper for remove.
    fn delete_from_node(node: &SortedMapNode<K, V>, key: &K, comparer: &C) -> Removal<K, V> {
        let index = node.index_of(key, comparer);
        match node {
            SortedMapNode::Leaf { entries } => {
                if index >= entries.len()
                    || comparer.compare(&entries[index].0, key) != Ordering::Equal
                {
                    return Removal::Unchanged;
                }
                if entries.len() == 1 {
                    return Removal::Removed;
                }
                let mut new_entries = entries.clone();
                new_entries.remove(index);
                Removal::Replaced(SortedMapNode::Leaf {
                    entries: new_entries,
                })
            }
            SortedMapNode::Branch { elements } => {
                match Self::delete_from_node(&elements[index].1, key, comparer) {
                    Removal::Unchanged => Removal::Unchanged,
                    Removal::Removed => {
                        if elements.len() == 1 {
                            return Removal::Removed;
                        }
                        let mut new_elements = elements.clone();
                        new_elements.remove(index);
                        Removal::Replaced(SortedMapNode::Branch {
                            elements: new_elements,
                        })
                    }
                    Removal::Replaced(new_child) => {
                        let mut new_elements = elements.clone();
                        new_elements[index] = (
                            new_child.min_key().clone(),
                            ReferenceCounter::new(new_child),
                        );
                        Removal::Replaced(SortedMapNode::Branch {
                            elements: new_elements,
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
struct SortedMapIteratorFrame<'a, K, V> {
    node: &'a SortedMapNode<K, V>,
    index: usize,
}

/// An ordered iterator over a [`SortedMap`].
///
/// The iterator is a cursor: [`next`](Iterator::next) and
/// [`prev`](SortedMapIterator::prev) both read the current pair and then
/// move, so switching direction mid-iteration is supported.
/// [`seek`](SortedMapIterator::seek) positions the cursor on the smallest
/// key greater than or equal to a target.
pub struct SortedMapIterator<'a, K, V, C = DefaultComparer> {
    map: &'a SortedMap<K, V, C>,
    stack: SmallVec<[SortedMapIteratorFrame<'a, K, V>; MAX_DEPTH]>,
}

impl<'a, K, V, C> SortedMapIterator<'a, K, V, C> {
    /// Creates an iterator positioned on the first pair.
    fn new(map: &'a SortedMap<K, V, C>) -> Self {
        let mut iterator = SortedMapIterator {
            map,
            stack: SmallVec::new(),
        };
        iterator.first();
        iterator
    }

    /// Returns `true` if no more pairs remain in the current direction.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Positions the iterator on the smallest key.
    pub fn first(&mut self) {
        self.stack.clear();
        if let Some(root) = self.map.root.as_deref() {
            self.stack.push(SortedMapIteratorFrame {
                node: root,
                index: 0,
            });
            self.descend_first();
        }
    }

    /// Positions the iterator on the largest key.
    pub fn last(&mut self) {
        self.stack.clear();
        if let Some(root) = self.map.root.as_deref() {
            self.stack.push(SortedMapIteratorFrame {
                node: root,
                index: 0,
            });
            self.descend_last();
        }
    }

    /// Returns the current pair, then moves the iterator backward. Returns
    /// `None` once the cursor has moved before the smallest key.
    pub fn prev(&mut self) -> Option<(&'a K, &'a V)> {
        let (key, value) = self.current()?;
        self.retreat();
        Some((key, value))
    }

    /// Reads the pair under the top-of-stack leaf frame.
    fn current(&self) -> Option<(&'a K, &'a V)> {
        let frame = self.stack.last()?;
        match frame.node {
            SortedMapNode::Leaf { entries } => {
                let (key, value) = entries.get(frame.index)?;
                Some((key, value))
            }
            SortedMapNode::Branch { .. } => None,
        }
    }

    /// Descends left-most from the top frame.
    fn descend_first(&mut self) {
        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                return;
            };
            let node = self.stack[top].node;
            self.stack[top].index = 0;
            match node {
                SortedMapNode::Branch { elements } => {
                    let child: &'a SortedMapNode<K, V> = elements[0].1.as_ref();
                    self.stack.push(SortedMapIteratorFrame {
                        node: child,
                        index: 0,
                    });
                }
                SortedMapNode::Leaf { .. } => return,
            }
        }
    }

    /// Descends right-most from the top frame.
    fn descend_last(&mut self) {
        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                return;
            };
            let node = self.stack[top].node;
            match node {
                SortedMapNode::Branch { elements } => {
                    let index = elements.len() - 1;
                    self.stack[top].index = index;
                    let child: &'a SortedMapNode<K, V> = elements[index].1.as_ref();
                    self.stack.push(SortedMapIteratorFrame {
                        node: child,
                        index: 0,
                    });
                }
                SortedMapNode::Leaf { entries } => {
                    self.stack[top].index = entries.len() - 1;
                    return;
                }
            }
        }
    }

    /// Moves to the next pair, unwinding until a frame can step forward.
    fn advance(&mut self) {
        while let Some(top) = self.stack.len().checked_sub(1) {
            let node = self.stack[top].node;
            let index = self.stack[top].index;
            match node {
                SortedMapNode::Leaf { entries } => {
                    if index + 1 < entries.len() {
                        self.stack[top].index = index + 1;
                        return;
                    }
                }
                SortedMapNode::Branch { elements } => {
                    if index + 1 < elements.len() {
                        self.stack[top].index = index + 1;
                        let child: &'a SortedMapNode<K, V> = elements[index + 1].1.as_ref();
                        self.stack.push(SortedMapIteratorFrame {
                            node: child,
                            index: 0,
                        });
                        self.descend_first();
                        return;
                    }
                }
            }
            self.stack.pop();
        }
    }

    /// Moves to the previous pair, unwinding until a frame can step back.
    fn retreat(&mut self) {
        while let Some(top) = self.stack.len().checked_sub(1) {
            let node = self.stack[top].node;
            let index = self.stack[top].index;
            match node {
                SortedMapNode::Leaf { .. } => {
                    if index > 0 {
                        self.stack[top].index = index - 1;
                        return;
                    }
                }
                SortedMapNode::Branch { elements } => {
                    if index > 0 {
                        self.stack[top].index = index - 1;
                        let child: &'a SortedMapNode<K, V> = elements[index - 1].1.as_ref();
                        self.stack.push(SortedMapIteratorFrame {
                            node: child,
                            index: 0,
                        });
                        self.descend_last();
                        return;
                    }
                }
            }
            self.stack.pop();
        }
    }
}

impl<'a, K, V, C: Comparer<K>> SortedMapIterator<'a, K, V, C> {
    /// Positions the iterator on the smallest key greater than or equal to
    /// the given key, or marks it done when no such key exists.
    pub fn seek(&mut self, key: &K) {
        self.stack.clear();
        let Some(root) = self.map.root.as_deref() else {
            return;
        };
        self.stack.push(SortedMapIteratorFrame {
            node: root,
            index: 0,
        });
        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                return;
            };
            let node = self.stack[top].node;
            let index = node.index_of(key, &self.map.comparer);
            self.stack[top].index = index;
            match node {
                SortedMapNode::Branch { elements } => {
                    let child: &'a SortedMapNode<K, V> = elements[index].1.as_ref();
                    self.stack.push(SortedMapIteratorFrame {
                        node: child,
                        index: 0,
                    });
                }
                SortedMapNode::Leaf { entries } => {
                    // Past the end of this leaf: the target lands in the
                    // next leaf, or nowhere.
                    if index == entries.len() {
                        self.advance();
                    }
                    return;
                }
            }
        }
    }
}

impl<'a, K, V, C> Iterator for SortedMapIterator<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    /// Returns the current pair, then moves the iterator forward.
    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.current()?;
        self.advance();
        Some((key, value))
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Default> Default for SortedMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparer(C::default())
    }
}

impl<'a, K, V, C> IntoIterator for &'a SortedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = SortedMapIterator<'a, K, V, C>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for SortedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        self.iter()
            .zip(other.iter())
            .all(|((left_key, left_value), (right_key, right_value))| {
                left_key == right_key && left_value == right_value
            })
    }
}

impl<K: Eq, V: Eq, C> Eq for SortedMap<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for SortedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for SortedMap<K, V, C>
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
struct SortedMapVisitor<K, V, C> {
    marker: std::marker::PhantomData<(K, V, C)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for SortedMapVisitor<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparer<K> + Default + Clone,
{
    type Value = SortedMap<K, V, C>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = SortedMap::with_comparer(C::default());
        while let Some((key, value)) = access.next_entry()? {
            map = map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for SortedMap<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparer<K> + Default + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(SortedMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
