//! Persistent (immutable) indexed sequence based on a radix-32 trie.
//!
//! This module provides [`List`], an immutable sequence that uses structural
//! sharing for efficient operations.
//!
//! # Overview
//!
//! `List` is a 32-way branching trie. The façade keeps an *origin* — the trie
//! address of logical index 0 — so elements can be added cheaply at either
//! end:
//!
//! - O(log32 N) random access (effectively O(1) for practical sizes)
//! - O(log32 N) `push_back` and `push_front`
//! - O(log32 N) `update`
//! - O(log32 N) `slice`, which also drops references to elements outside
//!   the retained range so they can be reclaimed
//! - O(1) `len` and `is_empty`
//!
//! All operations return new lists without modifying the original, and
//! structural sharing ensures memory efficiency.
//!
//! # Examples
//!
//! ```rust
//! use perennial::List;
//!
//! let list = List::new().push_back(1).push_back(2).push_back(3);
//!
//! assert_eq!(list.get(0), Some(&1));
//! assert_eq!(list.get(2), Some(&3));
//!
//! // Structural sharing: the original list is preserved
//! let extended = list.push_back(4);
//! assert_eq!(list.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4); // New list
//! ```

use std::fmt;

use smallvec::SmallVec;

use crate::ReferenceCounter;
use crate::error::Error;

// =============================================================================
// Constants
// =============================================================================

/// Branching factor (2^5 = 32)
const BRANCHING_FACTOR: usize = 32;

/// Bits per level in the trie
const BITS_PER_LEVEL: usize = 5;

/// Bit mask for extracting the slot index within a node
const MASK: usize = BRANCHING_FACTOR - 1;

/// Inline capacity of the iterator descent stack.
const MAX_DEPTH: usize = 32;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the radix trie.
#[derive(Clone)]
enum ListNode<T> {
    /// Branch node at depth >= 1 holding child pointers at depth - 1.
    Branch {
        depth: usize,
        children: [Option<ReferenceCounter<ListNode<T>>>; BRANCHING_FACTOR],
    },
    /// Leaf node at depth 0 holding element slots.
    Leaf {
        slots: [Option<T>; BRANCHING_FACTOR],
    },
}

impl<T> ListNode<T> {
    /// Creates an empty leaf node.
    fn empty_leaf() -> Self {
        ListNode::Leaf {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Creates an empty node for the given depth.
    fn empty_at_depth(depth: usize) -> Self {
        if depth == 0 {
            Self::empty_leaf()
        } else {
            ListNode::Branch {
                depth,
                children: std::array::from_fn(|_| None),
            }
        }
    }

    /// Returns the depth of this node (0 for leaves).
    fn depth(&self) -> usize {
        match self {
            ListNode::Branch { depth, .. } => *depth,
            ListNode::Leaf { .. } => 0,
        }
    }

    /// Returns the element stored at the given trie address, if any.
    fn get(&self, address: usize) -> Option<&T> {
        match self {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                children[slot].as_ref()?.get(address)
            }
            ListNode::Leaf { slots } => slots[address & MASK].as_ref(),
        }
    }

    /// Returns `true` if any slot strictly before the address is occupied.
    fn contains_before(&self, address: usize) -> bool {
        match self {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                if children[..slot].iter().any(|child| child.is_some()) {
                    return true;
                }
                children[slot]
                    .as_ref()
                    .is_some_and(|child| child.contains_before(address))
            }
            ListNode::Leaf { slots } => {
                let slot = address & MASK;
                slots[..slot].iter().any(|value| value.is_some())
            }
        }
    }

    /// Returns `true` if any slot strictly after the address is occupied.
    fn contains_after(&self, address: usize) -> bool {
        match self {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                if children[slot + 1..].iter().any(|child| child.is_some()) {
                    return true;
                }
                children[slot]
                    .as_ref()
                    .is_some_and(|child| child.contains_after(address))
            }
            ListNode::Leaf { slots } => {
                let slot = address & MASK;
                slots[slot + 1..].iter().any(|value| value.is_some())
            }
        }
    }
}

impl<T: Clone> ListNode<T> {
    /// Returns a copy of the node with the slot at the address set, creating
    /// missing branches along the path.
    fn set(&self, address: usize, value: T) -> Self {
        match self {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                let child = match &children[slot] {
                    Some(child) => child.set(address, value),
                    None => Self::empty_at_depth(depth - 1).set(address, value),
                };
                let mut new_children = children.clone();
                new_children[slot] = Some(ReferenceCounter::new(child));
                ListNode::Branch {
                    depth: *depth,
                    children: new_children,
                }
            }
            ListNode::Leaf { slots } => {
                let mut new_slots = slots.clone();
                new_slots[address & MASK] = Some(value);
                ListNode::Leaf { slots: new_slots }
            }
        }
    }

    /// Returns a node with every slot strictly before the address cleared.
    /// Shares the node unchanged when nothing precedes the address.
    fn delete_before(
        node: &ReferenceCounter<Self>,
        address: usize,
    ) -> ReferenceCounter<Self> {
        if !node.contains_before(address) {
            return node.clone();
        }
        match node.as_ref() {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                let mut pruned: [Option<ReferenceCounter<Self>>; BRANCHING_FACTOR] =
                    std::array::from_fn(|_| None);
                for index in slot..BRANCHING_FACTOR {
                    pruned[index] = children[index].clone();
                }
                if let Some(child) = &children[slot] {
                    pruned[slot] = Some(Self::delete_before(child, address));
                }
                ReferenceCounter::new(ListNode::Branch {
                    depth: *depth,
                    children: pruned,
                })
            }
            ListNode::Leaf { slots } => {
                let slot = address & MASK;
                let mut pruned: [Option<T>; BRANCHING_FACTOR] = std::array::from_fn(|_| None);
                for index in slot..BRANCHING_FACTOR {
                    pruned[index] = slots[index].clone();
                }
                ReferenceCounter::new(ListNode::Leaf { slots: pruned })
            }
        }
    }

    /// Returns a node with every slot strictly after the address cleared.
    /// Shares the node unchanged when nothing follows the address.
    fn delete_after(node: &ReferenceCounter<Self>, address: usize) -> ReferenceCounter<Self> {
        if !node.contains_after(address) {
            return node.clone();
        }
        match node.as_ref() {
            ListNode::Branch { depth, children } => {
                let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                let mut pruned: [Option<ReferenceCounter<Self>>; BRANCHING_FACTOR] =
                    std::array::from_fn(|_| None);
                for index in 0..=slot {
                    pruned[index] = children[index].clone();
                }
                if let Some(child) = &children[slot] {
                    pruned[slot] = Some(Self::delete_after(child, address));
                }
                ReferenceCounter::new(ListNode::Branch {
                    depth: *depth,
                    children: pruned,
                })
            }
            ListNode::Leaf { slots } => {
                let slot = address & MASK;
                let mut pruned: [Option<T>; BRANCHING_FACTOR] = std::array::from_fn(|_| None);
                for index in 0..=slot {
                    pruned[index] = slots[index].clone();
                }
                ReferenceCounter::new(ListNode::Leaf { slots: pruned })
            }
        }
    }
}

// =============================================================================
// List Definition
// =============================================================================

/// A persistent (immutable) indexed sequence based on a radix-32 trie.
///
/// `List` is an immutable data structure that uses structural sharing to
/// efficiently support functional programming patterns. Elements can be
/// appended, prepended, updated by index, and sliced; every edit returns a
/// new list sharing untouched subtrees with the original.
///
/// # Time Complexity
///
/// | Operation    | Complexity |
/// |--------------|------------|
/// | `new`        | O(1)       |
/// | `get`        | O(log32 N) |
/// | `update`     | O(log32 N) |
/// | `push_back`  | O(log32 N) |
/// | `push_front` | O(log32 N) |
/// | `slice`      | O(log32 N) |
/// | `len`        | O(1)       |
/// | `is_empty`   | O(1)       |
///
/// # Examples
///
/// ```rust
/// use perennial::List;
///
/// let mut list = List::new();
/// for value in 0..100 {
///     list = list.push_back(value);
/// }
/// assert_eq!(list.len(), 100);
/// assert_eq!(list.get(50), Some(&50));
/// ```
#[derive(Clone)]
pub struct List<T> {
    /// Root node of the trie
    root: ReferenceCounter<ListNode<T>>,
    /// Trie address of logical index 0
    origin: usize,
    /// Number of elements
    size: usize,
}

impl<T> List<T> {
    /// Creates a new empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list: List<i32> = List::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        List {
            root: ReferenceCounter::new(ListNode::empty_leaf()),
            origin: 0,
            size: 0,
        }
    }

    /// Returns the number of elements in the list.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Total number of addressable slots for the current root depth.
    fn capacity(&self) -> usize {
        1 << ((self.root.depth() + 1) * BITS_PER_LEVEL)
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list = List::new().push_back(1).push_back(2);
    /// assert_eq!(list.get(1), Some(&2));
    /// assert_eq!(list.get(5), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.size {
            return None;
        }
        self.root.get(self.origin + index)
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        if self.size == 0 {
            None
        } else {
            self.get(self.size - 1)
        }
    }

    /// Returns an iterator positioned on index 0.
    ///
    /// The iterator supports forward and backward movement as well as
    /// seeking; see [`ListIterator`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list = List::new().push_back(10).push_back(20);
    /// let collected: Vec<(usize, &i32)> = list.iter().collect();
    /// assert_eq!(collected, vec![(0, &10), (1, &20)]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> ListIterator<'_, T> {
        ListIterator::new(self)
    }
}

impl<T: Clone> List<T> {
    /// Creates a list containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(value: T) -> Self {
        Self::new().push_back(value)
    }

    /// Returns a new list with the element at the given index replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= len`.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list = List::new().push_back(1).push_back(2);
    /// let updated = list.update(0, 10).unwrap();
    ///
    /// assert_eq!(updated.get(0), Some(&10));
    /// assert_eq!(list.get(0), Some(&1)); // Original unchanged
    /// ```
    pub fn update(&self, index: usize, value: T) -> Result<Self, Error> {
        if index >= self.size {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.size,
            });
        }
        Ok(List {
            root: ReferenceCounter::new(self.root.set(self.origin + index, value)),
            origin: self.origin,
            size: self.size,
        })
    }

    /// Returns a new list with the value appended at the end.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list = List::new().push_back(1).push_back(2);
    /// assert_eq!(list.len(), 2);
    /// assert_eq!(list.get(1), Some(&2));
    /// ```
    #[must_use]
    pub fn push_back(&self, value: T) -> Self {
        // Expand the trie to the right if no addressable slots remain.
        let mut root = self.root.clone();
        if self.origin + self.size >= self.capacity() {
            let mut children: [Option<ReferenceCounter<ListNode<T>>>; BRANCHING_FACTOR] =
                std::array::from_fn(|_| None);
            let depth = root.depth() + 1;
            children[0] = Some(root);
            root = ReferenceCounter::new(ListNode::Branch { depth, children });
        }

        let size = self.size + 1;
        let root = ReferenceCounter::new(root.set(self.origin + size - 1, value));
        List {
            root,
            origin: self.origin,
            size,
        }
    }

    /// Returns a new list with the value prepended at the front.
    ///
    /// Every existing index shifts up by one.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let list = List::new().push_back(1).push_front(0);
    /// assert_eq!(list.get(0), Some(&0));
    /// assert_eq!(list.get(1), Some(&1));
    /// ```
    #[must_use]
    pub fn push_front(&self, value: T) -> Self {
        // Expand the trie to the left if no addressable slots remain.
        let mut root = self.root.clone();
        let mut origin = self.origin;
        if origin == 0 {
            let mut children: [Option<ReferenceCounter<ListNode<T>>>; BRANCHING_FACTOR] =
                std::array::from_fn(|_| None);
            let depth = root.depth() + 1;
            children[BRANCHING_FACTOR - 1] = Some(root);
            root = ReferenceCounter::new(ListNode::Branch { depth, children });
            origin += (BRANCHING_FACTOR - 1) << (depth * BITS_PER_LEVEL);
        }

        let size = self.size + 1;
        origin -= 1;
        let root = ReferenceCounter::new(root.set(origin, value));
        List { root, origin, size }
    }

    /// Returns a new list containing the elements at indices `[start, end)`.
    ///
    /// Returns the same list (sharing the same root) when the requested
    /// range is the entire list. References to elements outside the retained
    /// range are removed from the result so they can be reclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if either bound exceeds `len`, and
    /// [`Error::InvalidSlice`] if `start > end`.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perennial::List;
    ///
    /// let mut list = List::new();
    /// for value in 0..10 {
    ///     list = list.push_back(value);
    /// }
    /// let sliced = list.slice(2, 5).unwrap();
    ///
    /// assert_eq!(sliced.len(), 3);
    /// assert_eq!(sliced.get(0), Some(&2));
    /// assert_eq!(sliced.get(2), Some(&4));
    /// ```
    pub fn slice(&self, start: usize, end: usize) -> Result<Self, Error> {
        if start > self.size {
            return Err(Error::IndexOutOfRange {
                index: start,
                len: self.size,
            });
        }
        if end > self.size {
            return Err(Error::IndexOutOfRange {
                index: end,
                len: self.size,
            });
        }
        if start > end {
            return Err(Error::InvalidSlice { start, end });
        }

        // The full range is the same list.
        if start == 0 && end == self.size {
            return Ok(self.clone());
        }

        let size = end - start;
        if size == 0 {
            return Ok(List::new());
        }
        let mut origin = self.origin + start;
        let mut root = self.root.clone();

        // Contract the trie while both endpoints fall into the same
        // top-level slot.
        loop {
            let depth = root.depth();
            if depth <= 1 {
                break;
            }
            let shift = depth * BITS_PER_LEVEL;
            let first_slot = (origin >> shift) & MASK;
            let last_slot = ((origin + size - 1) >> shift) & MASK;
            if first_slot != last_slot {
                break;
            }

            let child = match root.as_ref() {
                ListNode::Branch { children, .. } => children[first_slot].clone(),
                ListNode::Leaf { .. } => None,
            };
            match child {
                Some(child) => {
                    origin -= first_slot << shift;
                    root = child;
                }
                None => break,
            }
        }

        // Drop references outside the retained range.
        let root = ListNode::delete_before(&root, origin);
        let root = ListNode::delete_after(&root, origin + size - 1);

        Ok(List { root, origin, size })
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A node/slot pair in the iterator descent stack.
struct ListIteratorFrame<'a, T> {
    node: &'a ListNode<T>,
    slot: usize,
}

/// An ordered iterator over a [`List`].
///
/// The iterator is a cursor: [`next`](Iterator::next) and
/// [`prev`](ListIterator::prev) both read the current element and then move,
/// so switching direction mid-iteration is supported. [`seek`] repositions
/// the cursor on an arbitrary index.
///
/// The iterator borrows the list and maintains a fixed-capacity descent
/// stack; no per-step allocation occurs.
///
/// [`seek`]: ListIterator::seek
pub struct ListIterator<'a, T> {
    list: &'a List<T>,
    /// Current logical index; -1 after backward exhaustion.
    index: isize,
    stack: SmallVec<[ListIteratorFrame<'a, T>; MAX_DEPTH]>,
}

impl<'a, T> ListIterator<'a, T> {
    /// Creates an iterator positioned on index 0.
    fn new(list: &'a List<T>) -> Self {
        let mut iterator = ListIterator {
            list,
            index: 0,
            stack: SmallVec::new(),
        };
        iterator.first();
        iterator
    }

    /// Returns `true` if no more elements remain in the current direction.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.index < 0 || self.index >= self.list.size as isize
    }

    /// Positions the iterator on the first index. No-op when the list is
    /// empty.
    pub fn first(&mut self) {
        if self.list.is_empty() {
            return;
        }
        self.index = 0;
        self.reset_and_descend(0);
    }

    /// Positions the iterator on the last index. No-op when the list is
    /// empty.
    pub fn last(&mut self) {
        if self.list.is_empty() {
            return;
        }
        let index = self.list.size - 1;
        self.index = index as isize;
        self.reset_and_descend(index);
    }

    /// Moves the iterator to the given index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= len`.
    pub fn seek(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.list.size {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.list.size,
            });
        }
        self.index = index as isize;
        self.reset_and_descend(index);
        Ok(())
    }

    /// Returns the current index and value, then moves the iterator
    /// backward. Returns `None` once the cursor has moved before index 0.
    pub fn prev(&mut self) -> Option<(usize, &'a T)> {
        if self.is_done() {
            return None;
        }
        let index = self.index as usize;
        let value = self.current_value()?;

        self.index -= 1;
        if !self.is_done() {
            // Frames whose slot is already leftmost cannot step back; the
            // ancestors above them remain valid for the new index.
            while self.stack.len() > 1 && self.stack[self.stack.len() - 1].slot == 0 {
                self.stack.pop();
            }
            self.descend(self.index as usize);
        }
        Some((index, value))
    }

    /// Reads the element under the top-of-stack leaf frame.
    fn current_value(&self) -> Option<&'a T> {
        let frame = self.stack.last()?;
        match frame.node {
            ListNode::Leaf { slots } => slots[frame.slot].as_ref(),
            ListNode::Branch { .. } => None,
        }
    }

    /// Rebuilds the stack from the root and descends to the given index.
    fn reset_and_descend(&mut self, index: usize) {
        self.stack.clear();
        self.stack.push(ListIteratorFrame {
            node: self.list.root.as_ref(),
            slot: 0,
        });
        self.descend(index);
    }

    /// Positions the stack on the given index from the current depth.
    /// Frames below the current depth are assumed to be correct.
    fn descend(&mut self, index: usize) {
        let address = self.list.origin + index;
        loop {
            let Some(top) = self.stack.len().checked_sub(1) else {
                return;
            };
            let node = self.stack[top].node;
            match node {
                ListNode::Branch { depth, children } => {
                    let slot = (address >> (depth * BITS_PER_LEVEL)) & MASK;
                    self.stack[top].slot = slot;
                    match children[slot].as_deref() {
                        Some(child) => self.stack.push(ListIteratorFrame {
                            node: child,
                            slot: 0,
                        }),
                        None => return,
                    }
                }
                ListNode::Leaf { .. } => {
                    self.stack[top].slot = address & MASK;
                    return;
                }
            }
        }
    }
}

impl<'a, T> Iterator for ListIterator<'a, T> {
    type Item = (usize, &'a T);

    /// Returns the current index and value, then moves the iterator forward.
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done() {
            return None;
        }
        let index = self.index as usize;
        let value = self.current_value()?;

        self.index += 1;
        if !self.is_done() {
            // Frames whose slot is already rightmost cannot step forward;
            // the ancestors above them remain valid for the new index.
            while self.stack.len() > 1
                && self.stack[self.stack.len() - 1].slot >= BRANCHING_FACTOR - 1
            {
                self.stack.pop();
            }
            self.descend(self.index as usize);
        }
        Some((index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.index < 0 {
            0
        } else {
            self.list.size.saturating_sub(self.index as usize)
        };
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for ListIterator<'_, T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for List<T> {
    #[inline]
    fn default() -> Self {
        List::new()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = (usize, &'a T);
    type IntoIter = ListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        self.iter()
            .zip(other.iter())
            .all(|((_, left), (_, right))| left == right)
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(self.iter().map(|(_, value)| value))
            .finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for List<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for (_, value) in self {
            sequence.serialize_element(value)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct ListVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for ListVisitor<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    type Value = List<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut list = List::new();
        while let Some(value) = access.next_element()? {
            list = list.push_back(value);
        }
        Ok(list)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for List<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ListVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
