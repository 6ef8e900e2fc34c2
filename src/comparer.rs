//! Key ordering for [`SortedMap`](crate::SortedMap).
//!
//! A [`SortedMap`] never compares its keys directly; every ordering decision
//! goes through a [`Comparer`] collaborator. The built-in
//! [`DefaultComparer`] orders any `Ord` key — numeric order for integers,
//! bytewise order for text and byte sequences.

use std::cmp::Ordering;

/// Compares two keys for the purpose of sorting.
///
/// Implementations must define a total order: antisymmetric, transitive, and
/// consistent with the equality relation (`compare(a, b) == Equal` is key
/// equality for a [`SortedMap`](crate::SortedMap)). The library does not
/// attempt to detect or recover from an implementation that violates this
/// contract.
///
/// # Examples
///
/// A comparer that orders integers descending:
///
/// ```rust
/// use std::cmp::Ordering;
/// use perennial::{Comparer, SortedMap};
///
/// #[derive(Clone, Copy, Default)]
/// struct Descending;
///
/// impl Comparer<i64> for Descending {
///     fn compare(&self, a: &i64, b: &i64) -> Ordering {
///         b.cmp(a)
///     }
/// }
///
/// let map = SortedMap::with_comparer(Descending)
///     .insert(1, "one")
///     .insert(3, "three")
///     .insert(2, "two");
///
/// let keys: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
/// assert_eq!(keys, vec![3, 2, 1]);
/// ```
pub trait Comparer<K> {
    /// Returns the ordering of `a` relative to `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The built-in comparer, available for every `Ord` key type.
///
/// This is the default collaborator of [`SortedMap`](crate::SortedMap):
/// constructing a map with [`SortedMap::new`](crate::SortedMap::new)
/// requires nothing beyond the key type being `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultComparer;

impl<K: Ord> Comparer<K> for DefaultComparer {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
