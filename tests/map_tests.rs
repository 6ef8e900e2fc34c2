//! Unit tests for Map.

use std::collections::HashSet;

use perennial::{Hasher, Map};
use rstest::rstest;

/// A hasher forcing every key into one 32-bit hash; equality stays exact.
#[derive(Clone, Copy, Default)]
struct CollidingHasher;

impl Hasher<i64> for CollidingHasher {
    fn hash(&self, _key: &i64) -> u32 {
        0xdead_beef
    }

    fn equal(&self, a: &i64, b: &i64) -> bool {
        a == b
    }
}

/// A hasher with two buckets, to exercise partial collisions.
#[derive(Clone, Copy, Default)]
struct ParityHasher;

impl Hasher<i64> for ParityHasher {
    fn hash(&self, key: &i64) -> u32 {
        (key % 2) as u32
    }

    fn equal(&self, a: &i64, b: &i64) -> bool {
        a == b
    }
}

fn build(range: std::ops::Range<i64>) -> Map<i64, i64> {
    let mut map = Map::new();
    for key in range {
        map = map.insert(key, key * 10);
    }
    map
}

// =============================================================================
// Construction and access
// =============================================================================

#[rstest]
fn test_new_is_empty() {
    let map: Map<String, i32> = Map::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.get(&"anything".to_string()), None);
}

#[rstest]
fn test_text_keys_use_built_in_hasher() {
    let map = Map::new()
        .insert("a".to_string(), 1)
        .insert("b".to_string(), 2)
        .insert("c".to_string(), 3);

    assert_eq!(map.get(&"b".to_string()), Some(&2));

    let mut seen: Vec<(String, i32)> = map
        .iter()
        .map(|(key, value)| (key.clone(), *value))
        .collect();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3)
        ]
    );
}

#[rstest]
fn test_byte_sequence_keys_use_built_in_hasher() {
    let map = Map::new()
        .insert(b"left".to_vec(), 1)
        .insert(b"right".to_vec(), 2);
    assert_eq!(map.get(&b"left".to_vec()), Some(&1));
    assert_eq!(map.get(&b"missing".to_vec()), None);
}

#[rstest]
fn test_insert_and_get_large() {
    let map = build(0..10_000);
    assert_eq!(map.len(), 10_000);
    for key in 0..10_000 {
        assert_eq!(map.get(&key), Some(&(key * 10)), "key {key}");
    }
    assert_eq!(map.get(&10_000), None);
}

#[rstest]
fn test_insert_does_not_modify_original() {
    let map = build(0..100);
    let updated = map.insert(5, -1);
    assert_eq!(map.get(&5), Some(&50));
    assert_eq!(updated.get(&5), Some(&-1));
    assert_eq!(map.len(), 100);
    assert_eq!(updated.len(), 100);
}

#[rstest]
fn test_overwrite_returns_new_map() {
    let map = Map::new().insert(1i64, 1);
    let same_value = map.insert(1i64, 1);
    // Value equality is not tracked: the overwrite still builds a new map.
    assert_eq!(same_value.len(), 1);
    assert_eq!(same_value.get(&1), Some(&1));
}

// =============================================================================
// Node transitions
// =============================================================================

#[rstest]
fn test_reads_survive_array_leaf_promotion() {
    // The 9th distinct key promotes the root array leaf to hash-driven
    // nodes; every earlier key must remain reachable across the boundary.
    let mut map = Map::new();
    for key in 0i64..8 {
        map = map.insert(key, key);
        assert_eq!(map.len(), (key + 1) as usize);
    }
    let promoted = map.insert(8, 8);
    assert_eq!(promoted.len(), 9);
    for key in 0i64..9 {
        assert_eq!(promoted.get(&key), Some(&key));
    }
    // The pre-promotion map still reads through its array leaf.
    for key in 0i64..8 {
        assert_eq!(map.get(&key), Some(&key));
    }
}

#[rstest]
fn test_reads_survive_bitmap_to_hash_array_conversion() {
    // Grow far enough that interior bitmap branches convert to hash-array
    // branches, then verify every key at every step.
    let mut map = Map::new();
    for key in 0i64..2000 {
        map = map.insert(key, key);
    }
    assert_eq!(map.len(), 2000);
    for key in 0i64..2000 {
        assert_eq!(map.get(&key), Some(&key));
    }
}

#[rstest]
fn test_delete_downgrades_and_reads_survive() {
    let mut map = build(0..2000);
    for key in 0..1900 {
        map = map.remove(&key);
    }
    assert_eq!(map.len(), 100);
    for key in 1900..2000 {
        assert_eq!(map.get(&key), Some(&(key * 10)));
    }
    for key in 0..1900 {
        assert_eq!(map.get(&key), None);
    }
}

// =============================================================================
// Collisions
// =============================================================================

#[rstest]
fn test_full_collision_keys_coexist() {
    let map = Map::with_hasher(CollidingHasher)
        .insert(1, "one")
        .insert(2, "two");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(map.get(&2), Some(&"two"));

    let without_one = map.remove(&1);
    assert_eq!(without_one.len(), 1);
    assert_eq!(without_one.get(&1), None);
    assert_eq!(without_one.get(&2), Some(&"two"));

    let empty = without_one.remove(&2);
    assert!(empty.is_empty());
    assert_eq!(empty.get(&2), None);
}

#[rstest]
fn test_many_collisions_in_one_bucket() {
    let mut map = Map::with_hasher(CollidingHasher);
    for key in 0..100 {
        map = map.insert(key, key);
    }
    assert_eq!(map.len(), 100);
    for key in 0..100 {
        assert_eq!(map.get(&key), Some(&key));
    }
    let pairs: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(pairs.len(), 100);
}

#[rstest]
fn test_parity_hasher_splits_two_buckets() {
    let mut map = Map::with_hasher(ParityHasher);
    for key in 0..50 {
        map = map.insert(key, key);
    }
    assert_eq!(map.len(), 50);
    for key in 0..50 {
        assert_eq!(map.get(&key), Some(&key));
    }
}

// =============================================================================
// Removal
// =============================================================================

#[rstest]
fn test_remove_absent_key_is_identity() {
    let map = build(0..100);
    let removed = map.remove(&1000);
    assert_eq!(removed.len(), 100);
    assert_eq!(removed, map);
}

#[rstest]
fn test_remove_from_empty() {
    let map: Map<i64, i64> = Map::new();
    let removed = map.remove(&1);
    assert!(removed.is_empty());
}

#[rstest]
fn test_remove_all_keys_one_by_one() {
    let mut map = build(0..500);
    for key in 0..500 {
        map = map.remove(&key);
        assert_eq!(map.get(&key), None);
        assert_eq!(map.len(), (499 - key) as usize);
    }
    assert!(map.is_empty());
}

#[rstest]
fn test_remove_does_not_modify_original() {
    let map = build(0..100);
    let removed = map.remove(&42);
    assert_eq!(map.get(&42), Some(&420));
    assert_eq!(removed.get(&42), None);
}

// =============================================================================
// Iteration
// =============================================================================

#[rstest]
fn test_iteration_yields_each_pair_exactly_once() {
    let map = build(0..1000);
    let mut seen = HashSet::new();
    let mut count = 0usize;
    for (key, value) in map.iter() {
        assert_eq!(*value, key * 10);
        assert!(seen.insert(*key), "duplicate key {key}");
        count += 1;
    }
    assert_eq!(count, 1000);
    assert_eq!(seen.len(), 1000);
}

#[rstest]
fn test_iteration_order_is_stable_for_same_shape() {
    let map = build(0..300);
    let first: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
    let second: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(first, second);
}

#[rstest]
fn test_iterator_first_resets() {
    let map = build(0..10);
    let mut iterator = map.iter();
    let initial: Vec<i64> = iterator.by_ref().map(|(key, _)| *key).collect();
    assert!(iterator.is_done());
    iterator.first();
    let again: Vec<i64> = iterator.map(|(key, _)| *key).collect();
    assert_eq!(initial, again);
}

#[rstest]
fn test_keys_and_values() {
    let map = build(0..50);
    let keys: HashSet<i64> = map.keys().copied().collect();
    assert_eq!(keys, (0..50).collect::<HashSet<_>>());
    let total: i64 = map.values().sum();
    assert_eq!(total, (0..50).map(|key| key * 10).sum::<i64>());
}

#[rstest]
fn test_empty_map_iterator_is_done() {
    let map: Map<i64, i64> = Map::new();
    let mut iterator = map.iter();
    assert!(iterator.is_done());
    assert_eq!(iterator.next(), None);
}
