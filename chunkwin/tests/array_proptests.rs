//! Property-based tests for the windowed array.
//!
//! Every operation sequence is replayed against a plain sorted `Vec` model.
//! The array must agree with the model on every `put` result and on the
//! retained contents after every step, whatever the chunk capacity.

use chunkwin::WindowedArray;
use proptest::prelude::*;

// ============================================================================
//  Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    /// Put at the previously attempted key plus this delta (may be negative).
    Put(i64),
    Trim(i64, i64),
    Clear(i64, i64),
    ClearAll,
}

fn range() -> impl Strategy<Value = (i64, i64)> {
    (-10i64..400, 0i64..80).prop_map(|(start, len)| (start, start + len))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        30 => (-3i64..10).prop_map(Op::Put),
        4 => range().prop_map(|(a, b)| Op::Trim(a, b)),
        4 => range().prop_map(|(a, b)| Op::Clear(a, b)),
        1 => Just(Op::ClearAll),
    ]
}

fn ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(), 0..=max)
}

// ============================================================================
//  Model
// ============================================================================

/// Sorted `(key, value)` entries; the reference behavior.
#[derive(Debug, Default)]
struct Model {
    entries: Vec<(i64, i64)>,
}

impl Model {
    fn put(&mut self, key: i64, value: i64) -> bool {
        if let Some(&(last, _)) = self.entries.last()
            && key < last
        {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    fn trim(&mut self, start: i64, end: i64) {
        self.entries.retain(|&(k, _)| start <= k && k < end);
    }

    fn clear(&mut self, start: i64, end: i64) {
        self.entries.retain(|&(k, _)| !(start <= k && k < end));
    }

    fn values(&self) -> Vec<i64> {
        self.entries.iter().map(|&(_, v)| v).collect()
    }
}

/// Applies `ops` to a fresh array, returning the `put` results and the array.
fn replay(capacity: usize, ops: &[Op]) -> (Vec<bool>, WindowedArray<i64>) {
    let array = WindowedArray::with_chunk_capacity(capacity).unwrap();
    let mut accepted = Vec::new();
    let mut key = 0i64;
    for (i, op) in ops.iter().enumerate() {
        match *op {
            Op::Put(delta) => {
                key += delta;
                accepted.push(array.put(key, i as i64));
            }
            Op::Trim(a, b) => array.trim_to_window(a, b),
            Op::Clear(a, b) => array.clear_range(a, b),
            Op::ClearAll => array.clear_all(),
        }
    }
    (accepted, array)
}

proptest! {
    /// Every step agrees with the model: put results, size and values.
    #[test]
    fn matches_model(ops in ops(200), capacity in 1usize..=8) {
        let array = WindowedArray::with_chunk_capacity(capacity).unwrap();
        let mut model = Model::default();
        let mut key = 0i64;

        for (i, op) in ops.iter().enumerate() {
            match *op {
                Op::Put(delta) => {
                    key += delta;
                    let value = i as i64;
                    prop_assert_eq!(array.put(key, value), model.put(key, value), "put({}) at step {}", key, i);
                }
                Op::Trim(a, b) => {
                    array.trim_to_window(a, b);
                    model.trim(a, b);
                }
                Op::Clear(a, b) => {
                    array.clear_range(a, b);
                    model.clear(a, b);
                }
                Op::ClearAll => {
                    array.clear_all();
                    model.entries.clear();
                }
            }
            prop_assert_eq!(array.values(), model.values(), "after {:?} at step {}", op, i);
            prop_assert_eq!(array.size(), model.entries.len());
        }
    }

    /// Capacity only changes allocation, never what is accepted or retained.
    #[test]
    fn capacity_is_transparent(ops in ops(200), capacity in 1usize..=16) {
        let (accepted_small, small) = replay(capacity, &ops);
        let (accepted_large, large) = replay(512, &ops);

        prop_assert_eq!(accepted_small, accepted_large);
        prop_assert_eq!(small.values(), large.values());
        prop_assert_eq!(small.size(), large.size());
    }

    /// Trimming twice to the same window is the same as trimming once.
    #[test]
    fn trim_is_idempotent(ops in ops(120), capacity in 1usize..=8, (a, b) in range()) {
        let (_, array) = replay(capacity, &ops);
        array.trim_to_window(a, b);
        let once = array.debug_string();
        array.trim_to_window(a, b);
        prop_assert_eq!(array.debug_string(), once);
    }

    /// Clearing a range above every retained key changes nothing.
    #[test]
    fn disjoint_clear_is_noop(ops in ops(120), capacity in 1usize..=8, len in 1i64..50) {
        let (_, array) = replay(capacity, &ops);
        let before = array.debug_string();
        let values = array.values();
        let above = 1_000;
        array.clear_range(above, above + len);
        array.clear_range(-1_000 - len, -1_000);
        prop_assert_eq!(array.values(), values);
        prop_assert_eq!(array.debug_string(), before);
    }

    /// Sorted puts are always accepted and come back in order.
    #[test]
    fn sorted_puts_round_trip(mut keys in prop::collection::vec(any::<i64>(), 0..300), capacity in 1usize..=8) {
        keys.sort_unstable();
        let array = WindowedArray::with_chunk_capacity(capacity).unwrap();
        for (i, &k) in keys.iter().enumerate() {
            prop_assert!(array.put(k, i as i64));
        }
        prop_assert_eq!(array.size(), keys.len());
        prop_assert_eq!(array.values(), (0..keys.len() as i64).collect::<Vec<_>>());
    }
}
