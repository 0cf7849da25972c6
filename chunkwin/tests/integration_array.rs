//! Integration tests for the windowed array.
//!
//! These exercise the public API end to end: ordered insertion, window trims,
//! range clears, full resets, and concurrent access from several threads.

use std::sync::Arc;
use std::thread;

use chunkwin::{ArrayConfig, WindowedArray};

/// Builds an array with `capacity`-slot chunks holding `(k, k * 10)` for each key.
fn array_with(capacity: usize, keys: impl IntoIterator<Item = i64>) -> WindowedArray<i64> {
    let array = WindowedArray::with_chunk_capacity(capacity).unwrap();
    for k in keys {
        assert!(array.put(k, k * 10), "put({k}) was rejected");
    }
    array
}

#[test]
fn test_trim_then_disjoint_clear_scenario() {
    let array = array_with(4, 1..=6);
    assert_eq!(array.size(), 6);
    assert_eq!(array.values(), vec![10, 20, 30, 40, 50, 60]);

    array.trim_to_window(3, 6);
    assert_eq!(array.values(), vec![30, 40, 50]);

    // Keys 1 and 2 are already gone.
    array.clear_range(1, 2);
    assert_eq!(array.values(), vec![30, 40, 50]);
    assert_eq!(array.size(), 3);
}

#[test]
fn test_empty_array_observations() {
    let array: WindowedArray<i64> = WindowedArray::default();
    assert_eq!(array.size(), 0);
    assert_eq!(array.values(), Vec::<i64>::new());
    assert_eq!(array.debug_string(), "[]");

    // Range operations on an empty array are harmless.
    array.trim_to_window(0, 10);
    array.clear_range(0, 10);
    array.clear_all();
    assert_eq!(array.debug_string(), "[]");
}

#[test]
fn test_trim_is_idempotent() {
    let array = array_with(3, [3, 4, 5, 9, 10, 13, 14, 15, 21, 24, 29, 30, 31]);
    array.trim_to_window(5, 23);
    let once = (array.values(), array.debug_string());

    array.trim_to_window(5, 23);
    assert_eq!((array.values(), array.debug_string()), once);
    assert_eq!(once.0, vec![50, 90, 100, 130, 140, 150, 210]);
}

#[test]
fn test_clear_then_trim() {
    let array = array_with(4, [3, 4, 5, 9, 10, 13, 14, 15, 21, 24, 29, 30, 31]);
    array.clear_range(5, 23);
    assert_eq!(array.values(), vec![30, 40, 240, 290, 300, 310]);

    array.trim_to_window(4, 30);
    assert_eq!(array.values(), vec![40, 240, 290]);

    // The head moved back to the chunk ending at 29.
    assert!(!array.put(28, 0));
    assert!(array.put(29, 291));
    assert_eq!(array.values(), vec![40, 240, 290, 291]);
}

#[test]
fn test_repeated_clears_interleaved_with_puts() {
    let array = array_with(3, 0..30);
    array.clear_range(5, 10);
    array.clear_range(12, 13);
    array.clear_range(20, 25);
    for k in 30..35 {
        assert!(array.put(k, k * 10));
    }
    array.clear_range(28, 32);

    let expected: Vec<i64> = (0..35)
        .filter(|k| !(5..10).contains(k))
        .filter(|&k| k != 12)
        .filter(|k| !(20..25).contains(k))
        .filter(|k| !(28..32).contains(k))
        .map(|k| k * 10)
        .collect();
    assert_eq!(array.values(), expected);
    assert_eq!(array.size(), expected.len());
}

#[test]
fn test_clear_all_then_single_put() {
    let array = array_with(2, 1..=9);
    array.clear_all();
    assert!(array.put(100, 7));
    assert_eq!(array.size(), 1);
    assert_eq!(array.values(), vec![7]);
    assert_eq!(array.chunk_count(), 1);
}

#[test]
fn test_generic_values() {
    let array: WindowedArray<f64> = WindowedArray::with_config(ArrayConfig::new(2).unwrap()).unwrap();
    assert!(array.put(1, 0.5));
    assert!(array.put(2, 1.5));
    assert!(array.put(3, 2.5));
    array.trim_to_window(2, 4);
    assert_eq!(array.values(), vec![1.5, 2.5]);
    assert_eq!(array.debug_string(), "[(2: 1.5) ]->[(3: 2.5) ]");
}

#[test]
fn test_invalid_config_rejected() {
    assert!(WindowedArray::<i64>::with_chunk_capacity(0).is_err());
    assert!(WindowedArray::<i64>::with_config(ArrayConfig { chunk_capacity: 0 }).is_err());
}

#[test]
fn test_concurrent_writer_and_readers() {
    let array = Arc::new(array_with(16, std::iter::empty()));

    let writer = {
        let array = Arc::clone(&array);
        thread::spawn(move || {
            for k in 0..10_000i64 {
                assert!(array.put(k, k));
                if k % 1000 == 999 {
                    array.trim_to_window(k - 500, i64::MAX);
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let array = Arc::clone(&array);
            thread::spawn(move || {
                for _ in 0..200 {
                    let values = array.values();
                    // Snapshots are always sorted and gap-free within a window.
                    assert!(values.windows(2).all(|w| w[1] == w[0] + 1));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    let values = array.values();
    assert_eq!(values.first(), Some(&9499));
    assert_eq!(values.last(), Some(&9999));
    assert_eq!(array.size(), 501);
}
