//! Integration tests for abacus-distinct.
//!
//! Runs full worker pools and checks the reported counts against a
//! sequential reference.

use abacus_distinct::{count_distinct, CountConfig, Traversal};
use std::collections::HashSet;

/// Trusted sequential reference: enumerate the whole table.
fn sequential_distinct(n: u32) -> u64 {
    let mut seen = HashSet::new();
    for i in 1..=u64::from(n) {
        for j in 1..=u64::from(n) {
            seen.insert(i * j);
        }
    }
    seen.len() as u64
}

#[test]
fn test_matches_sequential_reference() {
    for n in [0u32, 1, 2, 3, 4, 5, 7, 10, 16, 31, 50] {
        let expected = sequential_distinct(n);
        for workers in [1usize, 2, 3, 5, 8] {
            let report = count_distinct(&CountConfig::new(n, workers)).unwrap();
            assert_eq!(
                report.distinct, expected,
                "n={n} workers={workers}"
            );
        }
    }
}

#[test]
fn test_four_by_four_for_every_pool_size() {
    // Distinct products of the 4x4 table: {1,2,3,4,6,8,9,12,16}.
    for workers in 1..=5 {
        let report = count_distinct(&CountConfig::new(4, workers)).unwrap();
        assert_eq!(report.distinct, 9, "workers={workers}");
    }
}

#[test]
fn test_ten_by_ten_for_every_pool_size() {
    for workers in 1..=16 {
        let report = count_distinct(&CountConfig::new(10, workers)).unwrap();
        assert_eq!(report.distinct, 42, "workers={workers}");
    }
}

#[test]
fn test_boundary_sizes() {
    assert_eq!(count_distinct(&CountConfig::new(0, 3)).unwrap().distinct, 0);
    assert_eq!(count_distinct(&CountConfig::new(1, 3)).unwrap().distinct, 1);
}

#[test]
fn test_more_workers_than_rows() {
    // Workers 5..=11 hold empty row ranges but still participate.
    let report = count_distinct(&CountConfig::new(5, 12)).unwrap();
    assert_eq!(report.distinct, sequential_distinct(5));
}

#[test]
fn test_full_traversal_matches_reference() {
    for n in [0u32, 1, 6, 13, 30] {
        let config = CountConfig::new(n, 4).with_traversal(Traversal::Full);
        let report = count_distinct(&config).unwrap();
        assert_eq!(report.distinct, sequential_distinct(n), "n={n}");
    }
}

#[test]
fn test_medium_table() {
    let expected = sequential_distinct(150);
    let report = count_distinct(&CountConfig::new(150, 8)).unwrap();
    assert_eq!(report.distinct, expected);
}
