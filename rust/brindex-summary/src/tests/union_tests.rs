use std::collections::BTreeSet;

use crate::consistent::{ScanKey, Strategy};
use crate::ranges::Ranges;

fn summary(values: impl IntoIterator<Item = i64>) -> Ranges<i64> {
    let mut r = Ranges::with_buffer(6, 12).unwrap();
    for v in values {
        r.add_value(&v);
    }
    r
}

#[test]
fn test_union_disjoint() {
    let mut a = summary([1, 2, 3]);
    let b = summary([100, 101, 102]);

    a.union_with(&b);

    for v in [1, 2, 3, 100, 101, 102] {
        assert!(a.contains(&v, true));
    }
    assert!(!a.contains(&50, true));

    // The gap between the clusters survives the union.
    assert!(a.consistent(&[ScanKey::new(Strategy::LessEqual, 50)], true));
    assert!(!a.consistent(&[ScanKey::new(Strategy::Equal, 50)], true));
}

#[test]
fn test_union_disjoint_reduces_under_pressure() {
    // A working cap of six forces the union to form intervals.
    let mut a = Ranges::with_buffer(6, 6).unwrap();
    for v in [1, 2, 3] {
        a.add_value(&v);
    }
    let b = summary([100, 101, 102]);

    a.union_with(&b);
    assert!(a.len() <= 6);
    assert!(a.interval_count() >= 1);
    for v in [1, 2, 3, 100, 101, 102] {
        assert!(a.contains(&v, true));
    }
    assert!(!a.contains(&50, true));
}

#[test]
fn test_union_overlapping() {
    let mut a = summary(1..=50);
    let b = summary(40..=90);

    let before_a: Vec<i64> = (1..=50).collect();
    let before_b: Vec<i64> = (40..=90).collect();

    a.union_with(&b);

    for v in before_a.iter().chain(before_b.iter()) {
        assert!(a.contains(v, true), "lost {v}");
    }

    // The overlapping middles must have fused into one wide interval.
    let wide = (0..a.interval_count())
        .map(|i| a.interval(i))
        .any(|(lo, hi)| *lo <= 40 && *hi >= 50);
    assert!(wide, "expected a fused interval: {a:?}");
}

#[test]
fn test_union_with_empty() {
    let mut a = summary([5, 6, 7]);
    let empty = Ranges::with_buffer(6, 12).unwrap();

    a.union_with(&empty);
    for v in [5, 6, 7] {
        assert!(a.contains(&v, true));
    }

    let mut empty = Ranges::with_buffer(6, 12).unwrap();
    empty.union_with(&a);
    for v in [5, 6, 7] {
        assert!(empty.contains(&v, true));
    }
}

#[test]
fn test_union_left_operand_cap_wins() {
    let mut a = Ranges::with_buffer(6, 24).unwrap();
    for v in 0..10 {
        a.add_value(&(v * 100));
    }
    let mut b = Ranges::with_buffer(4, 8).unwrap();
    for v in 0..10 {
        b.add_value(&(v * 100 + 5_000));
    }

    a.union_with(&b);
    assert_eq!(a.max_values(), 24);
    assert_eq!(a.target_max_values(), 6);
    assert!(a.len() <= 24);
}

#[test]
fn test_union_does_not_modify_right_operand() {
    let mut a = summary([1, 2]);
    let b = summary([10, 20]);
    let before = format!("{b:?}");

    a.union_with(&b);
    assert_eq!(format!("{b:?}"), before);
}

#[test]
fn test_union_random_preserves_membership() {
    let mut rng = fastrand::Rng::with_seed(7);

    for _ in 0..10 {
        let mut a = Ranges::<i64>::with_buffer(8, 16).unwrap();
        let mut b = Ranges::<i64>::with_buffer(8, 16).unwrap();
        let mut all = BTreeSet::new();

        for _ in 0..200 {
            let v = rng.i64(0..10_000);
            if rng.bool() {
                a.add_value(&v);
            } else {
                b.add_value(&v);
            }
            all.insert(v);
        }

        a.union_with(&b);
        assert!(a.check_invariants());
        for v in &all {
            assert!(a.contains(v, true), "union lost {v}");
        }
    }
}

#[test]
fn test_union_of_serialized_summaries() {
    // The merge path used at query/maintenance time: both sides come off
    // disk, the left operand's caps win.
    let mut a = summary([1, 2, 3]);
    let mut b = summary([100, 101, 102]);
    let blob_a = a.serialize().unwrap();
    let blob_b = b.serialize().unwrap();

    let mut a = Ranges::<i64>::deserialize(&blob_a, 12).unwrap();
    let b = Ranges::<i64>::deserialize(&blob_b, 12).unwrap();
    a.union_with(&b);

    for v in [1, 2, 3, 100, 101, 102] {
        assert!(a.contains(&v, true));
    }
}
