use brindex_common::error::ErrorKind;

use crate::ranges::{Ranges, working_buffer_size};
use crate::serialized::SerializedRanges;
use crate::value::ByteString;

fn build(values: &[i64]) -> Ranges<i64> {
    let mut r = Ranges::with_buffer(6, 12).unwrap();
    for v in values {
        r.add_value(v);
    }
    r
}

#[test]
fn test_round_trip_simple() {
    let mut r = build(&[10, 20, 30]);
    let blob = r.serialize().unwrap();

    let restored = Ranges::<i64>::deserialize(&blob, 12).unwrap();
    assert_eq!(restored.target_max_values(), 6);
    assert_eq!(restored.max_values(), 12);
    for v in [10, 20, 30] {
        assert!(restored.contains(&v, true));
    }
    assert!(!restored.contains(&15, true));
}

#[test]
fn test_round_trip_is_byte_identical() {
    let mut r = build(&[1, 2, 3, 1_000_000]);
    let blob = r.serialize().unwrap();

    let mut restored = Ranges::<i64>::deserialize(&blob, 12).unwrap();
    let blob2 = restored.serialize().unwrap();
    assert_eq!(blob.as_bytes(), blob2.as_bytes());

    assert!(restored.contains(&1_000_000, true));
    assert!(!restored.contains(&500, true));
}

#[test]
fn test_serialize_compacts_to_target() {
    let mut r = Ranges::<i64>::with_buffer(6, 120).unwrap();
    for v in 0..100 {
        r.add_value(&(v * 7));
    }
    assert!(r.len() > 6);

    let blob = r.serialize().unwrap();
    // The producer itself is now within the target as well.
    assert!(r.len() <= 6);

    let restored = Ranges::<i64>::deserialize(&blob, working_buffer_size(6)).unwrap();
    assert!(restored.len() <= 6);
    for v in 0..100 {
        assert!(restored.contains(&(v * 7), true));
    }
}

#[test]
fn test_serialize_empty() {
    let mut r = Ranges::<i64>::with_buffer(6, 12).unwrap();
    let blob = r.serialize().unwrap();

    let restored = Ranges::<i64>::deserialize(&blob, 12).unwrap();
    assert!(restored.is_empty());
    assert!(!restored.contains(&0, true));
}

#[test]
fn test_deserialize_agrees_on_membership() {
    let probe: Vec<i64> = (-10..2_100).collect();

    let mut r = Ranges::<i64>::with_buffer(16, 32).unwrap();
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..500 {
        r.add_value(&rng.i64(0..2_000));
    }

    let blob = r.serialize().unwrap();
    let restored = Ranges::<i64>::deserialize(&blob, 160).unwrap();
    for v in &probe {
        assert_eq!(
            r.contains(v, true),
            restored.contains(v, true),
            "membership diverges at {v}"
        );
    }
}

#[test]
fn test_blob_length_validation() {
    let mut r = build(&[1, 2, 3]);
    let blob = r.serialize().unwrap();

    // Truncated payload.
    let mut bytes = blob.as_bytes().to_vec();
    bytes.pop();
    assert!(SerializedRanges::from_bytes(bytes).is_err());

    // Shorter than any header.
    assert!(SerializedRanges::from_bytes(vec![1, 2, 3]).is_err());

    // Trailing garbage behind a consistent length field is also rejected.
    let mut bytes = blob.as_bytes().to_vec();
    bytes.push(0);
    assert!(SerializedRanges::from_bytes(bytes).is_err());
}

#[test]
fn test_type_tag_mismatch() {
    let mut r = build(&[1, 2, 3]);
    let blob = r.serialize().unwrap();

    let err = Ranges::<ByteString>::deserialize(&blob, 12).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
}

#[test]
fn test_working_cap_must_cover_header_cap() {
    let mut r = build(&[1, 2, 3]);
    let blob = r.serialize().unwrap();

    let err = Ranges::<i64>::deserialize(&blob, 4).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Overflow { .. }));
}

#[test]
fn test_corrupted_counts_rejected() {
    let mut r = build(&[1, 2, 3]);
    let blob = r.serialize().unwrap();
    let mut bytes = blob.as_bytes().to_vec();

    // Inflate nvalues beyond what the payload holds.
    bytes[12..16].copy_from_slice(&100u32.to_le_bytes());
    let tampered = SerializedRanges::from_bytes(bytes).unwrap();
    let err = Ranges::<i64>::deserialize(&tampered, 1000).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Decode { .. }));
}

#[test]
fn test_unordered_payload_rejected() {
    // Handcraft a blob claiming two points stored out of order.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&36u32.to_le_bytes()); // total_len
    bytes.extend_from_slice(&3u32.to_le_bytes()); // i64 type tag
    bytes.extend_from_slice(&0u32.to_le_bytes()); // nranges
    bytes.extend_from_slice(&2u32.to_le_bytes()); // nvalues
    bytes.extend_from_slice(&6u32.to_le_bytes()); // max_values
    bytes.extend_from_slice(&9i64.to_le_bytes());
    bytes.extend_from_slice(&3i64.to_le_bytes());

    let blob = SerializedRanges::from_bytes(bytes).unwrap();
    let err = Ranges::<i64>::deserialize(&blob, 12).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Decode { .. }));
}

#[test]
fn test_variable_width_round_trip() {
    let mut r = Ranges::<ByteString>::with_buffer(6, 12).unwrap();
    for s in ["alpha", "delta", "omega", ""] {
        r.add_value(&ByteString(s.as_bytes().to_vec()));
    }

    let blob = r.serialize().unwrap();
    assert_eq!(blob.type_tag(), 10);

    let restored = Ranges::<ByteString>::deserialize(&blob, 12).unwrap();
    for s in ["alpha", "delta", "omega", ""] {
        assert!(restored.contains(&ByteString(s.as_bytes().to_vec()), true));
    }
}
