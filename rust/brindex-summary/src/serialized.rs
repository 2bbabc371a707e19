//! On-disk form of a summary.
//!
//! The blob is a length-prefixed byte string: a fixed little-endian header
//! followed by the encoded boundary values in storage order (interval
//! boundaries first, then points).
//!
//! ```text
//! u32 total_len    whole blob, header included
//! u32 type_tag     SummaryValue::TYPE_TAG of the element type
//! u32 nranges      number of intervals
//! u32 nvalues      number of points
//! u32 max_values   serialized cap (target_max_values of the producer)
//! ...              2 * nranges + nvalues encoded values
//! ```
//!
//! A serialized summary is always fully compacted: it fits the cap in the
//! header, its points are sorted and deduplicated, and re-serializing a
//! freshly deserialized summary reproduces the blob byte for byte.

use std::io::Cursor;

use byteorder::{LE, ReadBytesExt};

use brindex_common::{Error, Result, verify_arg, verify_data};

use crate::ranges::Ranges;
use crate::value::SummaryValue;

const HEADER_LEN: usize = 20;

/// An immutable, self-describing byte blob holding one summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRanges(Vec<u8>);

impl SerializedRanges {
    /// Wraps raw bytes, validating the length prefix against the actual
    /// buffer. Element-level validation happens on deserialization.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<SerializedRanges> {
        verify_data!(serialized_ranges, bytes.len() >= HEADER_LEN);
        let total_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        verify_data!(serialized_ranges, total_len == bytes.len());
        Ok(SerializedRanges(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The element type tag stored in the header.
    pub fn type_tag(&self) -> u32 {
        u32::from_le_bytes([self.0[4], self.0[5], self.0[6], self.0[7]])
    }
}

impl<T: SummaryValue> Ranges<T> {
    /// Produces the on-disk blob for this summary.
    ///
    /// Compacts down to `target_max_values` first if the summary is above
    /// the target or still has an unsorted point tail, then deduplicates,
    /// so the emitted form always satisfies the serialized invariants.
    pub fn serialize(&mut self) -> Result<SerializedRanges> {
        if self.len() > self.target_max_values || self.nsorted != self.nvalues {
            self.compact_to(self.target_max_values);
        }
        self.dedupe_points();

        debug_assert!(self.len() <= self.target_max_values);
        debug_assert_eq!(self.nsorted, self.nvalues);

        let body_len: usize = self.values.iter().map(|v| v.encoded_size()).sum();
        let total_len = HEADER_LEN + body_len;
        verify_arg!(total_len, u32::try_from(total_len).is_ok());

        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(&(total_len as u32).to_le_bytes());
        out.extend_from_slice(&T::TYPE_TAG.to_le_bytes());
        out.extend_from_slice(&(self.nranges as u32).to_le_bytes());
        out.extend_from_slice(&(self.nvalues as u32).to_le_bytes());
        out.extend_from_slice(&(self.target_max_values as u32).to_le_bytes());

        for value in &self.values {
            value.encode(&mut out)?;
        }

        debug_assert_eq!(out.len(), total_len);
        Ok(SerializedRanges(out))
    }

    /// Reconstructs a summary from its on-disk blob.
    ///
    /// The caller supplies the working cap for the rebuilt summary (it may
    /// plan to insert more values); the cap recorded in the header becomes
    /// the new target. `max_values` must be at least the header cap.
    ///
    /// A corrupted blob (wrong type tag, inconsistent counts, truncated or
    /// trailing payload, unordered values) yields a `Decode` error; callers
    /// typically treat such a summary as matching everything.
    pub fn deserialize(serialized: &SerializedRanges, max_values: usize) -> Result<Ranges<T>> {
        let bytes = serialized.as_bytes();
        let mut reader = Cursor::new(bytes);

        let total_len = read_header_field(&mut reader)? as usize;
        verify_data!(total_len, total_len == bytes.len());

        let type_tag = read_header_field(&mut reader)?;
        if type_tag != T::TYPE_TAG {
            return Err(Error::type_mismatch(
                format!("type tag {}", T::TYPE_TAG),
                format!("type tag {type_tag}"),
            ));
        }

        let nranges = read_header_field(&mut reader)? as usize;
        let nvalues = read_header_field(&mut reader)? as usize;
        let target_max_values = read_header_field(&mut reader)? as usize;

        let len = 2 * nranges + nvalues;
        verify_data!(serialized_ranges, target_max_values >= 2);
        verify_data!(serialized_ranges, len <= target_max_values);
        verify_arg!(max_values, max_values >= target_max_values);

        let mut ranges = Ranges::with_buffer(target_max_values, max_values)?;
        ranges.values.reserve_exact(len);
        for _ in 0..len {
            ranges.values.push(T::decode(&mut reader)?);
        }
        verify_data!(serialized_ranges, reader.position() as usize == bytes.len());

        ranges.nranges = nranges;
        ranges.nvalues = nvalues;
        ranges.nsorted = nvalues;

        validate_order(&ranges)?;
        Ok(ranges)
    }
}

fn read_header_field(reader: &mut Cursor<&[u8]>) -> Result<u32> {
    reader
        .read_u32::<LE>()
        .map_err(|e| Error::decode("serialized_ranges", e.to_string()))
}

/// Structural validation of a decoded summary: interval ordering and point
/// ordering. Rejecting these here means a corrupted blob cannot put the
/// binary searches into an inconsistent state later.
fn validate_order<T: SummaryValue>(ranges: &Ranges<T>) -> Result<()> {
    for i in 0..ranges.nranges {
        let (lo, hi) = ranges.interval(i);
        verify_data!(serialized_ranges, lo.lt_value(hi));
        if i > 0 {
            let (_, prev_hi) = ranges.interval(i - 1);
            verify_data!(serialized_ranges, prev_hi.lt_value(lo));
        }
    }
    for pair in ranges.points().windows(2) {
        verify_data!(serialized_ranges, pair[0].lt_value(&pair[1]));
    }
    Ok(())
}
