//! Value-level operations needed by the summary: total order, gap distance,
//! and the on-disk codec.
//!
//! Each supported element type implements [`SummaryValue`]. The summary never
//! interprets values beyond what this trait exposes, so adding a type is a
//! matter of providing a consistent order, a distance measure, and a codec.

use std::cmp::Ordering;
use std::io::{Read, Write};

use byteorder::{LE, ReadBytesExt, WriteBytesExt};

use brindex_common::{Error, Result};

/// A value that can be summarized: totally ordered, measurable, serializable.
///
/// Requirements:
///
/// - `compare` is a total order consistent with equality.
/// - `distance(lo, hi)` with `lo <= hi` is non-negative, zero for equal
///   values, and does not decrease when the interval widens. It may be
///   approximate (a bad estimate merges a slightly less optimal pair of
///   intervals, never produces wrong query results). `f64::INFINITY` means
///   "prefer never to merge across this gap".
/// - `encode`/`decode` round-trip exactly; `encoded_size` matches what
///   `encode` writes. Multi-byte quantities are little-endian.
pub trait SummaryValue: Clone + std::fmt::Debug {
    /// Identifies the element type in the serialized header. Mixing tags is
    /// detected and rejected on deserialization.
    const TYPE_TAG: u32;

    fn compare(&self, other: &Self) -> Ordering;

    /// Length of the gap between two ordered values, as a float.
    fn distance(lo: &Self, hi: &Self) -> f64;

    fn encoded_size(&self) -> usize;

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()>;

    fn decode<R: Read>(reader: &mut R) -> Result<Self>;

    #[inline]
    fn eq_value(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }

    #[inline]
    fn lt_value(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }

    #[inline]
    fn le_value(&self, other: &Self) -> bool {
        self.compare(other) != Ordering::Greater
    }

    #[inline]
    fn gt_value(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }

    #[inline]
    fn ge_value(&self, other: &Self) -> bool {
        self.compare(other) != Ordering::Less
    }
}

#[cold]
fn codec_error(element: &str, err: std::io::Error) -> Error {
    Error::decode(element, err.to_string())
}

macro_rules! integer_summary_value {
    ($ty:ty, $tag:expr, $read:ident, $write:ident) => {
        impl SummaryValue for $ty {
            const TYPE_TAG: u32 = $tag;

            #[inline]
            fn compare(&self, other: &Self) -> Ordering {
                Ord::cmp(self, other)
            }

            #[inline]
            fn distance(lo: &Self, hi: &Self) -> f64 {
                debug_assert!(lo <= hi);
                (*hi as f64) - (*lo as f64)
            }

            #[inline]
            fn encoded_size(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
                writer
                    .$write::<LE>(*self)
                    .map_err(|e| codec_error(stringify!($ty), e))
            }

            fn decode<R: Read>(reader: &mut R) -> Result<Self> {
                reader
                    .$read::<LE>()
                    .map_err(|e| codec_error(stringify!($ty), e))
            }
        }
    };
}

integer_summary_value!(i16, 1, read_i16, write_i16);
integer_summary_value!(i32, 2, read_i32, write_i32);
integer_summary_value!(i64, 3, read_i64, write_i64);
integer_summary_value!(u32, 4, read_u32, write_u32);
integer_summary_value!(u64, 5, read_u64, write_u64);

macro_rules! float_summary_value {
    ($ty:ty, $tag:expr, $read:ident, $write:ident) => {
        impl SummaryValue for $ty {
            const TYPE_TAG: u32 = $tag;

            /// Total order with all NaN values collated after the finite
            /// values (and equal to each other). Negative and positive zero
            /// compare equal.
            fn compare(&self, other: &Self) -> Ordering {
                match self.partial_cmp(other) {
                    Some(ord) => ord,
                    None => {
                        if self.is_nan() && other.is_nan() {
                            Ordering::Equal
                        } else if self.is_nan() {
                            Ordering::Greater
                        } else {
                            Ordering::Less
                        }
                    }
                }
            }

            /// Two NaN boundaries are considered the same point, while the
            /// gap between a NaN and a finite value is infinite. This makes
            /// the compactor merge NaN clumps together and never merge a NaN
            /// with a real value.
            fn distance(lo: &Self, hi: &Self) -> f64 {
                if lo.is_nan() && hi.is_nan() {
                    return 0.0;
                }
                if lo.is_nan() || hi.is_nan() {
                    return f64::INFINITY;
                }
                debug_assert!(lo <= hi);
                (*hi as f64) - (*lo as f64)
            }

            #[inline]
            fn encoded_size(&self) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
                writer
                    .$write::<LE>(*self)
                    .map_err(|e| codec_error(stringify!($ty), e))
            }

            fn decode<R: Read>(reader: &mut R) -> Result<Self> {
                reader
                    .$read::<LE>()
                    .map_err(|e| codec_error(stringify!($ty), e))
            }
        }
    };
}

float_summary_value!(f32, 6, read_f32, write_f32);
float_summary_value!(f64, 7, read_f64, write_f64);

/// Accumulates a base-256 positional delta over fixed-size byte arrays,
/// scanning from the least significant (last) byte to the most significant.
/// The result approximates the numeric difference normalized so that a
/// difference in the leading byte contributes at most `255/256`.
fn byte_array_delta(lo: &[u8], hi: &[u8]) -> f64 {
    debug_assert_eq!(lo.len(), hi.len());
    let mut delta = 0.0f64;
    for i in (0..lo.len()).rev() {
        delta += hi[i] as f64 - lo[i] as f64;
        delta /= 256.0;
    }
    debug_assert!(delta >= 0.0);
    delta
}

/// A 16-byte opaque identifier (UUID-style), ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid16(pub [u8; 16]);

impl SummaryValue for Uuid16 {
    const TYPE_TAG: u32 = 8;

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        Ord::cmp(&self.0, &other.0)
    }

    /// Approximates the 128-bit delta with a double; small inaccuracies only
    /// affect which intervals get merged, not correctness.
    fn distance(lo: &Self, hi: &Self) -> f64 {
        debug_assert!(lo.0 <= hi.0);
        byte_array_delta(&lo.0, &hi.0)
    }

    #[inline]
    fn encoded_size(&self) -> usize {
        16
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0).map_err(|e| codec_error("uuid", e))
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 16];
        reader
            .read_exact(&mut buf)
            .map_err(|e| codec_error("uuid", e))?;
        Ok(Uuid16(buf))
    }
}

/// A 6-byte hardware address, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddr6(pub [u8; 6]);

impl SummaryValue for MacAddr6 {
    const TYPE_TAG: u32 = 9;

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        Ord::cmp(&self.0, &other.0)
    }

    fn distance(lo: &Self, hi: &Self) -> f64 {
        debug_assert!(lo.0 <= hi.0);
        byte_array_delta(&lo.0, &hi.0)
    }

    #[inline]
    fn encoded_size(&self) -> usize {
        6
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_all(&self.0)
            .map_err(|e| codec_error("macaddr", e))
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 6];
        reader
            .read_exact(&mut buf)
            .map_err(|e| codec_error("macaddr", e))?;
        Ok(MacAddr6(buf))
    }
}

/// An owned, variable-length byte string, ordered lexicographically and
/// stored with a `u32` length prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    /// Interprets the first eight bytes as a base-256 fraction in `[0, 1)`.
    /// Truncation makes the distance approximate, which is acceptable: two
    /// strings sharing an 8-byte prefix are "close" for merging purposes.
    fn prefix_fraction(&self) -> f64 {
        let mut value = 0.0f64;
        let mut scale = 1.0f64 / 256.0;
        for i in 0..8 {
            let byte = self.0.get(i).copied().unwrap_or(0);
            value += byte as f64 * scale;
            scale /= 256.0;
        }
        value
    }
}

impl SummaryValue for ByteString {
    const TYPE_TAG: u32 = 10;

    #[inline]
    fn compare(&self, other: &Self) -> Ordering {
        Ord::cmp(&self.0, &other.0)
    }

    fn distance(lo: &Self, hi: &Self) -> f64 {
        debug_assert!(lo.0 <= hi.0);
        (hi.prefix_fraction() - lo.prefix_fraction()).max(0.0)
    }

    #[inline]
    fn encoded_size(&self) -> usize {
        4 + self.0.len()
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let len = u32::try_from(self.0.len())
            .map_err(|_| Error::overflow("bytestring", "length exceeds u32"))?;
        writer
            .write_u32::<LE>(len)
            .and_then(|_| writer.write_all(&self.0))
            .map_err(|e| codec_error("bytestring", e))
    }

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let len = reader
            .read_u32::<LE>()
            .map_err(|e| codec_error("bytestring", e))? as usize;
        let mut buf = vec![0u8; len];
        reader
            .read_exact(&mut buf)
            .map_err(|e| codec_error("bytestring", e))?;
        Ok(ByteString(buf))
    }
}
