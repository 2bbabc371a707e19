//! Multi-interval summaries for block-range indexes.
//!
//! A block-range index stores, per group of storage pages, a compact
//! summary of the values seen in that group and uses it to skip page
//! ranges during scans. The classic summary is a single `[min, max]`
//! interval, which a single outlier can render useless. This crate keeps
//! a bounded set of disjoint intervals and single points instead, merging
//! the closest intervals (by a type-specific distance) when the value
//! budget runs out.
//!
//! # Key types
//!
//! - [`Ranges`] - the in-memory summary: add values, test membership,
//!   union with another summary
//! - [`SerializedRanges`] - the immutable on-disk blob
//! - [`ScanKey`] / [`Strategy`] - comparison predicates for
//!   [`Ranges::consistent`]
//! - [`SummaryValue`] - the per-type contract (order, distance, codec)
//!
//! # Example
//!
//! ```
//! use brindex_summary::{Ranges, ScanKey, Strategy};
//!
//! let mut summary = Ranges::<i64>::new(32)?;
//! for value in [1, 2, 3, 1_000_000] {
//!     summary.add_value(&value);
//! }
//!
//! let blob = summary.serialize()?;
//! let summary = Ranges::<i64>::deserialize(&blob, 320)?;
//!
//! // The gap between 3 and 1_000_000 prunes this predicate.
//! assert!(!summary.consistent(&[ScanKey::new(Strategy::Equal, 500_000)], true));
//! assert!(summary.consistent(&[ScanKey::new(Strategy::Equal, 2)], true));
//! # Ok::<(), brindex_common::Error>(())
//! ```

pub mod consistent;
mod expanded;
pub mod ranges;
pub mod serialized;
pub mod value;

#[cfg(test)]
mod tests;

pub use consistent::{ScanKey, Strategy};
pub use ranges::Ranges;
pub use serialized::SerializedRanges;
pub use value::{ByteString, MacAddr6, SummaryValue, Uuid16};
