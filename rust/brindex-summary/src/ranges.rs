//! The in-memory multi-interval summary.
//!
//! A [`Ranges`] value approximates the set of values observed in one block
//! range as a list of disjoint intervals plus a list of single points, all
//! over a bounded number of boundary values. Under skewed data a single
//! `[min, max]` interval degenerates (one outlier widens it by orders of
//! magnitude); keeping several intervals preserves pruning power, because
//! queries hitting the gaps between intervals can still be eliminated.
//!
//! Boundary values live in one `values` vector, intervals first, points
//! after:
//!
//! ```text
//! +--------------------------+----------------------------------+
//! | intervals (2*nranges of) | single point values (nvalues of) |
//! +--------------------------+----------------------------------+
//! ```
//!
//! Intervals are sorted and disjoint. Points are appended cheaply at the
//! end; the first `nsorted` of them are sorted and deduplicated, the rest
//! is an unsorted tail that the next compaction folds in. The working
//! buffer (`max_values`) is deliberately larger than the serialized cap
//! (`target_max_values`) so compaction runs rarely and sees more values at
//! once, which produces better intervals.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use brindex_common::{Result, verify_arg};

use crate::expanded::{self, ExpandedRange};
use crate::value::SummaryValue;

/// Default cap on boundary values in the serialized summary.
pub const TARGET_DEFAULT: usize = 32;

/// Largest permissible serialized cap.
pub const TARGET_MAX: usize = 256;

/// Working buffer sizing: `target * BUFFER_FACTOR`, clamped to
/// `[BUFFER_MIN, BUFFER_MAX]` (but never below the target itself).
pub const BUFFER_FACTOR: usize = 10;
pub const BUFFER_MIN: usize = 256;
pub const BUFFER_MAX: usize = 8192;

/// When the working buffer fills up, compaction reduces it to this fraction
/// of the working cap. Somewhat arbitrary; low enough that compactions are
/// amortized, high enough not to throw away resolution.
const LOAD_FACTOR: f64 = 0.5;

/// Sorted-point lookups switch from linear scan to binary search at this
/// many points.
const POINT_BSEARCH_THRESHOLD: usize = 16;

/// Computes the working-buffer cap for a given serialized cap.
pub fn working_buffer_size(target_max_values: usize) -> usize {
    (target_max_values * BUFFER_FACTOR)
        .clamp(BUFFER_MIN, BUFFER_MAX)
        .max(target_max_values)
}

/// A multi-interval summary of the values observed in one block range.
pub struct Ranges<T> {
    /// Interval boundaries (`2 * nranges`), then points (`nvalues`).
    pub(crate) values: Vec<T>,
    /// Number of non-collapsed intervals.
    pub(crate) nranges: usize,
    /// Prefix of the points that is sorted and deduplicated.
    pub(crate) nsorted: usize,
    /// Number of points.
    pub(crate) nvalues: usize,
    /// Cap on `2 * nranges + nvalues` for the working buffer.
    pub(crate) max_values: usize,
    /// Cap the serialized form must honor; `<= max_values`.
    pub(crate) target_max_values: usize,
}

impl<T: SummaryValue> Ranges<T> {
    /// Creates an empty summary with the given serialized cap and a working
    /// buffer sized by [`working_buffer_size`].
    pub fn new(target_max_values: usize) -> Result<Ranges<T>> {
        Ranges::with_buffer(target_max_values, working_buffer_size(target_max_values))
    }

    /// Creates an empty summary with explicit caps.
    pub fn with_buffer(target_max_values: usize, max_values: usize) -> Result<Ranges<T>> {
        verify_arg!(target_max_values, target_max_values >= 2);
        verify_arg!(target_max_values, target_max_values <= TARGET_MAX);
        verify_arg!(max_values, max_values >= target_max_values);
        // A full buffer must be reducible below its cap; a 2-value buffer
        // compacts to a single interval and still has no room left.
        verify_arg!(max_values, max_values >= 3);
        Ok(Ranges {
            values: Vec::new(),
            nranges: 0,
            nsorted: 0,
            nvalues: 0,
            max_values,
            target_max_values,
        })
    }

    /// Number of boundary values currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        2 * self.nranges + self.nvalues
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn interval_count(&self) -> usize {
        self.nranges
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.nvalues
    }

    #[inline]
    pub fn target_max_values(&self) -> usize {
        self.target_max_values
    }

    #[inline]
    pub fn max_values(&self) -> usize {
        self.max_values
    }

    /// The `i`-th interval as `(lo, hi)` references.
    #[inline]
    pub fn interval(&self, i: usize) -> (&T, &T) {
        (&self.values[2 * i], &self.values[2 * i + 1])
    }

    /// All points, sorted prefix first, then the unsorted tail.
    #[inline]
    pub fn points(&self) -> &[T] {
        &self.values[2 * self.nranges..]
    }

    #[inline]
    fn sorted_points(&self) -> &[T] {
        &self.values[2 * self.nranges..2 * self.nranges + self.nsorted]
    }

    /// Adds a value to the summary. Returns `true` iff the summary was
    /// modified, which covers both integrating the value and any compaction
    /// triggered to make room for it. Adding an already-covered value
    /// returns `false` (unless the attempt itself forced a compaction).
    pub fn add_value(&mut self, value: &T) -> bool {
        debug_assert!(self.check_invariants());

        // Free space first. This must happen before the containment check:
        // the value might sit in the unsorted tail, which the containment
        // check below deliberately skips. Deduplication moves such a value
        // into the sorted prefix, so the check sees it and we do not insert
        // a duplicate next to intervals or sorted points.
        let modified = self.ensure_free_space();

        if self.contains(value, false) {
            return modified;
        }

        self.values.push(value.clone());
        self.nvalues += 1;
        if self.nvalues == 1 {
            // A single point is trivially sorted.
            self.nsorted = 1;
        }

        debug_assert!(self.check_invariants());
        debug_assert!(self.contains(value, true));
        true
    }

    /// Checks whether a value is covered by an interval or stored as a
    /// point. With `full = false` the unsorted tail is not searched, which
    /// may produce a false negative for values added since the last
    /// compaction; serialized summaries have no unsorted tail, so queries
    /// are not affected.
    pub fn contains(&self, value: &T, full: bool) -> bool {
        if self.has_matching_interval(value) {
            return true;
        }

        let sorted = self.sorted_points();
        let found = if sorted.len() >= POINT_BSEARCH_THRESHOLD {
            sorted.binary_search_by(|p| p.compare(value)).is_ok()
        } else {
            sorted.iter().any(|p| p.eq_value(value))
        };
        if found {
            return true;
        }

        if full {
            let tail = &self.points()[self.nsorted..];
            return tail.iter().any(|p| p.eq_value(value));
        }
        false
    }

    /// Binary search over the intervals, preceded by a cheap check against
    /// the global min and max (first and last boundary value).
    fn has_matching_interval(&self, value: &T) -> bool {
        if self.nranges == 0 {
            return false;
        }

        if value.lt_value(&self.values[0]) || value.gt_value(&self.values[2 * self.nranges - 1]) {
            return false;
        }

        let mut start = 0;
        let mut end = self.nranges;
        while start < end {
            let mid = (start + end) / 2;
            let (lo, hi) = self.interval(mid);
            if value.lt_value(lo) {
                end = mid;
            } else if value.gt_value(hi) {
                start = mid + 1;
            } else {
                return true;
            }
        }
        false
    }

    /// Sorts the unsorted point tail into the sorted prefix and drops
    /// duplicates. Does not touch the intervals; this is the cheap way of
    /// reclaiming space, with no distance computations involved. Points are
    /// already known to be distinct from the intervals and from the sorted
    /// prefix, because `add_value` checks that before appending.
    pub(crate) fn dedupe_points(&mut self) {
        if self.nsorted == self.nvalues {
            return;
        }

        let mut points = self.values.split_off(2 * self.nranges);
        points.sort_by(|a, b| a.compare(b));
        let mut points = points
            .into_iter()
            .dedup_by(|a, b| a.compare(b) == Ordering::Equal)
            .collect::<Vec<_>>();

        self.nvalues = points.len();
        self.nsorted = points.len();
        self.values.append(&mut points);

        debug_assert!(self.check_invariants());
    }

    /// Makes room for at least one more value. Tries deduplication first;
    /// only if that does not free enough space does it run the
    /// distance-based reduction down to `max_values * LOAD_FACTOR`.
    /// Returns `true` if the summary was modified.
    fn ensure_free_space(&mut self) -> bool {
        if self.len() < self.max_values {
            return false;
        }

        self.dedupe_points();

        // Not comparing against max_values here: deduplication might have
        // freed a single slot, and then we would dedupe on almost every
        // insert. Compact unless we got comfortably below the load factor.
        let threshold = ((self.max_values as f64 * LOAD_FACTOR) as usize)
            .max(2)
            .min(self.max_values - 1);
        if self.len() <= threshold {
            return true;
        }

        self.compact_to(threshold);
        true
    }

    /// Reduces the summary to at most `max_values` boundary values by
    /// merging the intervals separated by the shortest gaps. Also folds the
    /// unsorted point tail in, so afterwards `nsorted == nvalues`.
    pub(crate) fn compact_to(&mut self, max_values: usize) {
        debug_assert!(max_values >= 2);

        let mut eranges = self.expand();
        expanded::sort_and_dedupe(&mut eranges);
        let distances = expanded::build_distances(&eranges);
        let eranges = expanded::reduce(eranges, &distances, max_values);

        debug_assert!(expanded::count_values(&eranges) <= max_values);
        self.store_expanded(eranges);
        debug_assert!(self.check_invariants());
    }

    /// Combines another summary into this one. Every value covered by
    /// either input is still covered by the result; if the combined
    /// expansion does not fit this summary's working cap, the usual
    /// distance-greedy reduction applies (no load factor, as a union is not
    /// expected to receive further insertions). The other summary is left
    /// untouched, and this summary's caps win.
    pub fn union_with(&mut self, other: &Ranges<T>) {
        debug_assert!(self.check_invariants());
        debug_assert!(other.check_invariants());

        let mut eranges = self.expand();
        eranges.extend(other.expand());

        expanded::sort_and_dedupe(&mut eranges);

        // Entries coming from two summaries may overlap; fix that before
        // measuring gaps.
        expanded::merge_overlapping(&mut eranges);

        let distances = expanded::build_distances(&eranges);
        let eranges = expanded::reduce(eranges, &distances, self.max_values);

        self.store_expanded(eranges);
        debug_assert!(self.check_invariants());
    }

    /// Expands intervals and points into uniform scratch triples. The
    /// interval part is sorted; the point part may not be.
    pub(crate) fn expand(&self) -> Vec<ExpandedRange<T>> {
        let mut eranges = Vec::with_capacity(self.nranges + self.nvalues);
        for i in 0..self.nranges {
            let (lo, hi) = self.interval(i);
            eranges.push(ExpandedRange::interval(lo.clone(), hi.clone()));
        }
        for point in self.points() {
            eranges.push(ExpandedRange::point(point.clone()));
        }
        eranges
    }

    /// Rewrites `values` from an expansion: non-collapsed intervals first
    /// (ascending), then collapsed entries as points (also ascending, so
    /// the whole point list counts as sorted).
    pub(crate) fn store_expanded(&mut self, eranges: Vec<ExpandedRange<T>>) {
        let mut values = Vec::with_capacity(expanded::count_values(&eranges));

        self.nranges = 0;
        for er in eranges.iter().filter(|er| !er.collapsed) {
            values.push(er.min.clone());
            values.push(er.max.clone());
            self.nranges += 1;
        }

        self.nvalues = 0;
        for er in eranges.into_iter().filter(|er| er.collapsed) {
            values.push(er.min);
            self.nvalues += 1;
        }
        self.nsorted = self.nvalues;

        self.values = values;
        debug_assert!(self.len() <= self.max_values);
    }

    /// Structural invariants; meant for `debug_assert!`. Returns `true` so
    /// it can be used inside the assertion and compiled out in release.
    pub(crate) fn check_invariants(&self) -> bool {
        assert!(self.target_max_values <= self.max_values);
        assert!(self.len() <= self.max_values);
        assert!(self.nsorted <= self.nvalues);
        assert_eq!(self.values.len(), self.len());

        // Intervals: lo < hi, disjoint, ascending.
        for i in 0..self.nranges {
            let (lo, hi) = self.interval(i);
            assert!(lo.lt_value(hi));
            if i > 0 {
                let (_, prev_hi) = self.interval(i - 1);
                assert!(prev_hi.lt_value(lo));
            }
        }

        // Sorted point prefix: strictly ascending.
        let sorted = self.sorted_points();
        for pair in sorted.windows(2) {
            assert!(pair[0].lt_value(&pair[1]));
        }

        // No sorted point may fall into (or touch) an interval.
        for point in sorted {
            assert!(!self.has_matching_interval(point));
        }

        true
    }
}

impl<T: SummaryValue> fmt::Debug for Ranges<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ranges({}/{} values, target {})",
            self.len(),
            self.max_values,
            self.target_max_values
        )?;
        f.write_str(" {")?;
        for i in 0..self.nranges {
            let (lo, hi) = self.interval(i);
            write!(f, " [{lo:?}, {hi:?}]")?;
        }
        for (i, point) in self.points().iter().enumerate() {
            let marker = if i < self.nsorted { "" } else { "?" }; // "?" = unsorted tail
            write!(f, " {point:?}{marker}")?;
        }
        f.write_str(" }")
    }
}
