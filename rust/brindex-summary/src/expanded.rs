//! Scratch representation used during compaction and union.
//!
//! Intervals and points are expanded into uniform `(min, max, collapsed)`
//! triples so a single code path can sort, merge and reduce them. Nothing in
//! this module is persisted; the expansion lives only for the duration of one
//! compaction or union.

use std::cmp::Ordering;

use crate::value::SummaryValue;

/// One interval (or point) in expanded form. `collapsed` means
/// `min == max`, i.e. the entry stands for a single value.
#[derive(Debug, Clone)]
pub(crate) struct ExpandedRange<T> {
    pub min: T,
    pub max: T,
    pub collapsed: bool,
}

impl<T: SummaryValue> ExpandedRange<T> {
    #[inline]
    pub fn point(value: T) -> ExpandedRange<T> {
        ExpandedRange {
            min: value.clone(),
            max: value,
            collapsed: true,
        }
    }

    #[inline]
    pub fn interval(min: T, max: T) -> ExpandedRange<T> {
        debug_assert!(min.lt_value(&max));
        ExpandedRange {
            min,
            max,
            collapsed: false,
        }
    }

    /// Orders by `(min, max)`. Entries within one summary never overlap, but
    /// a union concatenates two summaries whose entries may, so the max is
    /// part of the key as well.
    fn compare(&self, other: &ExpandedRange<T>) -> Ordering {
        self.min
            .compare(&other.min)
            .then_with(|| self.max.compare(&other.max))
    }
}

/// Gap index plus its measured length; used to choose merge victims.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DistanceEntry {
    pub index: usize,
    pub value: f64,
}

/// Sorts the expanded ranges by `(min, max)` and drops exact duplicates.
pub(crate) fn sort_and_dedupe<T: SummaryValue>(eranges: &mut Vec<ExpandedRange<T>>) {
    eranges.sort_by(|a, b| a.compare(b));
    eranges.dedup_by(|a, b| a.compare(b) == Ordering::Equal);
}

/// Merges overlapping neighbors in a sorted expansion. A single
/// left-to-right scan suffices because the entries are ordered by `min`:
/// once `max < next.min` holds, no later entry can reach back.
pub(crate) fn merge_overlapping<T: SummaryValue>(eranges: &mut Vec<ExpandedRange<T>>) {
    let mut idx = 0;
    while idx + 1 < eranges.len() {
        if eranges[idx].max.lt_value(&eranges[idx + 1].min) {
            idx += 1;
            continue;
        }

        // The neighbor either extends this entry or is contained in it.
        let next = eranges.remove(idx + 1);
        if eranges[idx].max.lt_value(&next.max) {
            eranges[idx].max = next.max;
        }
        eranges[idx].collapsed = false;
    }
}

/// Measures the gap between each pair of consecutive ranges and returns the
/// entries sorted by distance descending (longest gaps first). Ties keep
/// ascending index order. The distance function may be expensive, so each
/// gap is measured exactly once.
pub(crate) fn build_distances<T: SummaryValue>(eranges: &[ExpandedRange<T>]) -> Vec<DistanceEntry> {
    if eranges.len() < 2 {
        return Vec::new();
    }

    let mut distances = Vec::with_capacity(eranges.len() - 1);
    for (index, pair) in eranges.windows(2).enumerate() {
        distances.push(DistanceEntry {
            index,
            value: T::distance(&pair[0].max, &pair[1].min),
        });
    }

    // Stable sort, so equal distances stay in ascending index order.
    distances.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    distances
}

/// Reduces the expansion until it fits into `max_values` boundary values.
///
/// Keeps the overall min and max plus the boundaries of the
/// `max_values / 2 - 1` longest gaps; everything between two kept
/// boundaries is merged into one interval. The boundary values are then
/// re-sorted and paired up; a pair of equal values becomes a collapsed
/// entry. If the expansion already fits, it is returned unchanged.
pub(crate) fn reduce<T: SummaryValue>(
    mut eranges: Vec<ExpandedRange<T>>,
    distances: &[DistanceEntry],
    max_values: usize,
) -> Vec<ExpandedRange<T>> {
    debug_assert!(max_values >= 2);
    debug_assert_eq!(distances.len() + 1, eranges.len().max(1));

    // Number of gaps that stay as boundaries between intervals.
    let keep = max_values / 2 - 1;
    if keep >= distances.len() {
        return eranges;
    }

    let mut boundaries = Vec::with_capacity(2 * (keep + 1));
    boundaries.push(eranges[0].min.clone());
    boundaries.push(eranges[eranges.len() - 1].max.clone());

    // The longest `keep` gaps survive; add the values on both sides of each.
    for entry in &distances[..keep] {
        boundaries.push(eranges[entry.index].max.clone());
        boundaries.push(eranges[entry.index + 1].min.clone());
    }

    debug_assert!(boundaries.len() <= max_values);
    debug_assert_eq!(boundaries.len() % 2, 0);

    boundaries.sort_by(|a, b| a.compare(b));

    eranges.clear();
    let mut iter = boundaries.into_iter();
    while let (Some(min), Some(max)) = (iter.next(), iter.next()) {
        let collapsed = min.eq_value(&max);
        eranges.push(ExpandedRange { min, max, collapsed });
    }
    eranges
}

/// Counts the boundary values needed to store the expansion: one per
/// collapsed entry, two per interval.
pub(crate) fn count_values<T>(eranges: &[ExpandedRange<T>]) -> usize {
    eranges
        .iter()
        .map(|er| if er.collapsed { 1 } else { 2 })
        .sum()
}
