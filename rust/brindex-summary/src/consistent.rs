//! Predicate evaluation against a summary.
//!
//! A consistency check answers "might any value in this block range satisfy
//! all of these comparison predicates?". It is allowed to answer yes for a
//! block range that on closer inspection matches nothing (the summary is
//! lossy), but it must never answer no for a range that does contain a
//! match.

use crate::ranges::Ranges;
use crate::value::SummaryValue;

/// Comparison operator of a scan predicate. The discriminants are the wire
/// strategy codes and are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Strategy {
    Less = 1,
    LessEqual = 2,
    Equal = 3,
    GreaterEqual = 4,
    Greater = 5,
    NotEqual = 6,
}

impl Strategy {
    pub fn from_code(code: u8) -> Option<Strategy> {
        match code {
            1 => Some(Strategy::Less),
            2 => Some(Strategy::LessEqual),
            3 => Some(Strategy::Equal),
            4 => Some(Strategy::GreaterEqual),
            5 => Some(Strategy::Greater),
            6 => Some(Strategy::NotEqual),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One scan predicate: `element <op> value`.
#[derive(Debug, Clone)]
pub struct ScanKey<T> {
    pub strategy: Strategy,
    pub value: T,
}

impl<T> ScanKey<T> {
    pub fn new(strategy: Strategy, value: T) -> ScanKey<T> {
        ScanKey { strategy, value }
    }
}

impl<T: SummaryValue> Ranges<T> {
    /// Returns `true` iff some value covered by this summary might satisfy
    /// every scan key. An empty key slice is trivially consistent (if the
    /// summary is non-empty).
    ///
    /// `leaf` selects the evaluation mode. A leaf summary describes a block
    /// range directly and uses exact boundary comparisons. A non-leaf
    /// summary aggregates lower-level summaries and is treated as a lower
    /// bound on the set it describes: strict comparisons are relaxed to
    /// non-strict at the boundaries, and `Equal` is only ever satisfied by
    /// an interval, never by a point (the caller re-checks at leaf level).
    pub fn consistent(&self, keys: &[ScanKey<T>], leaf: bool) -> bool {
        if self.is_empty() {
            return false;
        }

        for i in 0..self.interval_count() {
            let (lo, hi) = self.interval(i);
            if keys
                .iter()
                .all(|key| interval_matches(lo, hi, key, leaf))
            {
                return true;
            }
        }

        // Few points survive in a compacted summary, so a plain scan is
        // enough here.
        for point in self.points() {
            if keys.iter().all(|key| point_matches(point, key, leaf)) {
                return true;
            }
        }

        false
    }
}

/// Evaluates one key against an interval `[lo, hi]`. The interval matches
/// if at least one value inside it could satisfy the key.
fn interval_matches<T: SummaryValue>(lo: &T, hi: &T, key: &ScanKey<T>, leaf: bool) -> bool {
    let arg = &key.value;
    match key.strategy {
        // Some value below `arg` exists iff the interval starts below it.
        Strategy::Less => {
            if leaf {
                lo.lt_value(arg)
            } else {
                lo.le_value(arg)
            }
        }
        Strategy::LessEqual => lo.le_value(arg),
        Strategy::Equal => lo.le_value(arg) && arg.le_value(hi),
        Strategy::GreaterEqual => hi.ge_value(arg),
        Strategy::Greater => {
            if leaf {
                hi.gt_value(arg)
            } else {
                hi.ge_value(arg)
            }
        }
        // Only a collapsed interval pinned to `arg` rules this out, and
        // collapsed intervals are stored as points; a real interval always
        // contains a value differing from `arg`.
        Strategy::NotEqual => !(lo.eq_value(arg) && hi.eq_value(arg)),
    }
}

/// Evaluates one key against a single point value.
fn point_matches<T: SummaryValue>(point: &T, key: &ScanKey<T>, leaf: bool) -> bool {
    let arg = &key.value;
    match key.strategy {
        Strategy::Less => {
            if leaf {
                point.lt_value(arg)
            } else {
                point.le_value(arg)
            }
        }
        Strategy::LessEqual => point.le_value(arg),
        // In non-leaf mode a point is just a sample of the aggregated set;
        // equality has to be re-proven at leaf level.
        Strategy::Equal => leaf && point.eq_value(arg),
        Strategy::GreaterEqual => point.ge_value(arg),
        Strategy::Greater => {
            if leaf {
                point.gt_value(arg)
            } else {
                point.ge_value(arg)
            }
        }
        // A non-leaf point stands for an aggregated set that may well hold
        // other values, so inequality can never be ruled out there.
        Strategy::NotEqual => !leaf || !point.eq_value(arg),
    }
}
