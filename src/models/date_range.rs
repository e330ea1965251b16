use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Half-open calendar date interval `[start, end)`.
///
/// The end date is the checkout day and is not occupied, so a range ending on
/// a given day may be immediately followed by another range starting that same
/// day without the two overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First occupied date (check-in, inclusive)
    #[serde(rename = "start_date")]
    pub start: NaiveDate,
    /// Checkout date (exclusive)
    #[serde(rename = "end_date")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new range. Returns `None` unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Number of occupied nights.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Check if a date lies inside this range (inclusive start, exclusive end).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Check if this range overlaps with another.
    ///
    /// Two half-open ranges `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Iterate over the occupied dates, checkout date excluded.
    pub fn iter_dates(&self) -> DateIter {
        DateIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Iterator over the dates of a single range.
#[derive(Debug, Clone)]
pub struct DateIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let date = self.next?;
        if date >= self.end {
            return None;
        }
        self.next = date.succ_opt();
        Some(date)
    }
}

/// Lazy ascending iterator over every date covered by a set of ranges.
///
/// Dates are emitted in ascending order with duplicates removed, so a date
/// covered by two ranges appears once. The iterator is finite and can be
/// cloned to restart or replay the sequence.
#[derive(Debug, Clone)]
pub struct BlockedDates {
    ranges: Vec<DateRange>,
    idx: usize,
    floor: Option<NaiveDate>,
}

impl BlockedDates {
    /// Build the iterator from an arbitrary collection of ranges.
    pub fn new(mut ranges: Vec<DateRange>) -> Self {
        ranges.sort();
        Self {
            ranges,
            idx: 0,
            floor: None,
        }
    }
}

impl Iterator for BlockedDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while let Some(range) = self.ranges.get(self.idx).copied() {
            let candidate = match self.floor {
                Some(floor) if floor > range.start => floor,
                _ => range.start,
            };
            if candidate >= range.end {
                self.idx += 1;
                continue;
            }
            match candidate.succ_opt() {
                Some(next) => self.floor = Some(next),
                // Calendar overflow; nothing left to emit.
                None => self.idx = self.ranges.len(),
            }
            return Some(candidate);
        }
        None
    }
}
