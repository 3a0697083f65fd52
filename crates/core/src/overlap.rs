use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A half-open time-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Touching endpoints do not count as an overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        other.start < self.end && self.start < other.end
    }
}

/// Returns true when `candidate` overlaps any of the `existing` ranges.
pub fn has_overlap<I>(candidate: TimeRange, existing: I) -> bool
where
    I: IntoIterator<Item = TimeRange>,
{
    first_overlap(candidate, existing).is_some()
}

/// Returns the first of the `existing` ranges that overlaps `candidate`.
pub fn first_overlap<I>(candidate: TimeRange, existing: I) -> Option<TimeRange>
where
    I: IntoIterator<Item = TimeRange>,
{
    existing.into_iter().find(|range| candidate.overlaps(range))
}
