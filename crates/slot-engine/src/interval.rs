//! Half-open time intervals and the merge/intersect primitives every later
//! stage is built on.
//!
//! Timestamps keep the UTC offset they were created with. Ordering and
//! equality compare the underlying instants, so intervals from attendees in
//! different offsets combine correctly.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// A half-open `[start, end)` interval with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = ScheduleError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// Build an interval, rejecting zero-length and inverted bounds.
    ///
    /// # Errors
    /// Returns `ScheduleError::MalformedInterval` if `start >= end`.
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::MalformedInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from RFC 3339 strings.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidTimestamp` for an unparseable timestamp
    /// and `ScheduleError::MalformedInterval` for inverted bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map_err(|e| ScheduleError::InvalidTimestamp(format!("{s}: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Callers must guarantee `start < end`.
    pub(crate) fn spanning(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        debug_assert!(start < end, "spanning() called with {start} >= {end}");
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the intervals share a region of positive length.
    /// Intervals that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlapping region of two intervals, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeInterval { start, end })
    }

    /// The part of this interval inside `range`, or `None` if they do not overlap.
    pub fn clip(&self, range: &TimeInterval) -> Option<TimeInterval> {
        self.intersection(range)
    }

    /// Widen the interval by `buffer` on both sides, saturating at the
    /// bounds of the representable time range.
    pub fn padded(&self, buffer: Duration) -> TimeInterval {
        if buffer <= Duration::zero() {
            return *self;
        }
        TimeInterval {
            start: self
                .start
                .checked_sub_signed(buffer)
                .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.fixed_offset()),
            end: self
                .end
                .checked_add_signed(buffer)
                .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.fixed_offset()),
        }
    }
}

/// Free-function form of [`TimeInterval::intersection`].
pub fn intersect(a: &TimeInterval, b: &TimeInterval) -> Option<TimeInterval> {
    a.intersection(b)
}

/// Sort intervals by start (then end) and merge any that overlap or touch.
///
/// The input is left untouched; a normalized copy is returned.
pub fn normalize(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    merge_sorted(intervals, true)
}

/// Like [`normalize`], but intervals that only touch stay separate.
///
/// Used for declared availability, where `09:00-12:00` and `12:00-13:00` are
/// two windows and a meeting may not run across the boundary.
pub fn merge_overlapping(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    merge_sorted(intervals, false)
}

fn merge_sorted(intervals: &[TimeInterval], join_touching: bool) -> Vec<TimeInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        if let Some(last) = merged.last_mut() {
            if iv.start < last.end || (join_touching && iv.start == last.end) {
                last.end = last.end.max(iv.end);
                continue;
            }
        }
        merged.push(iv);
    }
    merged
}

/// Two-pointer intersection of two sorted, internally non-overlapping lists.
///
/// Keeps every pairwise overlap at least `min_length` long. After each step the
/// interval that ends first is advanced; both advance when they end together.
pub fn intersect_sorted(
    a: &[TimeInterval],
    b: &[TimeInterval],
    min_length: Duration,
) -> Vec<TimeInterval> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if let Some(overlap) = a[i].intersection(&b[j]) {
            if overlap.duration() >= min_length {
                out.push(overlap);
            }
        }
        match a[i].end.cmp(&b[j].end) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out
}
