//! Weekly recurring availability and its projection onto concrete dates.
//!
//! A [`WeeklyConstraintTable`] holds, for each day of the week (Monday first),
//! the wall-clock windows in which an attendee is willing to meet. Projection
//! walks the calendar dates of a search range and turns those windows into
//! dated [`TimeInterval`]s, clipped to the range.
//!
//! A day with no windows declares no working hours. It contributes nothing to
//! the projected windows and is reported separately as an *open day*, on which
//! the free-slot extractor applies no constraint at all.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dst::{resolve_local, DstPolicy};
use crate::error::{Result, ScheduleError};
use crate::interval::{merge_overlapping, normalize, TimeInterval};

/// A time-of-day window with minute precision.
///
/// An `end` of `00:00` means midnight at the end of the day, so `00:00–00:00`
/// is the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow", into = "RawWindow")]
pub struct WallClockWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Serialize, Deserialize)]
struct RawWindow {
    start: String,
    end: String,
}

impl TryFrom<RawWindow> for WallClockWindow {
    type Error = ScheduleError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        WallClockWindow::parse(&raw.start, &raw.end)
    }
}

impl From<WallClockWindow> for RawWindow {
    fn from(w: WallClockWindow) -> Self {
        RawWindow {
            start: w.start.format("%H:%M").to_string(),
            end: w.end.format("%H:%M").to_string(),
        }
    }
}

impl WallClockWindow {
    /// Build a window. Seconds and below are discarded.
    ///
    /// # Errors
    /// Returns `ScheduleError::MalformedWindow` if `start >= end` and `end` is
    /// not midnight.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        let (start, end) = (truncate_to_minute(start), truncate_to_minute(end));
        if end != NaiveTime::MIN && start >= end {
            return Err(ScheduleError::MalformedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse `"HH:MM"` or `"HH:MM:SS"` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn runs_to_midnight(&self) -> bool {
        self.end == NaiveTime::MIN
    }
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidTimeOfDay(s.to_string()))
}

/// Per-weekday availability windows. Index 0 is Monday.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyConstraintTable {
    days: [Vec<WallClockWindow>; 7],
    /// Zone the wall-clock windows are read in. When absent, the UTC offset
    /// of the search range's start is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timezone: Option<Tz>,
    #[serde(default)]
    dst_policy: DstPolicy,
}

impl WeeklyConstraintTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same windows on Monday through Friday, nothing at the weekend.
    pub fn weekdays(window: WallClockWindow) -> Self {
        let mut table = Self::new();
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            table = table.with_window(day, window);
        }
        table
    }

    pub fn with_window(mut self, day: Weekday, window: WallClockWindow) -> Self {
        self.days[day.num_days_from_monday() as usize].push(window);
        self
    }

    /// Read the windows in an IANA timezone (e.g. `"Europe/Paris"`).
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidTimezone` for an unknown zone name.
    pub fn with_timezone(mut self, timezone: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))?;
        self.timezone = Some(tz);
        Ok(self)
    }

    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    pub fn windows(&self, day: Weekday) -> &[WallClockWindow] {
        &self.days[day.num_days_from_monday() as usize]
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    pub fn dst_policy(&self) -> DstPolicy {
        self.dst_policy
    }

    /// True when no day declares any window.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// Result of projecting a weekly table over a search range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstraintProjection {
    /// Dated availability windows from declared days, sorted. Overlapping
    /// windows are merged; windows that only touch are kept apart.
    pub windows: Vec<TimeInterval>,
    /// The parts of the range that fall on days with no declared windows.
    pub open_days: Vec<TimeInterval>,
}

impl ConstraintProjection {
    /// Everything the attendee may be scheduled in: declared windows plus
    /// undeclared days. Consecutive open days join up; a declared window
    /// stays separate from anything it only touches.
    pub fn allowed(&self) -> Vec<TimeInterval> {
        let mut all = self.windows.clone();
        all.extend(normalize(&self.open_days));
        merge_overlapping(&all)
    }
}

/// Project a weekly table onto the dates of `range`, returning only the
/// windows of declared days.
pub fn project(table: &WeeklyConstraintTable, range: &TimeInterval) -> Vec<TimeInterval> {
    project_availability(table, range).windows
}

/// Project a weekly table onto the dates of `range`.
///
/// Dates are walked from the calendar date of `range.start()` to that of
/// `range.end()` inclusive, taken in the table's zone. Every window is clipped
/// to the range; pieces that clip to nothing are dropped.
pub fn project_availability(
    table: &WeeklyConstraintTable,
    range: &TimeInterval,
) -> ConstraintProjection {
    match table.timezone {
        Some(tz) => project_in(table, range, &tz),
        None => project_in(table, range, range.start().offset()),
    }
}

fn project_in<Z: TimeZone>(
    table: &WeeklyConstraintTable,
    range: &TimeInterval,
    zone: &Z,
) -> ConstraintProjection {
    let first = range.start().with_timezone(zone).date_naive();
    let last = range.end().with_timezone(zone).date_naive();

    let mut windows = Vec::new();
    let mut open_days = Vec::new();

    for date in first.iter_days().take_while(|d| *d <= last) {
        let entries = table.windows(date.weekday());
        if entries.is_empty() {
            // Day boundaries always shift past a gap; skipping would lose the day.
            let whole_day =
                WallClockWindow { start: NaiveTime::MIN, end: NaiveTime::MIN };
            if let Some(day) = dated(zone, date, &whole_day, DstPolicy::ShiftForward) {
                open_days.extend(day.clip(range));
            }
            continue;
        }

        for window in entries {
            match dated(zone, date, window, table.dst_policy) {
                Some(iv) => windows.extend(iv.clip(range)),
                None => trace!(%date, ?window, "window skipped by DST policy"),
            }
        }
    }

    ConstraintProjection {
        windows: merge_overlapping(&windows),
        open_days,
    }
}

/// Place a wall-clock window on a calendar date in `zone`.
fn dated<Z: TimeZone>(
    zone: &Z,
    date: NaiveDate,
    window: &WallClockWindow,
    policy: DstPolicy,
) -> Option<TimeInterval> {
    let start = resolve_local(zone, date.and_time(window.start), policy)?;
    let end_local = if window.runs_to_midnight() {
        date.succ_opt()?.and_time(NaiveTime::MIN)
    } else {
        date.and_time(window.end)
    };
    let end = resolve_local(zone, end_local, policy)?;
    TimeInterval::new(start, end).ok()
}
