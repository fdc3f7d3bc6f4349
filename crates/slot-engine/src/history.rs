//! History-weighted slot choice.
//!
//! A [`HistoryTable`] holds one score per half hour of the week, Monday
//! first. Higher scores mark times at which an attendee usually holds
//! meetings of the requested [`EventCategory`]. Tables are either built from
//! past events with [`HistoryTable::from_events`] or fall back to a built-in
//! baseline curve per category.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::intersect::StartRange;
use crate::interval::TimeInterval;

pub const SLOTS_PER_DAY: usize = 48;
const DAYS_PER_WEEK: usize = 7;

/// Work events gather next to existing busy time. Starts on a range edge
/// win unless an interior start scores this much better.
const WORK_CLUSTER_BIAS: f64 = 1.3;
const CANDIDATE_STEP_MINUTES: i64 = 15;

/// What kind of meeting is being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    #[default]
    Work,
    Leisure,
    Other,
}

/// Weekly half-hour scores: 7 rows (Monday to Sunday) of 48 finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct HistoryTable {
    weights: [[f64; SLOTS_PER_DAY]; DAYS_PER_WEEK],
}

impl HistoryTable {
    /// Build a table from rows of scores.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidHistory` unless there are exactly 7
    /// rows of 48 finite numbers.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != DAYS_PER_WEEK {
            return Err(ScheduleError::InvalidHistory(format!(
                "expected {DAYS_PER_WEEK} rows, got {}",
                rows.len()
            )));
        }
        let mut weights = [[0.0; SLOTS_PER_DAY]; DAYS_PER_WEEK];
        for (day, row) in rows.into_iter().enumerate() {
            if row.len() != SLOTS_PER_DAY {
                return Err(ScheduleError::InvalidHistory(format!(
                    "row {day} has {} values, expected {SLOTS_PER_DAY}",
                    row.len()
                )));
            }
            if let Some(slot) = row.iter().position(|v| !v.is_finite()) {
                return Err(ScheduleError::InvalidHistory(format!(
                    "row {day} slot {slot} is not a finite number"
                )));
            }
            weights[day].copy_from_slice(&row);
        }
        Ok(Self { weights })
    }

    /// The built-in curve for `category` when no history is known.
    pub fn baseline(category: EventCategory) -> Self {
        let (weekday, weekend): (fn(f64) -> f64, fn(f64) -> f64) = match category {
            EventCategory::Work => (work_weekday, work_weekend),
            EventCategory::Leisure => (leisure_weekday, leisure_weekend),
            EventCategory::Other => (other_day, other_day),
        };
        let mut weights = [[0.0; SLOTS_PER_DAY]; DAYS_PER_WEEK];
        for (day, row) in weights.iter_mut().enumerate() {
            let curve = if day < 5 { weekday } else { weekend };
            for (slot, value) in row.iter_mut().enumerate() {
                *value = curve(slot as f64);
            }
        }
        Self { weights }
    }

    /// Learn a table from past events, starting from the category baseline.
    ///
    /// Every half hour an event covers adds one when the event has the same
    /// category and subtracts one when it differs. Uncategorised events are
    /// ignored. Each event is read in its own UTC offset. The result is
    /// rescaled to `0.0..=1.0`.
    pub fn from_events(
        category: EventCategory,
        events: &[(TimeInterval, Option<EventCategory>)],
    ) -> Self {
        let mut table = Self::baseline(category);
        for (event, label) in events {
            let Some(label) = label else { continue };
            let delta = if *label == category { 1.0 } else { -1.0 };
            for_each_half_hour(event.start(), event.end(), |day, slot| {
                table.weights[day][slot] += delta;
            });
        }
        table.rescale();
        table
    }

    /// Sum several tables slot by slot. `None` when `tables` is empty.
    pub fn total<'a>(tables: impl IntoIterator<Item = &'a HistoryTable>) -> Option<Self> {
        let mut tables = tables.into_iter();
        let mut sum = tables.next()?.clone();
        for table in tables {
            for (row, other) in sum.weights.iter_mut().zip(&table.weights) {
                for (value, add) in row.iter_mut().zip(other) {
                    *value += add;
                }
            }
        }
        Some(sum)
    }

    pub fn weight(&self, day: Weekday, slot: usize) -> f64 {
        self.weights[day.num_days_from_monday() as usize][slot % SLOTS_PER_DAY]
    }

    /// Score of a meeting over `[begin, end)`: the sum of the half hours it
    /// touches, read in `begin`'s offset.
    pub fn slot_value(&self, begin: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> f64 {
        let mut value = 0.0;
        for_each_half_hour(begin, end, |day, slot| value += self.weights[day][slot]);
        value
    }

    fn rescale(&mut self) {
        let values = self.weights.iter().flatten();
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
        let spread = max - min;
        for value in self.weights.iter_mut().flatten() {
            *value = if spread > 0.0 { (*value - min) / spread } else { 0.0 };
        }
    }
}

impl TryFrom<Vec<Vec<f64>>> for HistoryTable {
    type Error = ScheduleError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<HistoryTable> for Vec<Vec<f64>> {
    fn from(table: HistoryTable) -> Self {
        table.weights.iter().map(|row| row.to_vec()).collect()
    }
}

/// Pick the start with the best history score.
///
/// Candidates are the edges of each range plus every 15 minutes inside it.
/// Scores shrink with the number of weeks between the candidate and the week
/// of `anchor`. An edge start wins unless an interior start beats it; for
/// work meetings the edge score is first scaled by 1.3.
pub fn choose_start(
    table: &HistoryTable,
    ranges: &[StartRange],
    duration: Duration,
    category: EventCategory,
    anchor: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let week_start = start_of_week(anchor);
    let step = Duration::minutes(CANDIDATE_STEP_MINUTES);
    let score = |start: DateTime<FixedOffset>, weight: f64| {
        table.slot_value(start, start + duration) * weight
    };

    let mut edge: Option<(f64, DateTime<FixedOffset>)> = None;
    let mut interior: Option<(f64, DateTime<FixedOffset>)> = None;
    for range in ranges {
        let weight = distance_weight((range.earliest - week_start).num_days().div_euclid(7));

        for start in [range.earliest, range.latest] {
            keep_best(&mut edge, score(start, weight), start);
        }
        let mut start = range.earliest + step;
        while start < range.latest {
            keep_best(&mut interior, score(start, weight), start);
            start += step;
        }
    }

    let bias = match category {
        EventCategory::Work => WORK_CLUSTER_BIAS,
        EventCategory::Leisure | EventCategory::Other => 1.0,
    };
    match (edge, interior) {
        (Some((edge_score, _)), Some((inner_score, inner))) if edge_score * bias < inner_score => {
            Some(inner)
        }
        (Some((_, edge)), _) => Some(edge),
        (None, _) => None,
    }
}

fn keep_best(
    best: &mut Option<(f64, DateTime<FixedOffset>)>,
    score: f64,
    start: DateTime<FixedOffset>,
) {
    if best.map_or(true, |(top, _)| score > top) {
        *best = Some((score, start));
    }
}

/// 1.0 for the anchor's own week, falling towards 0.7 further out.
fn distance_weight(weeks: i64) -> f64 {
    let w = weeks as f64;
    3.0 * (w + 2.0) / (20.0 * w * w + 20.0) + 0.7
}

/// Monday 00:00 of the week containing `at`, in `at`'s offset.
fn start_of_week(at: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let monday = at.date_naive() - Duration::days(i64::from(at.weekday().num_days_from_monday()));
    at.offset()
        .from_local_datetime(&monday.and_time(NaiveTime::MIN))
        .single()
        .unwrap_or(at)
}

fn for_each_half_hour(
    begin: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    mut visit: impl FnMut(usize, usize),
) {
    let step = Duration::minutes(30);
    let mut cursor = begin;
    while cursor < end {
        let day = cursor.weekday().num_days_from_monday() as usize;
        let slot = cursor.hour() as usize * 2 + usize::from(cursor.minute() >= 30);
        visit(day, slot);
        cursor += step;
    }
}

// Baseline curves, indexed by half hour of the day (0 = 00:00, 47 = 23:30).

fn work_weekday(i: f64) -> f64 {
    match i as usize {
        0..=8 => -5.0,
        9..=17 => -9.8 + 0.6 * i,
        18..=23 => 1.0,
        24..=27 => -2.0,
        28..=34 => 1.0,
        35..=42 => 0.0,
        _ => 35.0 - 5.0 / 6.0 * i,
    }
}

fn work_weekend(i: f64) -> f64 {
    match i as usize {
        0..=8 => -5.0,
        9..=20 => -5.0 - 8.0 / 3.0 + i / 3.0,
        21..=23 => -1.0,
        24..=27 => -2.0,
        28..=38 => -1.0,
        _ => 14.2 - 0.4 * i,
    }
}

fn leisure_weekday(i: f64) -> f64 {
    match i as usize {
        0..=8 => -5.0,
        9..=18 => -8.2 + 0.4 * i,
        19..=23 => -1.0,
        24..=27 => -2.0,
        28..=34 => -1.0,
        35..=36 => i - 35.0,
        37..=42 => 1.0,
        _ => 43.0 - i,
    }
}

fn leisure_weekend(i: f64) -> f64 {
    match i as usize {
        0..=8 => -5.0,
        9..=16 => -10.0 + 0.625 * i,
        17..=21 => 0.0,
        22..=23 => 1.0,
        24..=27 => -1.0,
        28..=40 => 1.0,
        _ => 31.0 - 0.75 * i,
    }
}

/// Three short peaks around 07:30, 13:00 and 19:00.
fn other_day(i: f64) -> f64 {
    match i as usize {
        0..=12 => -5.0,
        13..=14 => i - 14.0,
        15..=16 => 1.0,
        17..=18 => 17.0 - i,
        19..=23 => -5.0,
        24..=25 => i - 25.0,
        26..=27 => 1.0,
        28..=29 => 28.0 - i,
        30 => 0.0,
        31..=35 => -5.0,
        36..=37 => i - 37.0,
        38..=39 => 1.0,
        40..=41 => 40.0 - i,
        _ => -5.0,
    }
}
