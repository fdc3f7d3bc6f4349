//! Error types for slot-engine operations.
//!
//! Every variant is a validation failure of caller-supplied input. Finding no
//! common slot is not an error: it is reported as
//! [`ScheduleOutcome::NoSlotFound`](crate::schedule::ScheduleOutcome::NoSlotFound).

use chrono::{DateTime, FixedOffset, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Malformed interval: start {start} is not before end {end}")]
    MalformedInterval {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    #[error("Malformed wall-clock window: {start} is not before {end}")]
    MalformedWindow { start: NaiveTime, end: NaiveTime },

    #[error("Invalid duration: {0} minutes (must be positive)")]
    InvalidDuration(i64),

    #[error("Invalid buffer: {0} minutes (must not be negative)")]
    InvalidBuffer(i64),

    #[error("Meeting request has no attendees")]
    NoAttendees,

    #[error("Expected {attendees} constraint tables (one per attendee), got {tables}")]
    ConstraintCountMismatch { attendees: usize, tables: usize },

    #[error("Invalid search range: start {start} is not before end {end}")]
    InvalidRange {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    #[error("Invalid preferred window: start {start} is after end {end}")]
    InvalidPreferredWindow {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid history table: {0}")]
    InvalidHistory(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
