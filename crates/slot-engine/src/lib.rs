//! # slot-engine
//!
//! Deterministic meeting-slot finder for groups of attendees.
//!
//! Given each attendee's busy intervals and, optionally, their weekly working
//! hours, the engine finds the times at which everyone is free for the
//! requested duration and picks one slot according to the caller's preferred
//! window. The computation is pure: no I/O, no shared state, identical output
//! for identical input.
//!
//! ## Modules
//!
//! - [`interval`]: `TimeInterval`, normalize/intersect primitives
//! - [`constraint`]: weekly availability tables → dated intervals
//! - [`dst`]: DST transition policies for wall-clock projection
//! - [`freebusy`]: busy intervals → free intervals for one attendee
//! - [`intersect`]: N attendees' free time → valid start ranges
//! - [`select`]: start ranges → one `MeetingSlot`
//! - [`history`]: weekly half-hour scores for history-weighted choice
//! - [`schedule`]: `MeetingRequest` validation and the full pipeline
//! - `gather`: concurrent fetch of attendee inputs (feature `gather`)
//! - [`error`]: Error types

pub mod constraint;
pub mod dst;
pub mod error;
pub mod freebusy;
#[cfg(feature = "gather")]
pub mod gather;
pub mod history;
pub mod intersect;
pub mod interval;
pub mod schedule;
pub mod select;

pub use constraint::{project, project_availability, WallClockWindow, WeeklyConstraintTable};
pub use error::ScheduleError;
pub use freebusy::{find_free_slots, BusySchedule};
pub use history::{EventCategory, HistoryTable};
pub use intersect::{valid_start_ranges, StartRange};
pub use interval::{intersect, normalize, TimeInterval};
pub use schedule::{availability_for, schedule_meeting, Availability, MeetingRequest, ScheduleOutcome};
pub use select::{select_slot, MeetingSlot, SelectionPolicy, SlotPreference};
