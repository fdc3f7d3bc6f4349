//! End-to-end tests for `schedule_meeting`: validation, constraints, buffers
//! and the distinction between "no slot" and invalid input.

use chrono::{DateTime, FixedOffset, TimeZone, Weekday};
use slot_engine::constraint::{WallClockWindow, WeeklyConstraintTable};
use slot_engine::interval::TimeInterval;
use slot_engine::history::EventCategory;
use slot_engine::schedule::{
    availability_for, free_slots_for, schedule_meeting, start_ranges_for, MeetingRequest, ScheduleOutcome,
};
use slot_engine::select::{MeetingSlot, SelectionPolicy};
use slot_engine::{ScheduleError, StartRange};

// 2020-10-14 is a Wednesday.
fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2020, 10, 14, hour, minute, 0)
        .unwrap()
}

fn iv(start: u32, end: u32) -> TimeInterval {
    TimeInterval::new(at(start, 0), at(end, 0)).unwrap()
}

fn day() -> TimeInterval {
    iv(9, 22)
}

/// Free 09-10, 12-13, 15-16, 18-19, 21-22 within 09:00-22:00.
fn busy_a() -> Vec<TimeInterval> {
    vec![iv(10, 12), iv(13, 15), iv(16, 18), iv(19, 21)]
}

/// Free 09-10, 13-14, 17-18, 21-22 within 09:00-22:00.
fn busy_b() -> Vec<TimeInterval> {
    vec![iv(10, 13), iv(14, 17), iv(18, 21)]
}

fn two_attendees(duration_minutes: i64) -> MeetingRequest {
    MeetingRequest::new(duration_minutes, &day())
        .with_attendee(busy_a(), None)
        .with_attendee(busy_b(), None)
}

fn scheduled(start: (u32, u32), end: (u32, u32)) -> ScheduleOutcome {
    ScheduleOutcome::Scheduled(MeetingSlot {
        start: at(start.0, start.1),
        end: at(end.0, end.1),
    })
}

// ── Outcomes ────────────────────────────────────────────────────────────────

#[test]
fn flexible_request_gets_earliest_common_hour() {
    let outcome = schedule_meeting(&two_attendees(60)).unwrap();
    assert_eq!(outcome, scheduled((9, 0), (10, 0)));
}

#[test]
fn start_ranges_match_common_free_hours() {
    let ranges = start_ranges_for(&two_attendees(60)).unwrap();
    assert_eq!(
        ranges,
        vec![
            StartRange { earliest: at(9, 0), latest: at(9, 0) },
            StartRange { earliest: at(21, 0), latest: at(21, 0) },
        ]
    );
}

#[test]
fn preferred_window_moves_the_slot() {
    let request = two_attendees(60).with_preferred(at(12, 0), at(22, 0), true);
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((21, 0), (22, 0)));
}

#[test]
fn specific_time_inside_common_free_time() {
    let request = two_attendees(30).at(at(9, 15));
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((9, 15), (9, 45)));
}

#[test]
fn specific_time_when_someone_is_busy_finds_no_slot() {
    let request = two_attendees(30).at(at(12, 0));
    assert_eq!(schedule_meeting(&request).unwrap(), ScheduleOutcome::NoSlotFound);
}

#[test]
fn duration_longer_than_every_common_window_is_no_slot_not_error() {
    let outcome = schedule_meeting(&two_attendees(90)).unwrap();
    assert_eq!(outcome, ScheduleOutcome::NoSlotFound);
    assert!(outcome.slot().is_none());
}

#[test]
fn single_attendee_with_empty_calendar_gets_range_start() {
    let request = MeetingRequest::new(45, &day()).with_attendee(Vec::new(), None);
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((9, 0), (9, 45)));
}

#[test]
fn tightest_fit_policy_is_honoured() {
    // One attendee with a wide and a narrow gap.
    let request = MeetingRequest::new(30, &day())
        .with_attendee(vec![iv(12, 15), TimeInterval::new(at(15, 40), at(22, 0)).unwrap()], None)
        .with_policy(SelectionPolicy::TightestFit);

    // Gaps: 09:00-12:00 (starts 09:00..11:30) and 15:00-15:40 (starts 15:00..15:10).
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((15, 0), (15, 30)));
}

#[test]
fn history_policy_follows_category_baseline() {
    // Common hours are 09:00 and 21:00.
    let work = two_attendees(60).with_history(EventCategory::Work, Vec::new());
    assert_eq!(schedule_meeting(&work).unwrap(), scheduled((9, 0), (10, 0)));

    let leisure = two_attendees(60).with_history(EventCategory::Leisure, Vec::new());
    assert_eq!(schedule_meeting(&leisure).unwrap(), scheduled((21, 0), (22, 0)));
}

#[test]
fn availability_matches_the_separate_reports() {
    let request = two_attendees(60);
    let availability = availability_for(&request).unwrap();

    assert_eq!(availability.attendees, free_slots_for(&request).unwrap());
    assert_eq!(availability.start_ranges, start_ranges_for(&request).unwrap());
    assert_eq!(
        availability_for(&MeetingRequest::new(60, &day())).unwrap_err(),
        ScheduleError::NoAttendees
    );
}

// ── Constraints and buffers ─────────────────────────────────────────────────

#[test]
fn working_hours_exclude_evening_window() {
    let hours = WeeklyConstraintTable::weekdays(WallClockWindow::parse("08:30", "19:00").unwrap());
    let request = MeetingRequest::new(30, &day())
        .with_attendee(busy_a(), Some(hours))
        .with_attendee(busy_b(), None);

    assert_eq!(
        start_ranges_for(&request).unwrap(),
        vec![StartRange { earliest: at(9, 0), latest: at(9, 30) }]
    );
}

#[test]
fn table_without_entries_does_not_block_anyone() {
    let request = MeetingRequest::new(60, &day())
        .with_attendee(busy_a(), Some(WeeklyConstraintTable::new()))
        .with_attendee(busy_b(), Some(WeeklyConstraintTable::new()));

    assert_eq!(start_ranges_for(&request).unwrap(), start_ranges_for(&two_attendees(60)).unwrap());
}

#[test]
fn constraints_only_on_other_days_leave_today_unconstrained() {
    // Wednesday has no entries; Monday's window must not leak in.
    let monday_only = WeeklyConstraintTable::new()
        .with_window(Weekday::Mon, WallClockWindow::parse("09:00", "10:00").unwrap());
    let request = MeetingRequest::new(60, &day()).with_attendee(busy_a(), Some(monday_only));

    let free = free_slots_for(&request).unwrap();
    assert_eq!(free[0].len(), 5);
}

#[test]
fn buffer_keeps_distance_from_busy_time() {
    let request = MeetingRequest::new(30, &iv(9, 12))
        .with_attendee(vec![iv(10, 11)], None)
        .with_buffer_minutes(15);

    let free = free_slots_for(&request).unwrap();
    assert_eq!(
        free[0],
        vec![
            TimeInterval::new(at(9, 0), at(9, 45)).unwrap(),
            TimeInterval::new(at(11, 15), at(12, 0)).unwrap(),
        ]
    );

    let too_close = request.clone().at(at(11, 0));
    assert_eq!(schedule_meeting(&too_close).unwrap(), ScheduleOutcome::NoSlotFound);
}

#[test]
fn meeting_cannot_straddle_touching_windows() {
    let split = WeeklyConstraintTable::new()
        .with_window(Weekday::Wed, WallClockWindow::parse("09:00", "12:00").unwrap())
        .with_window(Weekday::Wed, WallClockWindow::parse("12:00", "13:00").unwrap());
    let range = TimeInterval::new(at(11, 30), at(13, 0)).unwrap();

    let hour = MeetingRequest::new(60, &range).with_attendee(Vec::new(), Some(split.clone()));
    assert_eq!(schedule_meeting(&hour).unwrap(), scheduled((12, 0), (13, 0)));

    let ninety = MeetingRequest::new(90, &range).with_attendee(Vec::new(), Some(split));
    assert_eq!(schedule_meeting(&ninety).unwrap(), ScheduleOutcome::NoSlotFound);
}

#[test]
fn oversized_buffer_blocks_the_whole_range() {
    let request = MeetingRequest::new(30, &iv(9, 12))
        .with_attendee(vec![iv(10, 11)], None)
        .with_buffer_minutes(1_000_000_000_000);

    assert_eq!(request.validate(), Ok(()));
    assert_eq!(schedule_meeting(&request).unwrap(), ScheduleOutcome::NoSlotFound);
}

#[test]
fn attendees_in_different_offsets_combine_by_instant() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    // 11:00-23:00 at +02:00 is 09:00-21:00 UTC.
    let busy_local = vec![TimeInterval::new(
        plus_two.with_ymd_and_hms(2020, 10, 14, 11, 0, 0).unwrap(),
        plus_two.with_ymd_and_hms(2020, 10, 14, 23, 0, 0).unwrap(),
    )
    .unwrap()];
    let request = MeetingRequest::new(60, &day())
        .with_attendee(busy_a(), None)
        .with_attendee(busy_local, None);

    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((21, 0), (22, 0)));
}

// ── Validation ──────────────────────────────────────────────────────────────

#[test]
fn empty_attendee_list_is_rejected() {
    let request = MeetingRequest::new(30, &day());
    assert_eq!(schedule_meeting(&request), Err(ScheduleError::NoAttendees));
}

#[test]
fn non_positive_duration_is_rejected() {
    for minutes in [0, -15] {
        let request = two_attendees(minutes);
        assert_eq!(schedule_meeting(&request), Err(ScheduleError::InvalidDuration(minutes)));
    }
}

#[test]
fn negative_buffer_is_rejected() {
    let request = two_attendees(30).with_buffer_minutes(-5);
    assert_eq!(request.validate(), Err(ScheduleError::InvalidBuffer(-5)));
}

#[test]
fn inverted_range_is_rejected() {
    let mut request = two_attendees(30);
    request.range_end = request.range_start;
    assert!(matches!(
        schedule_meeting(&request),
        Err(ScheduleError::InvalidRange { .. })
    ));
}

#[test]
fn inverted_preferred_window_is_rejected() {
    let request = two_attendees(30).with_preferred(at(15, 0), at(14, 0), true);
    assert!(matches!(
        schedule_meeting(&request),
        Err(ScheduleError::InvalidPreferredWindow { .. })
    ));
}

#[test]
fn constraint_list_must_match_attendees() {
    let mut request = two_attendees(30);
    request.constraints = vec![None];
    assert_eq!(
        schedule_meeting(&request),
        Err(ScheduleError::ConstraintCountMismatch { attendees: 2, tables: 1 })
    );
}

#[test]
fn with_attendee_keeps_constraints_aligned() {
    let request = MeetingRequest::new(30, &day())
        .with_attendee(busy_a(), None)
        .with_attendee(busy_b(), Some(WeeklyConstraintTable::new()))
        .with_attendee(Vec::new(), None);

    assert_eq!(request.constraints.len(), 3);
    assert!(request.constraints[0].is_none());
    assert!(request.constraints[1].is_some());
    assert!(request.validate().is_ok());
}

// ── Determinism and JSON ────────────────────────────────────────────────────

#[test]
fn scheduling_twice_gives_same_outcome_and_leaves_request_untouched() {
    let request = two_attendees(30);
    let before = request.clone();

    let first = schedule_meeting(&request).unwrap();
    let second = schedule_meeting(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(request, before);
}

#[test]
fn request_roundtrips_through_json() {
    let json = r#"{
        "attendees": [
            [{"start": "2020-10-14T10:00:00Z", "end": "2020-10-14T12:00:00Z"}],
            []
        ],
        "constraints": [
            {"days": [[], [], [{"start": "09:00", "end": "17:00"}], [], [], [], []]},
            null
        ],
        "duration_minutes": 30,
        "range_start": "2020-10-14T09:00:00Z",
        "range_end": "2020-10-14T22:00:00Z",
        "preferred_start": "2020-10-14T11:00:00Z",
        "preferred_end": "2020-10-14T22:00:00Z",
        "flexible": true
    }"#;

    let request: MeetingRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.buffer_minutes, 0);
    assert_eq!(request.policy, SelectionPolicy::Earliest);

    // Busy until 12:00, working hours end 17:00.
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((12, 0), (12, 30)));
}

#[test]
fn history_fields_parse_from_json() {
    let rows = serde_json::to_string(&vec![vec![0.0; 48]; 7]).unwrap();
    let json = format!(
        r#"{{
        "attendees": [[]],
        "duration_minutes": 30,
        "range_start": "2020-10-14T09:00:00Z",
        "range_end": "2020-10-14T22:00:00Z",
        "preferred_start": "2020-10-14T09:00:00Z",
        "preferred_end": "2020-10-14T22:00:00Z",
        "flexible": true,
        "policy": "history",
        "category": "leisure",
        "history": [{rows}]
    }}"#
    );

    let request: MeetingRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(request.policy, SelectionPolicy::History);
    assert_eq!(request.category, EventCategory::Leisure);
    assert_eq!(request.history.len(), 1);
    // A flat table leaves every start tied, so the first edge wins.
    assert_eq!(schedule_meeting(&request).unwrap(), scheduled((9, 0), (9, 30)));

    let short = json.replace(&rows, "[[1.0]]");
    let err = serde_json::from_str::<MeetingRequest>(&short).unwrap_err();
    assert!(err.to_string().contains("Invalid history table"));
}

#[test]
fn malformed_busy_interval_in_json_is_rejected() {
    let json = r#"{
        "attendees": [[{"start": "2020-10-14T12:00:00Z", "end": "2020-10-14T12:00:00Z"}]],
        "duration_minutes": 30,
        "range_start": "2020-10-14T09:00:00Z",
        "range_end": "2020-10-14T22:00:00Z",
        "preferred_start": "2020-10-14T09:00:00Z",
        "preferred_end": "2020-10-14T22:00:00Z",
        "flexible": true
    }"#;

    let err = serde_json::from_str::<MeetingRequest>(json).unwrap_err();
    assert!(err.to_string().contains("Malformed interval"));
}

#[test]
fn outcome_serializes_with_status_tag() {
    let value = serde_json::to_value(schedule_meeting(&two_attendees(60)).unwrap()).unwrap();
    assert_eq!(value["status"], "scheduled");
    let start: DateTime<FixedOffset> = serde_json::from_value(value["start"].clone()).unwrap();
    assert_eq!(start, at(9, 0));

    let none = serde_json::to_value(ScheduleOutcome::NoSlotFound).unwrap();
    assert_eq!(none, serde_json::json!({"status": "no_slot_found"}));
}
