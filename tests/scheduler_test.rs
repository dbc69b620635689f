//! Tests for timing windows and execution-time resolution.

use chrono::{DateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use kickoff_rs::error::Error;
use kickoff_rs::model::*;
use kickoff_rs::scheduler::resolve_execution_time;
use kickoff_rs::scheduler::window::TimingWindow;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn business_hours() -> TimingWindow {
    TimingWindow {
        allowed_days: vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        start_hour: 9,
        end_hour: 17,
        use_contact_timezone: false,
    }
}

fn event_with(trigger: TriggerMode, timing: Option<TimingWindow>) -> CampaignEvent {
    CampaignEvent {
        id: EventId(1),
        campaign_id: CampaignId(1),
        name: "kickoff".to_string(),
        action_type: "email.send".to_string(),
        params: serde_json::json!({}),
        trigger,
        timing,
        event_order: 0,
    }
}

// ---------------------------------------------------------------------------
// Window membership
// ---------------------------------------------------------------------------

#[test]
fn window_contains_weekday_working_hours() {
    let window = business_hours();

    // 2026-08-03 is a Monday.
    assert!(window.contains(at(2026, 8, 3, 9, 0), None));
    assert!(window.contains(at(2026, 8, 3, 16, 59), None));
    assert!(!window.contains(at(2026, 8, 3, 17, 0), None));
    assert!(!window.contains(at(2026, 8, 3, 8, 59), None));
    // Saturday.
    assert!(!window.contains(at(2026, 8, 8, 12, 0), None));
}

#[test]
fn window_membership_follows_contact_timezone() {
    let mut window = business_hours();
    window.use_contact_timezone = true;
    let denver: Tz = "America/Denver".parse().unwrap();

    // 14:00 UTC on a Monday in August is 08:00 in Denver.
    assert!(!window.contains(at(2026, 8, 3, 14, 0), Some(denver)));
    assert!(window.contains(at(2026, 8, 3, 15, 0), Some(denver)));
}

// ---------------------------------------------------------------------------
// Next opening
// ---------------------------------------------------------------------------

#[test]
fn next_open_keeps_instants_already_inside_the_window() {
    let window = business_hours();
    let inside = at(2026, 8, 3, 10, 23);
    assert_eq!(window.next_open(inside, None), Some(inside));
}

#[test]
fn next_open_advances_to_the_next_allowed_hour() {
    let window = business_hours();
    // Monday evening rolls to Tuesday 09:00.
    assert_eq!(
        window.next_open(at(2026, 8, 3, 18, 30), None),
        Some(at(2026, 8, 4, 9, 0))
    );
    // Friday evening rolls over the weekend to Monday 09:00.
    assert_eq!(
        window.next_open(at(2026, 8, 7, 20, 0), None),
        Some(at(2026, 8, 10, 9, 0))
    );
}

#[test]
fn next_open_in_contact_timezone() {
    let mut window = business_hours();
    window.use_contact_timezone = true;
    let denver: Tz = "America/Denver".parse().unwrap();

    // 08:00 Denver opens at 09:00 Denver, which is 15:00 UTC.
    assert_eq!(
        window.next_open(at(2026, 8, 3, 14, 0), Some(denver)),
        Some(at(2026, 8, 3, 15, 0))
    );
}

#[test]
fn window_that_never_opens_yields_none() {
    let window = TimingWindow {
        allowed_days: vec![],
        ..TimingWindow::default()
    };
    assert_eq!(window.next_open(at(2026, 8, 3, 10, 0), None), None);
}

// ---------------------------------------------------------------------------
// Serde shape
// ---------------------------------------------------------------------------

#[test]
fn window_deserializes_with_defaults() {
    let window: TimingWindow = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(window, TimingWindow::default());
    assert_eq!(window.allowed_days.len(), 7);
    assert_eq!(window.start_hour, 0);
    assert_eq!(window.end_hour, 24);
}

#[test]
fn window_deserializes_partial_definitions() {
    let window: TimingWindow = serde_json::from_value(serde_json::json!({
        "allowed_days": ["Mon", "Tue"],
        "start_hour": 9,
        "end_hour": 17,
    }))
    .unwrap();
    assert_eq!(window.allowed_days, vec![Weekday::Mon, Weekday::Tue]);
    assert!(!window.use_contact_timezone);
}

// ---------------------------------------------------------------------------
// Execution-time resolution
// ---------------------------------------------------------------------------

#[test]
fn immediate_trigger_without_window_runs_now() {
    let now = at(2026, 8, 3, 10, 0);
    let event = event_with(TriggerMode::Immediate, None);
    assert_eq!(resolve_execution_time(&event, now, None).unwrap(), now);
}

#[test]
fn interval_trigger_adds_the_delay() {
    let now = at(2026, 8, 3, 10, 0);
    let event = event_with(
        TriggerMode::Interval {
            value: 2,
            unit: IntervalUnit::Hours,
        },
        None,
    );
    assert_eq!(
        resolve_execution_time(&event, now, None).unwrap(),
        at(2026, 8, 3, 12, 0)
    );
}

#[test]
fn date_trigger_is_fixed() {
    let now = at(2026, 8, 3, 10, 0);
    let later = at(2026, 9, 1, 8, 0);
    let event = event_with(TriggerMode::Date { at: later }, None);
    assert_eq!(resolve_execution_time(&event, now, None).unwrap(), later);
}

#[test]
fn closed_window_pushes_immediate_triggers_forward() {
    // Monday evening, outside business hours.
    let now = at(2026, 8, 3, 19, 0);
    let event = event_with(TriggerMode::Immediate, Some(business_hours()));
    assert_eq!(
        resolve_execution_time(&event, now, None).unwrap(),
        at(2026, 8, 4, 9, 0)
    );
}

#[test]
fn impossible_window_is_not_schedulable() {
    let window = TimingWindow {
        allowed_days: vec![],
        ..TimingWindow::default()
    };
    let event = event_with(TriggerMode::Immediate, Some(window));
    let err = resolve_execution_time(&event, at(2026, 8, 3, 10, 0), None).unwrap_err();
    assert!(matches!(err, Error::NotSchedulable { event_id: 1, .. }));
}
