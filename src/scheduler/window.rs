//! Allowed execution windows.
//!
//! A window restricts on which weekdays and during which hours an event may
//! run. Membership is checked in UTC, or in the contact's own timezone when
//! the window asks for it.

use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// How far `next_open` searches before giving up. Two weeks covers every
/// weekly day/hour pattern, including DST shifts.
const MAX_SEARCH_HOURS: i64 = 14 * 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindow {
    /// Weekdays on which execution is allowed. An empty list never opens.
    #[serde(default = "every_day")]
    pub allowed_days: Vec<Weekday>,

    /// First allowed hour of day, inclusive.
    #[serde(default)]
    pub start_hour: u32,

    /// First disallowed hour of day. 24 keeps the window open to midnight.
    #[serde(default = "end_of_day")]
    pub end_hour: u32,

    /// Evaluate day and hour in the contact's timezone instead of UTC.
    #[serde(default)]
    pub use_contact_timezone: bool,
}

impl TimingWindow {
    /// Is `at` inside the window, evaluated in `tz` when given?
    pub fn contains(&self, at: DateTime<Utc>, tz: Option<Tz>) -> bool {
        let (weekday, hour) = match tz {
            Some(tz) => {
                let local = at.with_timezone(&tz);
                (local.weekday(), local.hour())
            }
            None => (at.weekday(), at.hour()),
        };
        self.allowed_days.contains(&weekday) && hour >= self.start_hour && hour < self.end_hour
    }

    /// First instant at or after `from` that falls inside the window,
    /// stepping on hour boundaries. `None` if the window never opens.
    pub fn next_open(&self, from: DateTime<Utc>, tz: Option<Tz>) -> Option<DateTime<Utc>> {
        if self.contains(from, tz) {
            return Some(from);
        }

        let mut at = from.duration_trunc(Duration::hours(1)).ok()? + Duration::hours(1);
        for _ in 0..MAX_SEARCH_HOURS {
            if self.contains(at, tz) {
                return Some(at);
            }
            at += Duration::hours(1);
        }
        None
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            allowed_days: every_day(),
            start_hour: 0,
            end_hour: end_of_day(),
            use_contact_timezone: false,
        }
    }
}

fn every_day() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

fn end_of_day() -> u32 {
    24
}
