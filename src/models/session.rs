use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::models::event::AttendanceEvent;

/// Display format for join/leave times, e.g. `04 Mar 2025, 03:30 PM`.
pub const DISPLAY_FORMAT: &str = "%d %b %Y, %I:%M %p";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ---------- Types ----------

/// Grouping key. Field order is the sort order of the report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub email: String,
    pub name: String,
    pub meeting_id: String,
    pub topic: String,
}

/// One participant's attendance in one meeting, derived from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: String,
    pub name: String,
    pub meeting_id: String,
    pub topic: String,
    pub join_time: Option<DateTime<Tz>>,
    pub leave_time: Option<DateTime<Tz>>,
    pub duration_minutes: Option<f64>,
}

impl Session {
    /// Join date in the display zone, used for range filtering.
    pub fn date(&self) -> Option<NaiveDate> {
        self.join_time.as_ref().map(|t| t.date_naive())
    }

    pub fn join_display(&self) -> String {
        format_time(self.join_time.as_ref())
    }

    pub fn leave_display(&self) -> String {
        format_time(self.leave_time.as_ref())
    }

    /// Duration with one decimal, empty when unknown.
    pub fn duration_display(&self) -> String {
        self.duration_minutes
            .map(|d| format!("{d:.1}"))
            .unwrap_or_default()
    }
}

fn format_time(t: Option<&DateTime<Tz>>) -> String {
    t.map(|t| t.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

// ---------- Timestamps ----------

/// Parse a provider timestamp. Offsets are honoured; naive values are taken
/// as UTC. Empty or unrecognised input is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Minutes between join and leave, rounded to one decimal with ties going to
/// the even digit.
pub fn duration_minutes(join: Option<DateTime<Utc>>, leave: Option<DateTime<Utc>>) -> Option<f64> {
    let (join, leave) = (join?, leave?);
    let minutes = (leave - join).num_milliseconds() as f64 / 60_000.0;
    Some((minutes * 10.0).round_ties_even() / 10.0)
}

// ---------- Aggregation ----------

#[derive(Default)]
struct Accumulator {
    join: Option<DateTime<Utc>>,
    leave: Option<DateTime<Utc>>,
}

/// Group raw events into sessions keyed by (email, name, meeting_id, topic).
///
/// Join and leave are each the first parseable value seen for the key; later
/// values are ignored. Rows without a meeting id are not participant events
/// and are left out.
pub fn build_sessions(events: &[AttendanceEvent], tz: Tz) -> Vec<Session> {
    let mut groups: BTreeMap<SessionKey, Accumulator> = BTreeMap::new();

    for event in events {
        if event.meeting_id.trim().is_empty() {
            continue;
        }
        let key = SessionKey {
            email: event.email.clone(),
            name: event.name.clone(),
            meeting_id: event.meeting_id.clone(),
            topic: event.topic.clone(),
        };
        let acc = groups.entry(key).or_default();
        if acc.join.is_none() {
            acc.join = parse_timestamp(&event.join_time);
        }
        if acc.leave.is_none() {
            acc.leave = parse_timestamp(&event.leave_time);
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| Session {
            duration_minutes: duration_minutes(acc.join, acc.leave),
            join_time: acc.join.map(|t| t.with_timezone(&tz)),
            leave_time: acc.leave.map(|t| t.with_timezone(&tz)),
            email: key.email,
            name: key.name,
            meeting_id: key.meeting_id,
            topic: key.topic,
        })
        .collect()
}
