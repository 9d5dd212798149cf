use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::session::Session;

pub const ALL: &str = "All";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A select-box choice: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    All,
    Exact(String),
}

impl Selection {
    /// Blank or `All` selects everything. Any other value is kept verbatim,
    /// surrounding whitespace included, since names are matched exactly.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() && v.trim() != ALL => Selection::Exact(v.to_string()),
            _ => Selection::All,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Exact(v) => v == value,
        }
    }

    pub fn as_param(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Exact(v) => v,
        }
    }
}

/// Raw query string of the viewer and the export link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).ok())
}

/// Participant, topic and inclusive date range, combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub participant: Selection,
    pub topic: Selection,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    /// Resolve a query against the data. Dates that are absent or unparsable
    /// default to the earliest/latest date present.
    pub fn resolve(query: &FilterQuery, options: &FilterOptions) -> Self {
        Self {
            participant: Selection::from_param(query.participant.as_deref()),
            topic: Selection::from_param(query.topic.as_deref()),
            from: parse_date(query.from.as_deref()).or(options.min_date),
            to: parse_date(query.to.as_deref()).or(options.max_date),
        }
    }

    /// Sessions with no join date fall outside every date range. They only
    /// show up when no range exists at all, i.e. nothing in the log is dated.
    pub fn matches(&self, session: &Session) -> bool {
        if !self.participant.matches(&session.name) || !self.topic.matches(&session.topic) {
            return false;
        }
        match session.date() {
            None => self.from.is_none() && self.to.is_none(),
            Some(date) => {
                self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
            }
        }
    }

    pub fn apply<'a>(&self, sessions: &'a [Session]) -> Vec<&'a Session> {
        sessions.iter().filter(|s| self.matches(s)).collect()
    }

    /// Query string reproducing this filter, for the export link.
    pub fn to_query(&self) -> FilterQuery {
        FilterQuery {
            participant: Some(self.participant.as_param().to_string()),
            topic: Some(self.topic.as_param().to_string()),
            from: self.from.map(|d| d.format(DATE_FORMAT).to_string()),
            to: self.to.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}

/// Choices offered by the filter form.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub participants: Vec<String>,
    pub topics: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let participants: BTreeSet<&str> = sessions
            .iter()
            .map(|s| s.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();
        let topics: BTreeSet<&str> = sessions
            .iter()
            .map(|s| s.topic.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        let dates = || sessions.iter().filter_map(Session::date);
        Self {
            participants: participants.into_iter().map(String::from).collect(),
            topics: topics.into_iter().map(String::from).collect(),
            min_date: dates().min(),
            max_date: dates().max(),
        }
    }
}

/// Sessions of one (meeting_id, topic) pair.
#[derive(Debug)]
pub struct MeetingGroup<'a> {
    pub meeting_id: String,
    pub topic: String,
    pub sessions: Vec<&'a Session>,
}

/// Split filtered sessions into per-meeting groups, ordered by
/// (meeting_id, topic).
pub fn group_by_meeting<'a>(sessions: &[&'a Session]) -> Vec<MeetingGroup<'a>> {
    let mut groups: std::collections::BTreeMap<(&str, &str), Vec<&'a Session>> =
        std::collections::BTreeMap::new();
    for s in sessions {
        groups
            .entry((s.meeting_id.as_str(), s.topic.as_str()))
            .or_default()
            .push(*s);
    }
    groups
        .into_iter()
        .map(|((meeting_id, topic), sessions)| MeetingGroup {
            meeting_id: meeting_id.to_string(),
            topic: topic.to_string(),
            sessions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::AttendanceEvent;
    use crate::models::session::build_sessions;
    use chrono_tz::Tz;

    fn row(name: &str, meeting_id: &str, topic: &str, join: &str) -> AttendanceEvent {
        AttendanceEvent {
            event_type: "meeting.participant_joined".into(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            join_time: join.into(),
            meeting_id: meeting_id.into(),
            topic: topic.into(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Session> {
        build_sessions(
            &[
                row("Alice", "1", "Standup", "2025-03-03T09:00:00Z"),
                row("Bob", "1", "Standup", "2025-03-03T09:01:00Z"),
                row("Alice", "2", "Retro", "2025-03-07T15:00:00Z"),
                row("Carol", "2", "Retro", ""),
            ],
            Tz::UTC,
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn selection_from_param() {
        assert_eq!(Selection::from_param(None), Selection::All);
        assert_eq!(Selection::from_param(Some("All")), Selection::All);
        assert_eq!(Selection::from_param(Some("  ")), Selection::All);
        assert_eq!(Selection::from_param(Some("Bob")), Selection::Exact("Bob".into()));
        assert_eq!(Selection::from_param(Some(" All ")), Selection::All);
    }

    #[test]
    fn trailing_space_in_name_matches_exactly() {
        let sessions = build_sessions(
            &[
                row("Pat ", "1", "Standup", "2025-03-03T09:00:00Z"),
                row("Pat", "1", "Standup", "2025-03-03T09:05:00Z"),
            ],
            Tz::UTC,
        );
        let options = FilterOptions::from_sessions(&sessions);
        assert!(options.participants.iter().any(|p| p == "Pat "));

        let query = FilterQuery { participant: Some("Pat ".into()), ..Default::default() };
        let filter = AttendanceFilter::resolve(&query, &options);
        assert_eq!(filter.participant, Selection::Exact("Pat ".into()));
        let hits = filter.apply(&sessions);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Pat ");
    }

    #[test]
    fn options_are_sorted_and_bounded() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        assert_eq!(options.participants, ["Alice", "Bob", "Carol"]);
        assert_eq!(options.topics, ["Retro", "Standup"]);
        assert_eq!(options.min_date, Some(date("2025-03-03")));
        assert_eq!(options.max_date, Some(date("2025-03-07")));
    }

    #[test]
    fn participant_filter_alone() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        let query = FilterQuery { participant: Some("Alice".into()), topic: Some("All".into()), ..Default::default() };
        let filter = AttendanceFilter::resolve(&query, &options);
        let hits = filter.apply(&sessions);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|s| s.name == "Alice"));
    }

    #[test]
    fn filters_combine_with_and() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        let query = FilterQuery {
            participant: Some("Alice".into()),
            topic: Some("Retro".into()),
            ..Default::default()
        };
        let hits = AttendanceFilter::resolve(&query, &options).apply(&sessions);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].meeting_id, "2");
    }

    #[test]
    fn date_range_is_inclusive_and_drops_undated() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        let query = FilterQuery {
            from: Some("2025-03-03".into()),
            to: Some("2025-03-03".into()),
            ..Default::default()
        };
        let hits = AttendanceFilter::resolve(&query, &options).apply(&sessions);
        let names: Vec<_> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);

        // Default bounds still leave out the session that has no join time.
        let hits = AttendanceFilter::resolve(&FilterQuery::default(), &options).apply(&sessions);
        assert!(hits.iter().all(|s| s.date().is_some()));
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn leave_only_session_is_outside_any_range() {
        let mut leaver = row("Leaver", "3", "Standup", "");
        leaver.leave_time = "2025-01-01T09:30:00Z".into();
        let mut events = vec![leaver];
        events.push(row("Alice", "1", "Standup", "2025-03-03T09:00:00Z"));
        let sessions = build_sessions(&events, Tz::UTC);
        let options = FilterOptions::from_sessions(&sessions);
        let query = FilterQuery {
            from: Some("2025-03-03".into()),
            to: Some("2025-03-03".into()),
            ..Default::default()
        };
        let hits = AttendanceFilter::resolve(&query, &options).apply(&sessions);
        let names: Vec<_> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alice"]);
    }

    #[test]
    fn undated_sessions_show_when_nothing_is_dated() {
        let sessions = build_sessions(&[row("Carol", "2", "Retro", "")], Tz::UTC);
        let options = FilterOptions::from_sessions(&sessions);
        assert_eq!(options.min_date, None);
        let filter = AttendanceFilter::resolve(&FilterQuery::default(), &options);
        assert_eq!(filter.apply(&sessions).len(), 1);
    }

    #[test]
    fn bad_dates_fall_back_to_data_bounds() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        let query = FilterQuery { from: Some("03/03/2025".into()), ..Default::default() };
        let filter = AttendanceFilter::resolve(&query, &options);
        assert_eq!(filter.from, options.min_date);
        // Everything dated; Carol has no join time.
        assert_eq!(filter.apply(&sessions).len(), sessions.len() - 1);
    }

    #[test]
    fn groups_by_meeting_and_topic() {
        let sessions = sample();
        let all: Vec<&Session> = sessions.iter().collect();
        let groups = group_by_meeting(&all);
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].meeting_id.as_str(), groups[0].topic.as_str()), ("1", "Standup"));
        assert_eq!(groups[0].sessions.len(), 2);
        assert_eq!((groups[1].meeting_id.as_str(), groups[1].topic.as_str()), ("2", "Retro"));
    }

    #[test]
    fn to_query_roundtrips_through_resolve() {
        let sessions = sample();
        let options = FilterOptions::from_sessions(&sessions);
        let filter = AttendanceFilter {
            participant: Selection::Exact("Bob".into()),
            topic: Selection::All,
            from: Some(date("2025-03-01")),
            to: Some(date("2025-03-05")),
        };
        assert_eq!(AttendanceFilter::resolve(&filter.to_query(), &options), filter);
    }
}
