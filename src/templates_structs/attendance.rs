use askama::Template;

use crate::models::attendance_filter::{
    ALL, AttendanceFilter, DATE_FORMAT, FilterOptions, Selection, group_by_meeting,
};
use crate::models::session::Session;

/// One `<option>` of a filter select.
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    /// `All` followed by every choice, with the current selection marked.
    fn list(choices: &[String], current: &Selection) -> Vec<Self> {
        std::iter::once(ALL.to_string())
            .chain(choices.iter().cloned())
            .map(|value| {
                let selected = value == current.as_param();
                SelectOption { value, selected }
            })
            .collect()
    }
}

pub struct SessionRow {
    pub name: String,
    pub email: String,
    pub join_time: String,
    pub leave_time: String,
    pub duration: String,
}

impl From<&Session> for SessionRow {
    fn from(s: &Session) -> Self {
        Self {
            name: s.name.clone(),
            email: s.email.clone(),
            join_time: s.join_display(),
            leave_time: s.leave_display(),
            duration: s.duration_display(),
        }
    }
}

/// Table for one (meeting_id, topic) pair.
pub struct MeetingTable {
    pub meeting_id: String,
    pub topic: String,
    pub rows: Vec<SessionRow>,
}

#[derive(Template)]
#[template(path = "attendance.html")]
pub struct AttendanceTemplate {
    pub app_name: String,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub participants: Vec<SelectOption>,
    pub topics: Vec<SelectOption>,
    pub date_from: String,
    pub date_to: String,
    pub min_date: String,
    pub max_date: String,
    pub tables: Vec<MeetingTable>,
    pub row_count: usize,
    pub export_href: String,
}

fn fmt_date(d: Option<chrono::NaiveDate>) -> String {
    d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

impl AttendanceTemplate {
    pub fn build(
        app_name: &str,
        options: &FilterOptions,
        filter: &AttendanceFilter,
        rows: &[&Session],
        skipped_rows: usize,
    ) -> Self {
        let tables = group_by_meeting(rows)
            .into_iter()
            .map(|g| MeetingTable {
                meeting_id: g.meeting_id,
                topic: g.topic,
                rows: g.sessions.into_iter().map(SessionRow::from).collect(),
            })
            .collect();
        let query = serde_urlencoded::to_string(filter.to_query()).unwrap_or_default();
        let notice = (skipped_rows > 0)
            .then(|| format!("{skipped_rows} unreadable row(s) in the attendance log were skipped."));

        Self {
            app_name: app_name.to_string(),
            error: None,
            notice,
            participants: SelectOption::list(&options.participants, &filter.participant),
            topics: SelectOption::list(&options.topics, &filter.topic),
            date_from: fmt_date(filter.from),
            date_to: fmt_date(filter.to),
            min_date: fmt_date(options.min_date),
            max_date: fmt_date(options.max_date),
            tables,
            row_count: rows.len(),
            export_href: format!("/attendance/export.csv?{query}"),
        }
    }

    /// Page shown when the log could not be loaded.
    pub fn failed(app_name: &str, message: String) -> Self {
        Self::build(
            app_name,
            &FilterOptions::default(),
            &AttendanceFilter::default(),
            &[],
            0,
        )
        .with_error(message)
    }

    fn with_error(mut self, message: String) -> Self {
        self.error = Some(message);
        self
    }
}
