use crate::errors::AppError;
use crate::models::session::Session;

pub const EXPORT_FILENAME: &str = "filtered_attendance.csv";

pub const EXPORT_COLUMNS: [&str; 7] = [
    "name",
    "email",
    "meeting_id",
    "topic",
    "Join Time",
    "Leave Time",
    "duration_minutes",
];

/// Encode sessions as CSV in the fixed export column order.
pub fn to_csv(sessions: &[&Session]) -> Result<String, AppError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(EXPORT_COLUMNS)?;
        for s in sessions {
            writer.write_record([
                s.name.as_str(),
                s.email.as_str(),
                s.meeting_id.as_str(),
                s.topic.as_str(),
                s.join_display().as_str(),
                s.leave_display().as_str(),
                s.duration_display().as_str(),
            ])?;
        }
        writer.flush()?;
    }
    // Every field came from a `&str`, so the buffer is valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
