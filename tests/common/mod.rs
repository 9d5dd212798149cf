//! Shared test infrastructure for the receiver and viewer tests.
//!
//! Every test gets its own temporary directory holding the attendance log,
//! so tests never share state and can run in parallel.

#![allow(dead_code)]

use std::path::PathBuf;

use rollcall::config::Config;
use tempfile::TempDir;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const WEBHOOK_PATH: &str = "/zoom-webhook";
pub const SECRET: &str = "zoom-webhook-secret-123";

// ============================================================================
// SETUP
// ============================================================================

/// Temp dir plus a config pointing at a log file inside it.
///
/// The TempDir must be kept alive for as long as the log is used.
pub fn test_config(secret: Option<&str>) -> (TempDir, Config) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config {
        log_file: dir.path().join("attendance_log.csv"),
        webhook_path: WEBHOOK_PATH.to_string(),
        webhook_secret: secret.map(String::from),
        ..Config::default()
    };
    (dir, config)
}

pub fn log_path(config: &Config) -> PathBuf {
    config.log_file.clone()
}

/// Read the raw log, or an empty string if nothing was written.
pub fn log_contents(config: &Config) -> String {
    std::fs::read_to_string(&config.log_file).unwrap_or_default()
}

/// Data rows in the log, excluding the header.
pub fn data_row_count(config: &Config) -> usize {
    log_contents(config)
        .lines()
        .filter(|l| !l.starts_with("event_type,"))
        .count()
}

// ============================================================================
// PAYLOADS
// ============================================================================

pub fn participant_event(
    event: &str,
    name: &str,
    email: &str,
    meeting_id: &str,
    topic: &str,
    join_time: &str,
    leave_time: &str,
) -> serde_json::Value {
    serde_json::json!({
        "event": event,
        "payload": {
            "object": {
                "id": meeting_id,
                "topic": topic,
                "participant": {
                    "user_name": name,
                    "email": email,
                    "join_time": join_time,
                    "leave_time": leave_time
                }
            }
        }
    })
}

pub fn joined(name: &str, meeting_id: &str, topic: &str, join_time: &str) -> serde_json::Value {
    let email = format!("{}@example.com", name.to_lowercase());
    participant_event("meeting.participant_joined", name, &email, meeting_id, topic, join_time, "")
}

pub fn left(name: &str, meeting_id: &str, topic: &str, leave_time: &str) -> serde_json::Value {
    let email = format!("{}@example.com", name.to_lowercase());
    participant_event("meeting.participant_left", name, &email, meeting_id, topic, "", leave_time)
}

pub fn url_validation(plain: &str, encrypted: &str) -> serde_json::Value {
    serde_json::json!({
        "event": "endpoint.url_validation",
        "payload": { "plainToken": plain, "encryptedToken": encrypted }
    })
}
