use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider event name for the endpoint ownership check.
pub const URL_VALIDATION_EVENT: &str = "endpoint.url_validation";

/// Column order of the attendance log. Also written as the header row.
pub const LOG_COLUMNS: [&str; 8] = [
    "event_type",
    "name",
    "email",
    "join_time",
    "leave_time",
    "meeting_id",
    "topic",
    "received_at",
];

// ---------- Log row ----------

/// One row of the attendance log, exactly as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceEvent {
    pub event_type: String,
    pub name: String,
    pub email: String,
    pub join_time: String,
    pub leave_time: String,
    pub meeting_id: String,
    pub topic: String,
    pub received_at: String,
}

impl AttendanceEvent {
    pub fn to_record(&self) -> [&str; 8] {
        [
            self.event_type.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.join_time.as_str(),
            self.leave_time.as_str(),
            self.meeting_id.as_str(),
            self.topic.as_str(),
            self.received_at.as_str(),
        ]
    }

    /// Build from a raw CSV record. Missing trailing fields become empty.
    pub fn from_record(record: &csv::StringRecord) -> Self {
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        Self {
            event_type: field(0),
            name: field(1),
            email: field(2),
            join_time: field(3),
            leave_time: field(4),
            meeting_id: field(5),
            topic: field(6),
            received_at: field(7),
        }
    }
}

// ---------- Webhook payload ----------

/// Typed view of the provider callback body. Every field is optional on the
/// wire and falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default, deserialize_with = "lenient_string")]
    pub event: String,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "plainToken", default, deserialize_with = "lenient_string")]
    pub plain_token: String,
    #[serde(rename = "encryptedToken", default, deserialize_with = "lenient_string")]
    pub encrypted_token: String,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub object: MeetingObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingObject {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub participant: Participant,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub join_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub leave_time: String,
}

/// Body returned for the URL validation handshake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeResponse {
    #[serde(rename = "plainToken")]
    pub plain_token: String,
    #[serde(rename = "encryptedToken")]
    pub encrypted_token: String,
}

impl WebhookEnvelope {
    /// Parse a callback body. Anything but a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<Value>(body)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Err(serde::de::Error::custom("webhook body must be a JSON object")),
        }
    }

    pub fn is_url_validation(&self) -> bool {
        self.event == URL_VALIDATION_EVENT
    }

    /// Echo the handshake tokens as received.
    pub fn challenge_response(&self) -> ChallengeResponse {
        ChallengeResponse {
            plain_token: self.payload.plain_token.clone(),
            encrypted_token: self.payload.encrypted_token.clone(),
        }
    }

    pub fn into_event(self, received_at: String) -> AttendanceEvent {
        let object = self.payload.object;
        let participant = object.participant;
        AttendanceEvent {
            event_type: self.event,
            name: participant.user_name,
            email: participant.email,
            join_time: participant.join_time,
            leave_time: participant.leave_time,
            meeting_id: object.id,
            topic: object.topic,
            received_at,
        }
    }
}

/// Strings pass through, numbers and booleans are stringified, anything else
/// (null, arrays, objects) becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Nested values that are not objects fall back to the default.
fn lenient_struct<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}
