use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};

use crate::errors::AppError;
use crate::models::attendance_log::AttendanceLog;
use crate::models::event::WebhookEnvelope;

/// GET / — liveness check
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Webhook receiver is live")
}

/// POST <webhook path> — provider callback
///
/// Authentication has already happened in `require_bearer`. The body is
/// parsed here rather than through `web::Json` so that a wrong or missing
/// content type does not reject an otherwise valid delivery. The append runs
/// on the blocking pool.
pub async fn receive(
    log: web::Data<AttendanceLog>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let envelope = WebhookEnvelope::from_slice(&body)
        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;

    if envelope.is_url_validation() {
        log::info!("URL validation request received");
        return Ok(HttpResponse::Ok().json(envelope.challenge_response()));
    }

    let received_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let event = envelope.into_event(received_at);
    log::info!(
        "Event: {}, participant: {}, meeting: {}",
        event.event_type,
        event.name,
        event.meeting_id
    );

    let log = log.clone();
    web::block(move || log.append(&event)).await??;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "received" })))
}
