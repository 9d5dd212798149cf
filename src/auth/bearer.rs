use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web,
};

use crate::config::Config;

/// Middleware guarding the webhook route with the shared secret.
///
/// When no secret is configured every request passes. Otherwise the request
/// must carry `Authorization: Bearer <secret>`; anything else is answered
/// with 401 before the body is read. An app without `Config` data cannot
/// tell whether auth is on, so it answers 500 and the handler never runs.
pub async fn require_bearer(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let Some(config) = req.app_data::<web::Data<Config>>() else {
        log::error!("Webhook route mounted without configuration; refusing request");
        let response = HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": "Server misconfigured" }));
        return Ok(req.into_response(response).map_into_right_body());
    };
    let secret = config.webhook_secret.clone();

    if let Some(secret) = secret {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !bearer_matches(presented, &secret) {
            log::warn!(
                "Rejected webhook call from {}: bad or missing bearer token",
                req.connection_info().realip_remote_addr().unwrap_or("unknown")
            );
            let response = HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": "Unauthorized" }));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Check an `Authorization` header value against the expected secret.
pub fn bearer_matches(header_value: &str, secret: &str) -> bool {
    let expected = format!("Bearer {secret}");
    tokens_equal(header_value.as_bytes(), expected.as_bytes())
}

/// Compares every byte of `expected` whatever the presented length, so the
/// time taken depends only on the secret.
fn tokens_equal(presented: &[u8], expected: &[u8]) -> bool {
    let mut diff = u8::from(presented.len() != expected.len());
    for (i, want) in expected.iter().enumerate() {
        diff |= presented.get(i).map_or(0xff, |got| got ^ want);
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_bearer() {
        assert!(bearer_matches("Bearer s3cret", "s3cret"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!bearer_matches("", "s3cret"));
        assert!(!bearer_matches("s3cret", "s3cret"));
        assert!(!bearer_matches("Bearer s3cre", "s3cret"));
        assert!(!bearer_matches("Bearer s3creT", "s3cret"));
        assert!(!bearer_matches("bearer s3cret", "s3cret"));
        assert!(!bearer_matches("Basic s3cret", "s3cret"));
    }

    #[test]
    fn length_mismatch_never_matches() {
        assert!(!bearer_matches("Bearer s3cret ", "s3cret"));
        assert!(!bearer_matches("Bearer s3cretX", "s3cret"));
        assert!(!tokens_equal(b"", b"x"));
        assert!(!tokens_equal(b"x", b""));
        assert!(tokens_equal(b"", b""));
    }
}
