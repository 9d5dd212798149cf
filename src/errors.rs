use actix_web::{HttpResponse, ResponseError, error::BlockingError, http::StatusCode};
use askama::Template;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    MalformedPayload(String),
    Storage(std::io::Error),
    Csv(csv::Error),
    Template(askama::Error),
    Blocking(BlockingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::MalformedPayload(e) => write!(f, "Malformed payload: {e}"),
            AppError::Storage(e) => write!(f, "Storage error: {e}"),
            AppError::Csv(e) => write!(f, "CSV error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Blocking(e) => write!(f, "Worker pool error: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized => {
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Unauthorized" }))
            }
            AppError::MalformedPayload(details) => HttpResponse::BadRequest().json(
                serde_json::json!({ "error": "Malformed payload", "details": details }),
            ),
            AppError::Storage(_) | AppError::Csv(_) => {
                log::error!("{self}");
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Storage failure" }))
            }
            AppError::Template(_) | AppError::Blocking(_) => {
                log::error!("{self}");
                HttpResponse::InternalServerError().body("Internal Server Error")
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e)
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Csv(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        AppError::Blocking(e)
    }
}

/// Render an askama template into an HTML response.
pub fn render<T: Template>(tmpl: T) -> Result<HttpResponse, AppError> {
    let html = tmpl.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
