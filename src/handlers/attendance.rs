use actix_web::{web, HttpResponse};

use crate::config::Config;
use crate::errors::{AppError, render};
use crate::models::attendance_filter::{AttendanceFilter, FilterOptions, FilterQuery};
use crate::models::attendance_log::read_log;
use crate::models::export::{self, EXPORT_FILENAME};
use crate::models::session::build_sessions;
use crate::templates_structs::AttendanceTemplate;

/// GET / — send the browser to the report
pub async fn index() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/attendance"))
        .finish()
}

/// GET /attendance — filtered attendance tables, reloaded from disk on every
/// request. Load failures render as an error banner instead of a 500.
pub async fn report(
    config: web::Data<Config>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let path = config.log_file.clone();
    let tmpl = match web::block(move || read_log(&path)).await? {
        Ok(loaded) => {
            let sessions = build_sessions(&loaded.events, config.display_tz);
            let options = FilterOptions::from_sessions(&sessions);
            let filter = AttendanceFilter::resolve(&query, &options);
            let rows = filter.apply(&sessions);
            AttendanceTemplate::build(&config.app_name, &options, &filter, &rows, loaded.skipped_rows)
        }
        Err(e) => {
            log::error!("Failed to load attendance log {}: {e}", config.log_file.display());
            AttendanceTemplate::failed(&config.app_name, format!("Error loading data: {e}"))
        }
    };
    render(tmpl)
}

/// GET /attendance/export.csv — the currently filtered rows as a download
pub async fn export_csv(
    config: web::Data<Config>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let path = config.log_file.clone();
    let loaded = web::block(move || read_log(&path)).await??;
    let sessions = build_sessions(&loaded.events, config.display_tz);
    let options = FilterOptions::from_sessions(&sessions);
    let rows = AttendanceFilter::resolve(&query, &options).apply(&sessions);

    log::info!("Exporting {} attendance rows", rows.len());
    let csv = export::to_csv(&rows)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{EXPORT_FILENAME}\""),
        ))
        .body(csv))
}
