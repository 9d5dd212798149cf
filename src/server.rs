use std::io;

use actix_web::{App, HttpServer, middleware, web};

use crate::auth::bearer::require_bearer;
use crate::config::Config;
use crate::handlers;
use crate::models::attendance_log::AttendanceLog;

/// Receiver routes. Expects `web::Data<Config>` and `web::Data<AttendanceLog>`
/// in app data.
pub fn configure_receiver(cfg: &mut web::ServiceConfig, webhook_path: &str) {
    cfg.route("/", web::get().to(handlers::webhook::liveness))
        .service(
            web::resource(webhook_path)
                .wrap(middleware::from_fn(require_bearer))
                .route(web::post().to(handlers::webhook::receive)),
        );
}

/// Viewer routes. Expects `web::Data<Config>` in app data.
pub fn configure_viewer(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::attendance::index))
        .route("/attendance", web::get().to(handlers::attendance::report))
        .route(
            "/attendance/export.csv",
            web::get().to(handlers::attendance::export_csv),
        );
}

/// Run the webhook receiver until shutdown.
pub async fn run_receiver(config: Config) -> io::Result<()> {
    let log = web::Data::new(AttendanceLog::open(&config.log_file)?);
    let addr = (config.host.clone(), config.receiver_port);
    let webhook_path = config.webhook_path.clone();

    if config.auth_enabled() {
        log::info!("Bearer authentication enabled for {webhook_path}");
    } else {
        log::warn!("No webhook secret configured; accepting unauthenticated callbacks");
    }
    log::info!("Starting webhook receiver at http://{}:{}{}", addr.0, addr.1, webhook_path);

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .app_data(log.clone())
            .configure(|cfg| configure_receiver(cfg, &webhook_path))
    })
    .bind(addr)?
    .run()
    .await
}

/// Run the attendance viewer until shutdown.
pub async fn run_viewer(config: Config) -> io::Result<()> {
    let addr = (config.host.clone(), config.viewer_port);
    log::info!(
        "Starting attendance viewer at http://{}:{} (log: {}, zone: {})",
        addr.0,
        addr.1,
        config.log_file.display(),
        config.display_tz.name()
    );

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .configure(configure_viewer)
    })
    .bind(addr)?
    .run()
    .await
}
