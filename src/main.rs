use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use threadhouse::auth::rate_limit::RateLimiter;
use threadhouse::booking::SubmissionGuard;
use threadhouse::config::AppConfig;
use threadhouse::{AppState, build_service, handlers, multipart_config, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("{e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let service = build_service(&config).await.map_err(|e| {
        log::error!("Failed to set up data service: {e}");
        std::io::Error::other(e)
    })?;
    let state = web::Data::new(AppState::new(service, &config.upload_bucket));
    let limiter = web::Data::new(RateLimiter::new());
    let submissions = web::Data::new(SubmissionGuard::new());

    // Session encryption key — a random key means sessions are lost on restart
    let secret_key = match &config.session_key {
        Some(bytes) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(bytes.as_slice())
        }
        None => {
            log::warn!("No usable SESSION_KEY set — generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    let cookie_secure = config.cookie_secure;
    let static_dir = config.static_dir.clone();
    let max_upload_bytes = config.max_upload_bytes;

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(limiter.clone())
            .app_data(submissions.clone())
            .app_data(multipart_config(max_upload_bytes))
            .service(actix_files::Files::new("/static", &static_dir))
            .configure(routes)
            // Default 404 handler (must be registered last)
            .default_service(web::to(handlers::pages::not_found))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
