pub mod auth;
pub mod booking;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod templates_structs;

use std::sync::Arc;

use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::config::{AppConfig, Backend};
use crate::remote::{MemoryService, RemoteError, SharedService, SupabaseService};

/// Room for the text fields next to the design upload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared per-worker state handed to every handler.
pub struct AppState {
    pub service: SharedService,
    pub upload_bucket: String,
}

impl AppState {
    pub fn new(service: SharedService, upload_bucket: &str) -> Self {
        Self {
            service,
            upload_bucket: upload_bucket.to_string(),
        }
    }
}

/// Connect the configured remote data service.
pub async fn build_service(config: &AppConfig) -> Result<SharedService, RemoteError> {
    match &config.backend {
        Backend::Supabase { url, anon_key } => {
            log::info!("Using hosted data service at {url}");
            Ok(Arc::new(SupabaseService::new(url, anon_key, config.http_timeout)?))
        }
        Backend::Memory {
            admin_email,
            admin_password,
        } => {
            log::warn!("Using in-memory data service; nothing survives a restart");
            let service = MemoryService::new();
            match (admin_email, admin_password) {
                (Some(email), Some(password)) => {
                    service.add_account(email, password).await?;
                    log::info!("Seeded admin account '{email}'");
                }
                _ => log::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; admin console has no accounts"),
            }
            Ok(Arc::new(service))
        }
    }
}

pub fn multipart_config(max_upload_bytes: usize) -> MultipartFormConfig {
    let limit = max_upload_bytes + FORM_OVERHEAD_BYTES;
    MultipartFormConfig::default()
        .total_limit(limit)
        .memory_limit(limit)
        .error_handler(|err, _req| errors::AppError::Multipart(err.to_string()).into())
}

/// All page and form routes. `/admin` and `/admin/login` are registered
/// before the guarded `/admin` scope so they stay reachable when signed out.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use crate::handlers::{admin_handlers, auth_handlers, booking_handlers, catalog_handlers, pages};

    cfg.route("/", web::get().to(pages::home))
        .route("/book-meeting", web::get().to(booking_handlers::form))
        .route("/book-meeting", web::post().to(booking_handlers::submit))
        .route("/catalog", web::get().to(catalog_handlers::index))
        .route("/admin", web::get().to(admin_handlers::console))
        .route("/admin/login", web::post().to(auth_handlers::login_submit))
        .service(
            web::scope("/admin")
                .wrap(actix_web::middleware::from_fn(auth::middleware::require_admin))
                .route("/logout", web::post().to(auth_handlers::logout))
                .route("/catalog", web::post().to(admin_handlers::create_item))
                .route("/catalog/{id}/delete", web::get().to(admin_handlers::confirm_delete))
                .route("/catalog/{id}/delete", web::post().to(admin_handlers::delete_item)),
        );
}
