use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::AppState;
use crate::auth::session::{clear_auth, get_access_token, set_flash, store_auth};
use crate::auth::{csrf, rate_limit::RateLimiter};
use crate::errors::{AppError, render};
use crate::remote::RemoteError;
use crate::templates_structs::{AdminLoginTemplate, PageContext};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

pub fn login_page(session: &Session, email: &str, error: Option<String>) -> Result<HttpResponse, AppError> {
    let tmpl = AdminLoginTemplate {
        ctx: PageContext::build(session, "/admin"),
        email: email.to_string(),
        error,
    };
    render(tmpl)
}

/// POST /admin/login — one sign-in call against the remote auth service.
pub async fn login_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check BEFORE any remote call
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        return login_page(
            &session,
            &form.email,
            Some("Too many failed login attempts. Please try again later.".to_string()),
        );
    }

    match state.service.sign_in(form.email.trim(), &form.password).await {
        Ok(auth) => {
            limiter.clear(ip);
            store_auth(&session, &auth)?;
            log::info!("Admin '{}' signed in", auth.user.display_email());
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/admin"))
                .finish())
        }
        Err(e) => {
            if matches!(e, RemoteError::Unauthorized(_)) {
                limiter.record_failure(ip);
                log::warn!("Failed admin login for '{}' from {ip}", form.email.trim());
            } else {
                log::error!("Admin login failed: {e}");
            }
            login_page(&session, &form.email, Some(format!("Login failed: {}", e.user_message())))
        }
    }
}

/// POST /admin/logout — end the remote session and return to the gate.
pub async fn logout(
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    if let Some(token) = get_access_token(&session) {
        if let Err(e) = state.service.sign_out(&token).await {
            log::warn!("Remote sign-out failed: {e}");
        }
    }
    clear_auth(&session);
    set_flash(&session, "Signed out");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin"))
        .finish())
}
