use actix_session::Session;

use crate::errors::AppError;
use crate::remote::AuthSession;

const ACCESS_TOKEN_KEY: &str = "access_token";
const ADMIN_EMAIL_KEY: &str = "admin_email";
const FLASH_KEY: &str = "flash";

/// The admin's access token, if this browser has signed in.
pub fn get_access_token(session: &Session) -> Option<String> {
    session.get::<String>(ACCESS_TOKEN_KEY).unwrap_or(None)
}

pub fn get_admin_email(session: &Session) -> Option<String> {
    session.get::<String>(ADMIN_EMAIL_KEY).unwrap_or(None)
}

/// Remember a successful sign-in in the cookie session.
pub fn store_auth(session: &Session, auth: &AuthSession) -> Result<(), AppError> {
    session.renew();
    session
        .insert(ACCESS_TOKEN_KEY, &auth.access_token)
        .map_err(|e| AppError::Session(format!("Failed to store access token: {e}")))?;
    session
        .insert(ADMIN_EMAIL_KEY, auth.user.display_email())
        .map_err(|e| AppError::Session(format!("Failed to store admin email: {e}")))?;
    Ok(())
}

/// Forget the admin session but keep the CSRF token so open forms still post.
pub fn clear_auth(session: &Session) {
    session.remove(ACCESS_TOKEN_KEY);
    session.remove(ADMIN_EMAIL_KEY);
}

/// Queue a one-shot message for the next page. A failed write only loses
/// the message, so it is logged rather than returned.
pub fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(FLASH_KEY, message.into()) {
        log::warn!("Failed to store flash message: {e}");
    }
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}
