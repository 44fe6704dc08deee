// Template context structures for Askama templates, organized by page.

use actix_session::Session;
use chrono::{Datelike, Local};

use crate::auth::csrf;
use crate::auth::session::{get_admin_email, take_flash};

mod admin;
mod booking;
mod catalog;
mod common;

pub use self::admin::{AdminConsoleTemplate, AdminLoginTemplate, AdminTab, DeleteConfirmTemplate};
pub use self::booking::{BookMeetingTemplate, OrgOption};
pub use self::catalog::CatalogTemplate;
pub use self::common::{FEATURES, Feature, HomeTemplate, NotFoundTemplate, PROCESS, ProcessStep};

pub const APP_NAME: &str = "Seb's Apparel Manufacturing";

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Common context shared by every page.
/// Templates access these as `ctx.app_name`, `ctx.nav`, etc.
pub struct PageContext {
    pub app_name: &'static str,
    pub nav: Vec<NavLink>,
    pub flash: Option<String>,
    pub csrf_token: String,
    pub admin_email: Option<String>,
    pub year: i32,
}

impl PageContext {
    pub fn build(session: &Session, current_path: &str) -> Self {
        let nav = [("/catalog", "Catalog"), ("/book-meeting", "Book a Meeting")]
            .into_iter()
            .map(|(href, label)| NavLink {
                href,
                label,
                active: current_path == href,
            })
            .collect();
        Self {
            app_name: APP_NAME,
            nav,
            flash: take_flash(session),
            csrf_token: csrf::get_or_create_token(session),
            admin_email: get_admin_email(session),
            year: Local::now().year(),
        }
    }
}
