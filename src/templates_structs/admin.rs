use askama::Template;

use crate::models::{CatalogItem, MeetingRequest, NewCatalogItem};
use super::PageContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Catalog,
    Meetings,
}

impl AdminTab {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("meetings") => AdminTab::Meetings,
            _ => AdminTab::Catalog,
        }
    }

    pub fn is_catalog(&self) -> bool {
        *self == AdminTab::Catalog
    }
}

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/console.html")]
pub struct AdminConsoleTemplate {
    pub ctx: PageContext,
    pub tab: AdminTab,
    pub catalog: Vec<CatalogItem>,
    pub meetings: Vec<MeetingRequest>,
    pub new_item: NewCatalogItem,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin/confirm_delete.html")]
pub struct DeleteConfirmTemplate {
    pub ctx: PageContext,
    pub item: CatalogItem,
}
