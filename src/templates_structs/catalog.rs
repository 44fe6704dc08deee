use askama::Template;

use crate::models::{CatalogItem, Lightbox};
use super::PageContext;

#[derive(Template)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub ctx: PageContext,
    pub items: Vec<CatalogItem>,
    pub lightbox: Option<Lightbox>,
}
