use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::AppState;
use crate::errors::{AppError, render};
use crate::models::Lightbox;
use crate::remote::{Access, ListOrder};
use crate::templates_structs::{CatalogTemplate, PageContext};

#[derive(Deserialize)]
pub struct CatalogQuery {
    /// Item whose image is open in the lightbox.
    pub view: Option<i64>,
    pub fill: Option<String>,
}

impl CatalogQuery {
    fn fill(&self) -> bool {
        matches!(self.fill.as_deref(), Some("1" | "true" | "on"))
    }
}

/// GET /catalog — every catalog item, newest first. Re-fetched on each visit.
pub async fn index(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, AppError> {
    let items = match state.service.list_catalog(Access::Anonymous, ListOrder::NewestFirst).await {
        Ok(items) => items,
        Err(e) => {
            log::error!("Error fetching catalog: {e}");
            Vec::new()
        }
    };
    let lightbox = Lightbox::from_query(&items, query.view, query.fill());

    let tmpl = CatalogTemplate {
        ctx: PageContext::build(&session, "/catalog"),
        items,
        lightbox,
    };
    render(tmpl)
}
