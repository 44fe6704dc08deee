use actix_session::Session;
use actix_web::HttpResponse;
use askama::Template;

use crate::errors::{AppError, render};
use crate::templates_structs::{FEATURES, HomeTemplate, NotFoundTemplate, PROCESS, PageContext};

/// GET / — landing page.
pub async fn home(session: Session) -> Result<HttpResponse, AppError> {
    let tmpl = HomeTemplate {
        ctx: PageContext::build(&session, "/"),
        tagline: "custom apparel for fraternities & sororities",
        features: &FEATURES,
        steps: &PROCESS,
    };
    render(tmpl)
}

pub async fn not_found(session: Session) -> Result<HttpResponse, AppError> {
    let html = NotFoundTemplate {
        ctx: PageContext::build(&session, ""),
    }
    .render()?;
    Ok(HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
