use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::AppState;
use crate::auth::csrf;
use crate::auth::session::{clear_auth, get_access_token, set_flash};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::login_page;
use crate::models::NewCatalogItem;
use crate::remote::{Access, ListOrder};
use crate::templates_structs::{AdminConsoleTemplate, AdminTab, DeleteConfirmTemplate, PageContext};

#[derive(Deserialize)]
pub struct ConsoleQuery {
    pub tab: Option<String>,
}

#[derive(Deserialize)]
pub struct CatalogItemForm {
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
    /// "yes" to go ahead; anything else cancels.
    #[serde(default)]
    pub confirm: String,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Token from the cookie, only if the remote auth service still accepts it.
/// A token it rejects is dropped from the cookie.
async fn verified_token(state: &AppState, session: &Session) -> Option<String> {
    let token = get_access_token(session)?;
    match state.service.current_user(&token).await {
        Ok(Some(_)) => Some(token),
        Ok(None) => {
            log::warn!("Stored admin session is no longer valid");
            clear_auth(session);
            None
        }
        Err(e) => {
            log::error!("Failed to check admin session: {e}");
            None
        }
    }
}

/// Both read models, fetched independently. A failed read renders as empty.
async fn render_console(
    state: &AppState,
    session: &Session,
    token: &str,
    tab: AdminTab,
    new_item: NewCatalogItem,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let access = Access::User(token);
    let (catalog, meetings) = tokio::join!(
        state.service.list_catalog(access, ListOrder::NewestFirst),
        state.service.list_meetings(access, ListOrder::NewestFirst),
    );
    let catalog = catalog.unwrap_or_else(|e| {
        log::error!("Error fetching catalog: {e}");
        Vec::new()
    });
    let meetings = meetings.unwrap_or_else(|e| {
        log::error!("Error fetching meetings: {e}");
        Vec::new()
    });

    let tmpl = AdminConsoleTemplate {
        ctx: PageContext::build(session, "/admin"),
        tab,
        catalog,
        meetings,
        new_item,
        errors,
    };
    render(tmpl)
}

/// GET /admin — session gate, then the console.
pub async fn console(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<ConsoleQuery>,
) -> Result<HttpResponse, AppError> {
    let Some(token) = verified_token(&state, &session).await else {
        return login_page(&session, "", None);
    };
    let tab = AdminTab::parse(query.tab.as_deref());
    render_console(&state, &session, &token, tab, NewCatalogItem::default(), vec![]).await
}

/// POST /admin/catalog — add a catalog item, then re-fetch.
pub async fn create_item(
    state: web::Data<AppState>,
    session: Session,
    form: web::Form<CatalogItemForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let Some(token) = get_access_token(&session) else {
        return Ok(redirect("/admin"));
    };

    let item = NewCatalogItem::new(&form.title, &form.category, &form.image_url);
    let errors = item.validate();
    if !errors.is_empty() {
        return render_console(&state, &session, &token, AdminTab::Catalog, item, errors).await;
    }

    match state.service.insert_catalog(Access::User(&token), &item).await {
        Ok(()) => {
            log::info!("Catalog item '{}' added", item.title);
            set_flash(&session, format!("Added '{}'", item.title));
            Ok(redirect("/admin?tab=catalog"))
        }
        Err(e) => {
            log::error!("Error adding catalog item: {e}");
            let errors = vec![format!("Error adding item: {}", e.user_message())];
            render_console(&state, &session, &token, AdminTab::Catalog, item, errors).await
        }
    }
}

/// GET /admin/catalog/{id}/delete — confirmation step; issues no delete.
pub async fn confirm_delete(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let Some(token) = get_access_token(&session) else {
        return Ok(redirect("/admin"));
    };
    let id = path.into_inner();

    let items = match state.service.list_catalog(Access::User(&token), ListOrder::Unordered).await {
        Ok(items) => items,
        Err(e) => {
            log::error!("Error fetching catalog: {e}");
            Vec::new()
        }
    };
    let Some(item) = items.into_iter().find(|i| i.id == id) else {
        set_flash(&session, "That item no longer exists");
        return Ok(redirect("/admin?tab=catalog"));
    };

    let tmpl = DeleteConfirmTemplate {
        ctx: PageContext::build(&session, "/admin"),
        item,
    };
    render(tmpl)
}

/// POST /admin/catalog/{id}/delete — deletes only when confirmed.
pub async fn delete_item(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let Some(token) = get_access_token(&session) else {
        return Ok(redirect("/admin"));
    };
    let id = path.into_inner();

    if form.confirm != "yes" {
        set_flash(&session, "Delete cancelled");
        return Ok(redirect("/admin?tab=catalog"));
    }

    match state.service.delete_catalog(Access::User(&token), id).await {
        Ok(()) => {
            log::info!("Catalog item {id} deleted");
            set_flash(&session, "Item deleted");
        }
        Err(e) => {
            log::error!("Error deleting catalog item {id}: {e}");
            set_flash(&session, format!("Error deleting item: {}", e.user_message()));
        }
    }
    Ok(redirect("/admin?tab=catalog"))
}
