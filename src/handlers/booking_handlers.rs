use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};
use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::AppState;
use crate::auth::csrf;
use crate::booking::{
    Attachment, BookingController, BookingError, BookingForm, BookingReceipt, SubmissionGuard,
    new_submission_id,
};
use crate::errors::{AppError, render};
use crate::models::availability::{self, CalendarMonth, parse_month_key};
use crate::templates_structs::{BookMeetingTemplate, OrgOption, PageContext};

const STALE_FORM: &str = "This form has expired. Please reload the page and try again.";

/// Query of the booking page. Month navigation submits the form with GET, so
/// whatever was typed comes along and is written back into the fields.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct BookingQuery {
    pub month: Option<String>,
    pub name: String,
    pub school: String,
    #[serde(rename = "orgType")]
    pub org_type: String,
    #[serde(rename = "chapterName")]
    pub chapter_name: String,
    #[serde(rename = "customOrganization")]
    pub custom_organization: String,
    pub role: String,
    pub phone: String,
    pub email: String,
    pub date: String,
    pub message: String,
}

impl BookingQuery {
    fn into_parts(self) -> (Option<NaiveDate>, BookingForm) {
        let month = self.month.as_deref().and_then(parse_month_key);
        let form = BookingForm {
            name: self.name,
            school: self.school,
            org_type: self.org_type,
            chapter_name: self.chapter_name,
            custom_organization: self.custom_organization,
            role: self.role,
            phone: self.phone,
            email: self.email,
            date: self.date,
            message: self.message,
        };
        (month, form)
    }
}

/// Multipart body of the booking form. Every text field is optional here so
/// that missing values come back as validation messages rather than a 400.
#[derive(MultipartForm)]
pub struct BookingUpload {
    pub csrf_token: Option<Text<String>>,
    pub submission_id: Option<Text<String>>,
    pub name: Option<Text<String>>,
    pub school: Option<Text<String>>,
    #[multipart(rename = "orgType")]
    pub org_type: Option<Text<String>>,
    #[multipart(rename = "chapterName")]
    pub chapter_name: Option<Text<String>>,
    #[multipart(rename = "customOrganization")]
    pub custom_organization: Option<Text<String>>,
    pub role: Option<Text<String>>,
    pub phone: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub date: Option<Text<String>>,
    pub message: Option<Text<String>>,
    pub design: Option<Bytes>,
}

fn text(field: Option<Text<String>>) -> String {
    field.map(|t| t.0).unwrap_or_default()
}

impl BookingUpload {
    fn into_parts(self) -> (String, String, BookingForm, Option<Attachment>) {
        let attachment = self.design.map(|file| Attachment {
            file_name: file.file_name.unwrap_or_default(),
            content_type: file.content_type.map(|m| m.to_string()),
            bytes: file.data.to_vec(),
        });
        let form = BookingForm {
            name: text(self.name),
            school: text(self.school),
            org_type: text(self.org_type),
            chapter_name: text(self.chapter_name),
            custom_organization: text(self.custom_organization),
            role: text(self.role),
            phone: text(self.phone),
            email: text(self.email),
            date: text(self.date),
            message: text(self.message),
        };
        (text(self.csrf_token), text(self.submission_id), form, attachment)
    }
}

struct BookingView {
    form: BookingForm,
    month: Option<NaiveDate>,
    errors: Vec<String>,
    alert: Option<String>,
    receipt: Option<BookingReceipt>,
}

fn render_booking(
    session: &Session,
    controller: &BookingController,
    view: BookingView,
) -> Result<HttpResponse, AppError> {
    let selected = view.form.selected_day();
    let month = view.month.or(selected).unwrap_or_else(|| controller.today());
    let calendar = CalendarMonth::build(month, controller.booked(), controller.today(), selected);

    // After a successful booking the chosen day is taken, so no "Selected" line.
    let selected_label = selected
        .filter(|day| !controller.is_disabled(*day))
        .map(availability::day_string);

    let tmpl = BookMeetingTemplate {
        ctx: PageContext::build(session, "/book-meeting"),
        org_options: OrgOption::list(&view.form.org_type),
        form: view.form,
        submission_id: new_submission_id(),
        calendar,
        selected_label,
        errors: view.errors,
        alert: view.alert,
        receipt: view.receipt,
    };
    render(tmpl)
}

/// GET /book-meeting — booking form with the availability calendar.
pub async fn form(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse, AppError> {
    let controller = BookingController::load(state.service.clone(), &state.upload_bucket).await;
    let (month, form) = query.into_inner().into_parts();
    let view = BookingView {
        form,
        month,
        errors: vec![],
        alert: None,
        receipt: None,
    };
    render_booking(&session, &controller, view)
}

/// POST /book-meeting — validate, upload the optional design, insert the meeting.
///
/// Each rendered form carries a submission id; a repeated POST of the same
/// form is answered without touching the service.
pub async fn submit(
    state: web::Data<AppState>,
    session: Session,
    guard: web::Data<SubmissionGuard>,
    MultipartForm(upload): MultipartForm<BookingUpload>,
) -> Result<HttpResponse, AppError> {
    let (csrf_token, submission_id, form, attachment) = upload.into_parts();
    csrf::validate_csrf(&session, &csrf_token)?;

    let mut controller = BookingController::load(state.service.clone(), &state.upload_bucket).await;
    let mut view = BookingView {
        form,
        month: None,
        errors: vec![],
        alert: None,
        receipt: None,
    };

    if submission_id.is_empty() {
        view.alert = Some(STALE_FORM.to_string());
        return render_booking(&session, &controller, view);
    }
    if !guard.claim(&submission_id) {
        log::warn!("Ignoring repeated booking submission");
        view.alert = Some(BookingError::AlreadySubmitted.to_string());
        return render_booking(&session, &controller, view);
    }

    match controller.submit(&view.form, attachment).await {
        Ok(receipt) => view.receipt = Some(receipt),
        Err(e) => {
            guard.release(&submission_id);
            match e {
                BookingError::Invalid(errors) => view.errors = errors,
                e => view.alert = Some(e.to_string()),
            }
        }
    }
    render_booking(&session, &controller, view)
}
