//! Shared test infrastructure.
//!
//! - `RecordingService` wraps the in-memory backend, counts the calls the
//!   portal makes and can be told to fail uploads, inserts or reads.
//! - `test_app!` builds the full actix app around a service.
//! - `Browser` carries the session cookie between requests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use async_trait::async_trait;
use chrono::NaiveDate;

use threadhouse::booking::BookingForm;
use threadhouse::models::{CatalogItem, MeetingRequest, NewCatalogItem, NewMeetingRequest};
use threadhouse::remote::{
    Access, AuthSession, AuthUser, DataService, ListOrder, MemoryService, RemoteError,
    RemoteResult, SharedService,
};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const ADMIN_PASS: &str = "correct-horse-battery";
pub const UPLOAD_BUCKET: &str = "meeting-uploads";
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

// ============================================================================
// RECORDING SERVICE
// ============================================================================

#[derive(Default)]
pub struct RecordingService {
    pub inner: MemoryService,
    pub uploads: AtomicUsize,
    pub meeting_inserts: AtomicUsize,
    pub catalog_inserts: AtomicUsize,
    pub catalog_deletes: AtomicUsize,
    pub fail_uploads: AtomicBool,
    pub fail_meeting_inserts: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl RecordingService {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn read_guard(&self) -> RemoteResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("read failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataService for RecordingService {
    async fn list_catalog(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<CatalogItem>> {
        self.read_guard()?;
        self.inner.list_catalog(access, order).await
    }

    async fn insert_catalog(&self, access: Access<'_>, item: &NewCatalogItem) -> RemoteResult<()> {
        self.catalog_inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_catalog(access, item).await
    }

    async fn delete_catalog(&self, access: Access<'_>, id: i64) -> RemoteResult<()> {
        self.catalog_deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_catalog(access, id).await
    }

    async fn list_meetings(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<MeetingRequest>> {
        self.read_guard()?;
        self.inner.list_meetings(access, order).await
    }

    async fn list_meeting_dates(&self, access: Access<'_>) -> RemoteResult<Vec<String>> {
        self.read_guard()?;
        self.inner.list_meeting_dates(access).await
    }

    async fn insert_meeting(&self, access: Access<'_>, record: &NewMeetingRequest) -> RemoteResult<()> {
        self.meeting_inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_meeting_inserts.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                message: "insert failed".to_string(),
            });
        }
        self.inner.insert_meeting(access, record).await
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 413,
                message: "Payload too large".to_string(),
            });
        }
        self.inner.upload_object(bucket, path, bytes, content_type).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }

    async fn current_user(&self, access_token: &str) -> RemoteResult<Option<AuthUser>> {
        self.inner.current_user(access_token).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> RemoteResult<()> {
        self.inner.sign_out(access_token).await
    }
}

/// A recording service with the admin account registered.
pub async fn seeded_service() -> Arc<RecordingService> {
    let service = RecordingService::default();
    service
        .inner
        .add_account(ADMIN_EMAIL, ADMIN_PASS)
        .await
        .expect("Failed to seed admin account");
    Arc::new(service)
}

pub fn shared(service: &Arc<RecordingService>) -> SharedService {
    service.clone()
}

/// Insert catalog items in order, signed in as the seeded admin.
pub async fn seed_catalog(service: &RecordingService, items: &[(&str, &str)]) {
    let session = service
        .inner
        .sign_in(ADMIN_EMAIL, ADMIN_PASS)
        .await
        .expect("Failed to sign in");
    for (title, category) in items {
        let item = NewCatalogItem::new(title, category, &format!("https://cdn.example.com/{category}.png"));
        service
            .inner
            .insert_catalog(Access::User(&session.access_token), &item)
            .await
            .expect("Failed to seed catalog");
    }
}

// ============================================================================
// FORMS
// ============================================================================

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A complete booking for an "Other" organization.
pub fn jane_doe_form(date: NaiveDate) -> BookingForm {
    BookingForm {
        name: "Jane Doe".into(),
        school: "Indiana University".into(),
        org_type: "Other".into(),
        chapter_name: String::new(),
        custom_organization: "Chess Club".into(),
        role: String::new(),
        phone: "555-0100".into(),
        email: "jane@example.com".into(),
        date: date.format("%Y-%m-%d").to_string(),
        message: "Need 40 hoodies".into(),
    }
}

/// A `multipart/form-data` body. Returns (content type header, body).
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let boundary = "----threadhouse-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"design\"; filename=\"{file_name}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

// ============================================================================
// HTTP
// ============================================================================

/// Build the full application around a service (cookie sessions, all routes).
#[macro_export]
macro_rules! test_app {
    ($service:expr) => {{
        let state = actix_web::web::Data::new(threadhouse::AppState::new(
            common::shared(&$service),
            common::UPLOAD_BUCKET,
        ));
        let limiter = actix_web::web::Data::new(threadhouse::auth::rate_limit::RateLimiter::new());
        let submissions = actix_web::web::Data::new(threadhouse::booking::SubmissionGuard::new());
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::generate(),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .app_data(state)
                .app_data(limiter)
                .app_data(submissions)
                .app_data(threadhouse::multipart_config(common::MAX_UPLOAD_BYTES))
                .configure(threadhouse::routes)
                .default_service(actix_web::web::to(threadhouse::handlers::pages::not_found)),
        )
        .await
    }};
}

/// Keeps the session cookie across requests, like a browser would.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, req: TestRequest) -> TestRequest {
        match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    pub fn remember<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            self.cookie = Some(cookie.into_owned());
        }
    }

    /// Keep the response's cookie and read it into a [`Page`].
    pub async fn page<B: MessageBody>(&mut self, resp: ServiceResponse<B>) -> Page {
        self.remember(&resp);
        let status = resp.status();
        let location = resp
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = test::read_body(resp).await;
        Page {
            status,
            location,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }
}

pub struct Page {
    pub status: StatusCode,
    pub location: String,
    pub body: String,
}

/// The CSRF token rendered into a page's forms.
pub fn csrf_from(html: &str) -> String {
    let re = regex::Regex::new(r#"name="csrf_token" value="([0-9a-f]{64})""#).expect("valid regex");
    re.captures(html)
        .map(|c| c[1].to_string())
        .expect("page has a CSRF token")
}

pub fn submission_id_from(html: &str) -> String {
    let re = regex::Regex::new(r#"name="submission_id" value="([0-9a-f]{32})""#).expect("valid regex");
    re.captures(html)
        .map(|c| c[1].to_string())
        .expect("booking form has a submission id")
}

pub fn form_body(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).expect("encodable form")
}

/// GET `$uri` through `$app` with the browser's cookie.
#[macro_export]
macro_rules! get {
    ($app:expr, $browser:expr, $uri:expr) => {{
        let req = $browser
            .request(actix_web::test::TestRequest::get().uri($uri))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        $browser.page(resp).await
    }};
}

/// POST an urlencoded form to `$uri` with the browser's cookie.
#[macro_export]
macro_rules! post_form {
    ($app:expr, $browser:expr, $uri:expr, $pairs:expr) => {{
        let req = $browser
            .request(
                actix_web::test::TestRequest::post()
                    .uri($uri)
                    .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
                    .set_payload(common::form_body($pairs)),
            )
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        $browser.page(resp).await
    }};
}

/// Sign in through the login form; leaves the browser holding the session.
#[macro_export]
macro_rules! sign_in {
    ($app:expr, $browser:expr) => {{
        let gate = get!($app, $browser, "/admin");
        let csrf = common::csrf_from(&gate.body);
        let page = post_form!(
            $app,
            $browser,
            "/admin/login",
            &[
                ("email", common::ADMIN_EMAIL),
                ("password", common::ADMIN_PASS),
                ("csrf_token", csrf.as_str()),
            ]
        );
        assert_eq!(page.status, actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(page.location, "/admin");
    }};
}
