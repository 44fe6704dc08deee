//! Meeting booking workflow: validation, optional design upload, record insert.
//!
//! A [`BookingController`] is built per request from a fresh read of the
//! meetings collection. It owns the booked-date set for that view and walks
//! the submission through `Idle -> Editing -> Submitting -> Succeeded | Failed`.
//!
//! Two browsers can still book the same day: the booked set is a
//! point-in-time read and the meetings collection has no uniqueness rule.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use rand::Rng;

use crate::auth::validate::{non_blank, validate_email, validate_optional, validate_required};
use crate::models::availability::{self, BookedDates};
use crate::models::meeting::{OrgType, meeting_slot};
use crate::models::NewMeetingRequest;
use crate::remote::{Access, RemoteError, SharedService};

const REFERENCE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const REFERENCE_LEN: usize = 9;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const MAX_EXTENSION_LEN: usize = 10;
/// How long a used submission id is remembered.
const SUBMISSION_TTL: Duration = Duration::from_secs(6 * 3600);

/// Raw booking form fields as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub name: String,
    pub school: String,
    pub org_type: String,
    pub chapter_name: String,
    pub custom_organization: String,
    pub role: String,
    pub phone: String,
    pub email: String,
    /// Selected calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub message: String,
}

impl BookingForm {
    pub fn selected_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn org(&self) -> Option<OrgType> {
        OrgType::parse(&self.org_type)
    }

    /// The organization actually stored: the free-text name for "Other",
    /// otherwise the selection itself.
    pub fn effective_organization(&self) -> Option<String> {
        match self.org()? {
            OrgType::Other => non_blank(&self.custom_organization),
            org => Some(org.as_str().to_string()),
        }
    }
}

/// An uploaded design file.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Browsers send an empty part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.file_name.trim().is_empty()
    }

    /// Text after the last `.` (the whole name when there is none), kept only
    /// when it is 1 to 10 ASCII letters or digits. The name comes from the
    /// client, so anything else never reaches the storage key.
    pub fn extension(&self) -> Option<&str> {
        let candidate = self.file_name.rsplit('.').next().unwrap_or(&self.file_name);
        let safe = !candidate.is_empty()
            && candidate.len() <= MAX_EXTENSION_LEN
            && candidate.bytes().all(|b| b.is_ascii_alphanumeric());
        safe.then_some(candidate)
    }

    /// Storage path: upload time in milliseconds plus the extension, if safe.
    pub fn storage_path(&self, unix_millis: i64) -> String {
        match self.extension() {
            Some(ext) => format!("{unix_millis}.{ext}"),
            None => unix_millis.to_string(),
        }
    }
}

/// Confirmation shown after a successful booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub reference: String,
    pub name: String,
    pub school: String,
    /// Chapter name when given, otherwise the organization.
    pub organization: String,
    pub day: NaiveDate,
    pub record: NewMeetingRequest,
}

impl BookingReceipt {
    pub fn day_label(&self) -> String {
        availability::day_string(self.day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingState {
    Idle,
    Editing,
    Submitting,
    Succeeded(BookingReceipt),
    /// Carries the user-facing failure; the form stays populated for a retry.
    Failed(String),
}

#[derive(Debug)]
pub enum BookingError {
    Invalid(Vec<String>),
    AlreadySubmitted,
    Upload(RemoteError),
    Insert(RemoteError),
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingError::Invalid(errors) => write!(f, "Please fix the form: {}", errors.join("; ")),
            BookingError::AlreadySubmitted => write!(f, "This request has already been sent"),
            BookingError::Upload(e) => write!(f, "Failed to upload your design: {e}"),
            BookingError::Insert(e) => write!(f, "Failed to book meeting. Please try again. ({e})"),
        }
    }
}

impl std::error::Error for BookingError {}

pub struct BookingController {
    service: SharedService,
    bucket: String,
    booked: BookedDates,
    today: NaiveDate,
    state: BookingState,
}

impl BookingController {
    /// Read the booked days for this view. A failed read is logged and
    /// treated as "nothing booked".
    pub async fn load(service: SharedService, bucket: &str) -> Self {
        let booked = match service.list_meeting_dates(Access::Anonymous).await {
            Ok(dates) => BookedDates::from_stored(dates),
            Err(e) => {
                log::error!("Failed to load booked dates: {e}");
                BookedDates::new()
            }
        };
        Self::with_booked(service, bucket, booked, availability::today())
    }

    pub fn with_booked(
        service: SharedService,
        bucket: &str,
        booked: BookedDates,
        today: NaiveDate,
    ) -> Self {
        Self {
            service,
            bucket: bucket.to_string(),
            booked,
            today,
            state: BookingState::Idle,
        }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn booked(&self) -> &BookedDates {
        &self.booked
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn is_disabled(&self, day: NaiveDate) -> bool {
        self.booked.is_disabled(day, self.today)
    }

    /// A field edit; a failed submission returns here for the retry.
    pub fn edit(&mut self) {
        if matches!(self.state, BookingState::Idle | BookingState::Failed(_)) {
            self.state = BookingState::Editing;
        }
    }

    /// Local checks only; nothing is sent when this fails.
    pub fn validate(&self, form: &BookingForm) -> Result<NaiveDate, Vec<String>> {
        let mut errors: Vec<String> = [
            validate_required(&form.name, "Name", 200),
            validate_required(&form.school, "School", 200),
            validate_required(&form.phone, "Phone", 50),
            validate_email(&form.email),
            validate_required(&form.message, "Message", 5000),
            validate_optional(&form.role, "Organization role", 200),
        ]
        .into_iter()
        .flatten()
        .collect();

        match form.org() {
            None => errors.push("Organization is required".to_string()),
            Some(org) if org.has_chapter() => {
                errors.extend(validate_required(&form.chapter_name, "Chapter name", 200));
            }
            Some(_) => {
                errors.extend(validate_required(&form.custom_organization, "Organization name", 200));
            }
        }

        let day = match form.selected_day() {
            None => {
                errors.push("Please select an available date".to_string());
                None
            }
            Some(day) if self.is_disabled(day) => {
                errors.push(format!("{} is not available", availability::day_string(day)));
                None
            }
            Some(day) => Some(day),
        };

        match day {
            Some(day) if errors.is_empty() => Ok(day),
            _ => Err(errors),
        }
    }

    /// Run the whole submission. On success the booked day joins this view's
    /// booked set.
    pub async fn submit(
        &mut self,
        form: &BookingForm,
        attachment: Option<Attachment>,
    ) -> Result<BookingReceipt, BookingError> {
        if matches!(self.state, BookingState::Submitting | BookingState::Succeeded(_)) {
            return Err(BookingError::AlreadySubmitted);
        }
        self.edit();

        let day = self.validate(form).map_err(BookingError::Invalid)?;
        // Checked by validate().
        let organization = form.effective_organization().unwrap_or_default();
        self.state = BookingState::Submitting;

        let attachment = attachment.filter(|a| !a.is_empty());
        let (file_name, file_url) = match attachment {
            Some(file) => match self.upload(file).await {
                Ok((name, url)) => (Some(name), Some(url)),
                Err(e) => return Err(self.fail(BookingError::Upload(e))),
            },
            None => (None, None),
        };

        let chapter_name = form
            .org()
            .filter(OrgType::has_chapter)
            .and_then(|_| non_blank(&form.chapter_name));

        let record = NewMeetingRequest {
            name: form.name.trim().to_string(),
            school: form.school.trim().to_string(),
            organization,
            chapter_name,
            role: non_blank(&form.role),
            phone: form.phone.trim().to_string(),
            email: form.email.trim().to_string(),
            date: meeting_slot(day),
            message: form.message.trim().to_string(),
            file_name,
            file_url,
        };

        if let Err(e) = self.service.insert_meeting(Access::Anonymous, &record).await {
            return Err(self.fail(BookingError::Insert(e)));
        }

        self.booked.insert(day);
        let receipt = BookingReceipt {
            reference: new_reference(),
            name: record.name.clone(),
            school: record.school.clone(),
            organization: record
                .chapter_name
                .clone()
                .unwrap_or_else(|| record.organization.clone()),
            day,
            record,
        };
        log::info!(
            "Meeting booked for {} (ref {})",
            receipt.day_label(),
            receipt.reference
        );
        self.state = BookingState::Succeeded(receipt.clone());
        Ok(receipt)
    }

    async fn upload(&self, file: Attachment) -> Result<(String, String), RemoteError> {
        let path = file.storage_path(Utc::now().timestamp_millis());
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        self.service
            .upload_object(&self.bucket, &path, file.bytes, &content_type)
            .await?;
        let url = self.service.public_url(&self.bucket, &path);
        Ok((file.file_name, url))
    }

    fn fail(&mut self, err: BookingError) -> BookingError {
        log::error!("Booking failed: {err}");
        self.state = BookingState::Failed(err.to_string());
        err
    }
}

/// Ids of rendered booking forms whose submission is in flight or done.
///
/// Every render of the form carries a fresh id. A second POST with the same
/// id (a double click, a resend) is refused before any service call. Shared
/// by all workers so concurrent duplicates are caught too.
pub struct SubmissionGuard {
    claimed: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::with_ttl(SUBMISSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            claimed: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Mark the id as submitting. False when it is already claimed.
    pub fn claim(&self, id: &str) -> bool {
        let mut map = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        map.retain(|_, at| now.duration_since(*at) < self.ttl);
        if map.contains_key(id) {
            return false;
        }
        map.insert(id.to_string(), now);
        true
    }

    /// Hand the id back after a failed attempt so the same form can retry.
    pub fn release(&self, id: &str) {
        let mut map = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(id);
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fresh id for one rendering of the booking form.
pub fn new_submission_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

fn new_reference() -> String {
    let mut rng = rand::rng();
    (0..REFERENCE_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.random_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect()
}
