use askama::Template;

use crate::booking::{BookingForm, BookingReceipt};
use crate::models::{CalendarMonth, OrgType};
use super::PageContext;

pub struct OrgOption {
    pub value: &'static str,
    pub selected: bool,
}

impl OrgOption {
    pub fn list(current: &str) -> Vec<OrgOption> {
        OrgType::ALL
            .iter()
            .map(|org| OrgOption {
                value: org.as_str(),
                selected: org.as_str() == current,
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "book_meeting.html")]
pub struct BookMeetingTemplate {
    pub ctx: PageContext,
    pub form: BookingForm,
    /// One-time id of this rendering of the form.
    pub submission_id: String,
    pub org_options: Vec<OrgOption>,
    pub calendar: CalendarMonth,
    /// Label for the selected day, when it is selectable.
    pub selected_label: Option<String>,
    pub errors: Vec<String>,
    /// Service failure from the last attempt.
    pub alert: Option<String>,
    pub receipt: Option<BookingReceipt>,
}

impl BookMeetingTemplate {
    pub fn show_chapter(&self) -> bool {
        self.form.org().is_some_and(|o| o.has_chapter())
    }

    pub fn show_custom_org(&self) -> bool {
        self.form.org() == Some(OrgType::Other)
    }

    pub fn submitted(&self) -> bool {
        self.receipt.is_some()
    }
}
