use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// All meetings occupy a single daily slot at 17:00 local time.
pub const MEETING_HOUR: u32 = 17;

/// Wire format for the `date` column of inserted meetings.
pub const MEETING_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Organization selection on the booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgType {
    Fraternity,
    Sorority,
    Other,
}

impl OrgType {
    pub const ALL: [OrgType; 3] = [OrgType::Fraternity, OrgType::Sorority, OrgType::Other];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Fraternity" => Some(OrgType::Fraternity),
            "Sorority" => Some(OrgType::Sorority),
            "Other" => Some(OrgType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Fraternity => "Fraternity",
            OrgType::Sorority => "Sorority",
            OrgType::Other => "Other",
        }
    }

    /// Greek chapters are asked for their chapter name.
    pub fn has_chapter(&self) -> bool {
        matches!(self, OrgType::Fraternity | OrgType::Sorority)
    }
}

/// A booked meeting as returned by the `meetings` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingRequest {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organization: String,
    #[serde(default, rename = "chapterName")]
    pub chapter_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl MeetingRequest {
    /// Calendar day of the meeting, if the stored value parses.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_meeting_date(&self.date)
    }

    /// Human-readable meeting day for listings; falls back to the raw value.
    pub fn display_date(&self) -> String {
        match self.day() {
            Some(d) => super::availability::day_string(d),
            None => self.date.clone(),
        }
    }

    pub fn submitted_on(&self) -> String {
        self.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }

    pub fn file_label(&self) -> &str {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "None",
        }
    }
}

/// Typed insert payload for the `meetings` collection.
///
/// Absent optional fields are left out of the JSON body entirely.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewMeetingRequest {
    pub name: String,
    pub school: String,
    pub organization: String,
    #[serde(rename = "chapterName", skip_serializing_if = "Option::is_none")]
    pub chapter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub phone: String,
    pub email: String,
    #[serde(serialize_with = "serialize_meeting_date")]
    pub date: NaiveDateTime,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Merge the fixed daily slot onto a selected day.
pub fn meeting_slot(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(MEETING_HOUR, 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Parse a stored meeting date down to its calendar day.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.f]` values and
/// bare `YYYY-MM-DD` dates. Slots are written as naive wall-clock times and a
/// `timestamptz` column hands them back with an offset attached, so an offset
/// value is read by its own wall-clock day, never shifted into server time.
pub fn parse_meeting_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    // Postgres renders timestamptz with a space separator and a short offset.
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn serialize_meeting_date<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format(MEETING_DATE_FORMAT).to_string())
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
