use std::collections::HashSet;

use chrono::{Datelike, Duration, Local, NaiveDate};

use super::meeting::parse_meeting_date;

/// Calendar-day key, e.g. `Tue Jun 10 2025`. Time of day never enters it.
pub fn day_string(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Start of the current local day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Days already claimed by an existing meeting request.
///
/// Derived from a point-in-time read of the meetings collection. Membership is
/// keyed on the day string; entries are only ever added.
#[derive(Debug, Clone, Default)]
pub struct BookedDates {
    days: HashSet<String>,
}

impl BookedDates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from stored meeting `date` values. Unparseable values are skipped.
    pub fn from_stored<I, S>(raw_dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for raw in raw_dates {
            match parse_meeting_date(raw.as_ref()) {
                Some(day) => set.insert(day),
                None => log::warn!("Ignoring unparseable meeting date '{}'", raw.as_ref()),
            }
        }
        set
    }

    pub fn insert(&mut self, day: NaiveDate) {
        self.days.insert(day_string(day));
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day_string(day))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// A day is not selectable when it lies before `today` or is already booked.
    pub fn is_disabled(&self, candidate: NaiveDate, today: NaiveDate) -> bool {
        candidate < today || self.contains(candidate)
    }
}

/// One cell of the booking calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub disabled: bool,
    pub selected: bool,
    pub is_today: bool,
}

impl CalendarDay {
    pub fn value(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }
}

/// Month view for the booking page: Sunday-first weeks padded with the
/// neighbouring months' days.
#[derive(Debug, Clone)]
pub struct CalendarMonth {
    pub first: NaiveDate,
    pub weeks: Vec<Vec<CalendarDay>>,
}

impl CalendarMonth {
    pub fn build(
        month: NaiveDate,
        booked: &BookedDates,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> Self {
        let first = first_of_month(month);
        let lead = first.weekday().num_days_from_sunday() as i64;
        let mut cursor = first - Duration::days(lead);

        let mut weeks = Vec::new();
        loop {
            let mut week = Vec::with_capacity(7);
            for _ in 0..7 {
                week.push(CalendarDay {
                    date: cursor,
                    in_month: cursor.month() == first.month() && cursor.year() == first.year(),
                    disabled: booked.is_disabled(cursor, today),
                    selected: selected == Some(cursor),
                    is_today: cursor == today,
                });
                cursor += Duration::days(1);
            }
            weeks.push(week);
            if cursor.month() != first.month() || cursor.year() != first.year() {
                break;
            }
        }

        Self { first, weeks }
    }

    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// `YYYY-MM` key of the current month.
    pub fn key(&self) -> String {
        month_key(self.first)
    }

    pub fn prev_key(&self) -> String {
        month_key(self.first - Duration::days(1))
    }

    pub fn next_key(&self) -> String {
        let days_in_month = days_in_month(self.first);
        month_key(self.first + Duration::days(days_in_month))
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse a `YYYY-MM` month key into the first day of that month.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", key.trim()), "%Y-%m-%d").ok()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn days_in_month(first: NaiveDate) -> i64 {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .map(|next| (next - first).num_days())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_string_matches_calendar_format() {
        assert_eq!(day_string(day(2025, 6, 10)), "Tue Jun 10 2025");
        assert_eq!(day_string(day(2026, 1, 5)), "Mon Jan 05 2026");
    }

    #[test]
    fn past_days_are_disabled() {
        let booked = BookedDates::new();
        let today = day(2025, 6, 10);
        assert!(booked.is_disabled(day(2025, 6, 9), today));
        assert!(!booked.is_disabled(today, today));
        assert!(!booked.is_disabled(day(2025, 6, 11), today));
    }

    #[test]
    fn booked_days_are_disabled_regardless_of_time() {
        let booked = BookedDates::from_stored(["2025-06-12T17:00:00", "2025-06-20T09:30:00", "garbage"]);
        let today = day(2025, 6, 10);
        assert_eq!(booked.len(), 2);
        assert!(booked.is_disabled(day(2025, 6, 12), today));
        assert!(booked.is_disabled(day(2025, 6, 20), today));
        assert!(!booked.is_disabled(day(2025, 6, 13), today));
    }

    #[test]
    fn timestamptz_rows_book_the_written_day() {
        let booked = BookedDates::from_stored(["2025-06-10T17:00:00+00:00", "2025-06-14 17:00:00+00"]);
        assert!(booked.contains(day(2025, 6, 10)));
        assert!(!booked.contains(day(2025, 6, 11)));
        assert!(booked.contains(day(2025, 6, 14)));
        assert!(!booked.contains(day(2025, 6, 15)));
    }

    #[test]
    fn insert_is_append_only() {
        let mut booked = BookedDates::new();
        booked.insert(day(2025, 7, 1));
        booked.insert(day(2025, 7, 1));
        assert_eq!(booked.len(), 1);
        assert!(booked.contains(day(2025, 7, 1)));
    }

    #[test]
    fn calendar_pads_to_full_weeks() {
        // June 2025 starts on a Sunday and ends on a Monday.
        let cal = CalendarMonth::build(day(2025, 6, 18), &BookedDates::new(), day(2025, 6, 10), None);
        assert_eq!(cal.title(), "June 2025");
        assert_eq!(cal.weeks.len(), 5);
        assert!(cal.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(cal.weeks[0][0].date, day(2025, 6, 1));
        let last = &cal.weeks[4][6];
        assert_eq!(last.date, day(2025, 7, 5));
        assert!(!last.in_month);
    }

    #[test]
    fn calendar_flags_disabled_and_selected() {
        let mut booked = BookedDates::new();
        booked.insert(day(2025, 6, 12));
        let cal = CalendarMonth::build(
            day(2025, 6, 1),
            &booked,
            day(2025, 6, 10),
            Some(day(2025, 6, 11)),
        );
        let cells: Vec<&CalendarDay> = cal.weeks.iter().flatten().collect();
        let find = |d: NaiveDate| cells.iter().find(|c| c.date == d).unwrap();
        assert!(find(day(2025, 6, 9)).disabled);
        assert!(find(day(2025, 6, 12)).disabled);
        assert!(find(day(2025, 6, 10)).is_today);
        assert!(find(day(2025, 6, 11)).selected);
        assert!(!find(day(2025, 6, 11)).disabled);
    }

    #[test]
    fn month_navigation_keys() {
        let cal = CalendarMonth::build(day(2025, 12, 3), &BookedDates::new(), day(2025, 12, 1), None);
        assert_eq!(cal.key(), "2025-12");
        assert_eq!(cal.prev_key(), "2025-11");
        assert_eq!(cal.next_key(), "2026-01");
        assert_eq!(parse_month_key("2026-02"), Some(day(2026, 2, 1)));
        assert_eq!(parse_month_key("2026-13"), None);
    }
}
