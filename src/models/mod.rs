pub mod availability;
pub mod catalog;
pub mod lightbox;
pub mod meeting;

pub use availability::{BookedDates, CalendarDay, CalendarMonth};
pub use catalog::{CatalogItem, NewCatalogItem};
pub use lightbox::Lightbox;
pub use meeting::{MeetingRequest, NewMeetingRequest, OrgType};
