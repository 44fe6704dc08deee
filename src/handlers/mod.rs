pub mod admin_handlers;
pub mod auth_handlers;
pub mod booking_handlers;
pub mod catalog_handlers;
pub mod pages;
