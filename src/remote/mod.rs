//! Client-side contract of the hosted backend (auth, record storage, blob storage).
//!
//! Handlers only ever talk to [`DataService`]; `SupabaseService` speaks the
//! hosted HTTP API and `MemoryService` keeps everything in process for
//! development and tests.

pub mod memory;
pub mod supabase;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{CatalogItem, MeetingRequest, NewCatalogItem, NewMeetingRequest};

pub use memory::MemoryService;
pub use supabase::SupabaseService;

pub const CATALOG_TABLE: &str = "catalog_items";
pub const MEETINGS_TABLE: &str = "meetings";

/// Credential a call is made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Public (anon key) access.
    Anonymous,
    /// An admin's access token from a successful sign-in.
    User(&'a str),
}

impl<'a> Access<'a> {
    pub fn token(&self) -> Option<&'a str> {
        match self {
            Access::Anonymous => None,
            Access::User(token) => Some(token),
        }
    }
}

/// Row ordering for "select all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Unordered,
    /// `created_at` descending.
    NewestFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn display_email(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug)]
pub enum RemoteError {
    Transport(reqwest::Error),
    Status { status: u16, message: String },
    Unauthorized(String),
    NotFound,
    Decode(String),
    Unavailable(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transport(e) => write!(f, "Transport error: {e}"),
            RemoteError::Status { status, message } => write!(f, "Service error ({status}): {message}"),
            RemoteError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            RemoteError::NotFound => write!(f, "Not found"),
            RemoteError::Decode(msg) => write!(f, "Invalid response: {msg}"),
            RemoteError::Unavailable(msg) => write!(f, "Service unavailable: {msg}"),
        }
    }
}

impl RemoteError {
    /// The service's own wording, for alerts shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Status { message, .. }
            | RemoteError::Unauthorized(message)
            | RemoteError::Unavailable(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e)
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait DataService: Send + Sync {
    async fn list_catalog(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<CatalogItem>>;
    async fn insert_catalog(&self, access: Access<'_>, item: &NewCatalogItem) -> RemoteResult<()>;
    async fn delete_catalog(&self, access: Access<'_>, id: i64) -> RemoteResult<()>;

    async fn list_meetings(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<MeetingRequest>>;
    /// Raw `date` column of every meeting.
    async fn list_meeting_dates(&self, access: Access<'_>) -> RemoteResult<Vec<String>>;
    async fn insert_meeting(&self, access: Access<'_>, record: &NewMeetingRequest) -> RemoteResult<()>;

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// "Get current session": the user the token belongs to, `None` when the
    /// token is no longer valid.
    async fn current_user(&self, access_token: &str) -> RemoteResult<Option<AuthUser>>;
    async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<AuthSession>;
    async fn sign_out(&self, access_token: &str) -> RemoteResult<()>;
}

pub type SharedService = Arc<dyn DataService>;
