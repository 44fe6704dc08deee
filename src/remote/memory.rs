use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;

use super::{
    Access, AuthSession, AuthUser, DataService, ListOrder, RemoteError, RemoteResult,
};
use crate::auth::password;
use crate::models::meeting::MEETING_DATE_FORMAT;
use crate::models::{CatalogItem, MeetingRequest, NewCatalogItem, NewMeetingRequest};

/// An uploaded blob.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

struct Account {
    id: String,
    email: String,
    password_hash: String,
}

#[derive(Default)]
struct State {
    catalog: Vec<CatalogItem>,
    meetings: Vec<MeetingRequest>,
    objects: HashMap<String, StoredObject>,
    accounts: Vec<Account>,
    /// access token -> account id
    sessions: HashMap<String, String>,
    next_catalog_id: i64,
    next_meeting_id: i64,
}

/// In-process stand-in for the hosted backend.
///
/// Mirrors the hosted rules that matter to the portal: writes to the catalog
/// need a signed-in caller, meetings may be inserted anonymously, ids and
/// timestamps are assigned on insert.
#[derive(Default)]
pub struct MemoryService {
    state: RwLock<State>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account that can sign in to the admin console.
    pub async fn add_account(&self, email: &str, plain_password: &str) -> RemoteResult<()> {
        let password_hash = password::hash_password(plain_password)
            .map_err(|e| RemoteError::Unavailable(format!("Failed to hash password: {e}")))?;
        let mut state = self.state.write().await;
        let id = format!("user-{}", state.accounts.len() + 1);
        state.accounts.push(Account {
            id,
            email: email.trim().to_lowercase(),
            password_hash,
        });
        Ok(())
    }

    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.state.read().await.objects.get(&object_key(bucket, path)).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    async fn require_user(&self, access: Access<'_>) -> RemoteResult<()> {
        let Some(token) = access.token() else {
            return Err(RemoteError::Unauthorized("Sign-in required".to_string()));
        };
        if self.state.read().await.sessions.contains_key(token) {
            Ok(())
        } else {
            Err(RemoteError::Unauthorized("Invalid or expired session".to_string()))
        }
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

fn new_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn sort_newest_first<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<Utc>, i64),
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl DataService for MemoryService {
    async fn list_catalog(&self, _access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<CatalogItem>> {
        let mut rows = self.state.read().await.catalog.clone();
        if order == ListOrder::NewestFirst {
            sort_newest_first(&mut rows, |i| (i.created_at, i.id));
        }
        Ok(rows)
    }

    async fn insert_catalog(&self, access: Access<'_>, item: &NewCatalogItem) -> RemoteResult<()> {
        self.require_user(access).await?;
        let mut state = self.state.write().await;
        state.next_catalog_id += 1;
        let id = state.next_catalog_id;
        state.catalog.push(CatalogItem {
            id,
            title: item.title.clone(),
            category: item.category.clone(),
            image_url: item.image_url.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_catalog(&self, access: Access<'_>, id: i64) -> RemoteResult<()> {
        self.require_user(access).await?;
        // Deleting a missing row is not an error, same as a filtered DELETE.
        self.state.write().await.catalog.retain(|i| i.id != id);
        Ok(())
    }

    async fn list_meetings(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<MeetingRequest>> {
        self.require_user(access).await?;
        let mut rows = self.state.read().await.meetings.clone();
        if order == ListOrder::NewestFirst {
            sort_newest_first(&mut rows, |m| (m.created_at, m.id));
        }
        Ok(rows)
    }

    async fn list_meeting_dates(&self, _access: Access<'_>) -> RemoteResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .await
            .meetings
            .iter()
            .map(|m| m.date.clone())
            .collect())
    }

    async fn insert_meeting(&self, _access: Access<'_>, record: &NewMeetingRequest) -> RemoteResult<()> {
        let mut state = self.state.write().await;
        state.next_meeting_id += 1;
        let id = state.next_meeting_id;
        state.meetings.push(MeetingRequest {
            id,
            created_at: Utc::now(),
            name: record.name.clone(),
            school: Some(record.school.clone()),
            organization: record.organization.clone(),
            chapter_name: record.chapter_name.clone(),
            role: record.role.clone(),
            phone: Some(record.phone.clone()),
            email: record.email.clone(),
            date: record.date.format(MEETING_DATE_FORMAT).to_string(),
            message: record.message.clone(),
            file_name: record.file_name.clone(),
            file_url: record.file_url.clone(),
        });
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<()> {
        let key = object_key(bucket, path);
        let mut state = self.state.write().await;
        if state.objects.contains_key(&key) {
            return Err(RemoteError::Status {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        state.objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn current_user(&self, access_token: &str) -> RemoteResult<Option<AuthUser>> {
        let state = self.state.read().await;
        let Some(account_id) = state.sessions.get(access_token) else {
            return Ok(None);
        };
        Ok(state
            .accounts
            .iter()
            .find(|a| &a.id == account_id)
            .map(|a| AuthUser {
                id: a.id.clone(),
                email: Some(a.email.clone()),
            }))
    }

    async fn sign_in(&self, email: &str, plain_password: &str) -> RemoteResult<AuthSession> {
        let email = email.trim().to_lowercase();
        let mut state = self.state.write().await;
        let user = state
            .accounts
            .iter()
            .find(|a| a.email == email)
            .filter(|a| password::verify_password(plain_password, &a.password_hash).unwrap_or(false))
            .map(|a| AuthUser {
                id: a.id.clone(),
                email: Some(a.email.clone()),
            })
            .ok_or_else(|| RemoteError::Unauthorized("Invalid login credentials".to_string()))?;

        let access_token = new_token();
        state.sessions.insert(access_token.clone(), user.id.clone());
        Ok(AuthSession { access_token, user })
    }

    async fn sign_out(&self, access_token: &str) -> RemoteResult<()> {
        self.state.write().await.sessions.remove(access_token);
        Ok(())
    }
}
