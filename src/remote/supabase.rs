use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{
    Access, AuthSession, AuthUser, CATALOG_TABLE, DataService, ListOrder, MEETINGS_TABLE,
    RemoteError, RemoteResult,
};
use crate::models::{CatalogItem, MeetingRequest, NewCatalogItem, NewMeetingRequest};

/// HTTP client for a Supabase project: PostgREST, Storage and GoTrue.
pub struct SupabaseService {
    client: Client,
    base_url: String,
    base: Url,
    anon_key: String,
}

impl SupabaseService {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| RemoteError::Unavailable(format!("Invalid service URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Unavailable(format!("Invalid service URL '{base_url}'")));
        }
        Ok(Self {
            client,
            base_url,
            base,
            anon_key: anon_key.to_string(),
        })
    }

    /// Storage URL with each segment percent-encoded, so `/`, `?` and `#`
    /// inside a bucket or object name stay inside that segment.
    fn storage_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["storage", "v1", "object"]).extend(segments);
        }
        url
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Every request carries the project key; the bearer is the caller's token when signed in.
    fn authorize(&self, req: RequestBuilder, access: Access<'_>) -> RequestBuilder {
        let bearer = access.token().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        access: Access<'_>,
        table: &str,
        columns: &str,
        order: ListOrder,
    ) -> RemoteResult<Vec<T>> {
        let mut query = vec![("select", columns.to_string())];
        if order == ListOrder::NewestFirst {
            query.push(("order", "created_at.desc".to_string()));
        }
        let req = self.client.get(self.rest_url(table)).query(&query);
        let resp = checked(self.authorize(req, access).send().await?).await?;
        Ok(resp.json::<Vec<T>>().await?)
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        access: Access<'_>,
        table: &str,
        record: &T,
    ) -> RemoteResult<()> {
        let req = self
            .client
            .post(self.rest_url(table))
            .header("Prefer", "return=minimal")
            .json(&[record]);
        checked(self.authorize(req, access).send().await?).await?;
        Ok(())
    }
}

/// Turn non-2xx responses into errors carrying the service's own message.
async fn checked(resp: Response) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status.canonical_reason().unwrap_or("request failed").to_string()
    });
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        s if s.is_server_error() => RemoteError::Unavailable(message),
        s => RemoteError::Status { status: s.as_u16(), message },
    })
}

/// PostgREST, Storage and GoTrue each name their error field differently.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct DateRow {
    date: Option<String>,
}

#[async_trait]
impl DataService for SupabaseService {
    async fn list_catalog(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<CatalogItem>> {
        self.select(access, CATALOG_TABLE, "*", order).await
    }

    async fn insert_catalog(&self, access: Access<'_>, item: &NewCatalogItem) -> RemoteResult<()> {
        self.insert(access, CATALOG_TABLE, item).await
    }

    async fn delete_catalog(&self, access: Access<'_>, id: i64) -> RemoteResult<()> {
        let req = self
            .client
            .delete(self.rest_url(CATALOG_TABLE))
            .query(&[("id", format!("eq.{id}"))]);
        checked(self.authorize(req, access).send().await?).await?;
        Ok(())
    }

    async fn list_meetings(&self, access: Access<'_>, order: ListOrder) -> RemoteResult<Vec<MeetingRequest>> {
        self.select(access, MEETINGS_TABLE, "*", order).await
    }

    async fn list_meeting_dates(&self, access: Access<'_>) -> RemoteResult<Vec<String>> {
        let rows: Vec<DateRow> = self
            .select(access, MEETINGS_TABLE, "date", ListOrder::Unordered)
            .await?;
        Ok(rows.into_iter().filter_map(|r| r.date).collect())
    }

    async fn insert_meeting(&self, access: Access<'_>, record: &NewMeetingRequest) -> RemoteResult<()> {
        self.insert(access, MEETINGS_TABLE, record).await
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<()> {
        let url = self.storage_url(&[bucket, path]);
        let req = self
            .client
            .post(url)
            .header("Content-Type", content_type)
            .body(bytes);
        checked(self.authorize(req, Access::Anonymous).send().await?).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&["public", bucket, path]).to_string()
    }

    async fn current_user(&self, access_token: &str) -> RemoteResult<Option<AuthUser>> {
        let req = self.client.get(self.auth_url("user"));
        let resp = self.authorize(req, Access::User(access_token)).send().await?;
        match checked(resp).await {
            Ok(resp) => Ok(Some(resp.json::<AuthUser>().await?)),
            Err(RemoteError::Unauthorized(_)) | Err(RemoteError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<AuthSession> {
        let req = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let resp = checked(self.authorize(req, Access::Anonymous).send().await?)
            .await
            .map_err(|e| match e {
                // GoTrue answers bad credentials with 400 invalid_grant.
                RemoteError::Status { status: 400, message } => RemoteError::Unauthorized(message),
                other => other,
            })?;
        let token: TokenResponse = resp.json().await?;
        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> RemoteResult<()> {
        let req = self.client.post(self.auth_url("logout"));
        checked(self.authorize(req, Access::User(access_token)).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SupabaseService {
        SupabaseService::new("https://proj.supabase.co/", "anon", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let svc = service();
        assert_eq!(svc.rest_url("meetings"), "https://proj.supabase.co/rest/v1/meetings");
        assert_eq!(svc.auth_url("user"), "https://proj.supabase.co/auth/v1/user");
        assert_eq!(
            svc.public_url("meeting-uploads", "1718000000000.pdf"),
            "https://proj.supabase.co/storage/v1/object/public/meeting-uploads/1718000000000.pdf"
        );
    }

    #[test]
    fn storage_segments_are_percent_encoded() {
        let svc = service();
        assert_eq!(
            svc.public_url("meeting-uploads", "a b?x#y/../z"),
            "https://proj.supabase.co/storage/v1/object/public/meeting-uploads/a%20b%3Fx%23y%2F..%2Fz"
        );
        assert_eq!(
            svc.storage_url(&["meeting-uploads", "1.pdf"]).as_str(),
            "https://proj.supabase.co/storage/v1/object/meeting-uploads/1.pdf"
        );
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        assert!(SupabaseService::new("not a url", "anon", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn error_message_reads_each_api_shape() {
        assert_eq!(
            error_message(r#"{"code":"23502","message":"null value in column"}"#).as_deref(),
            Some("null value in column")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(error_message(r#"{"msg":"JWT expired"}"#).as_deref(), Some("JWT expired"));
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }
}
