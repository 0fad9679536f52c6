//! HTTP client for the Google Drive API v3.
//!
//! Wraps `reqwest::Client` with bearer-token auth from the shared
//! [`TokenStore`] and helpers for the HTTP verbs used by the Drive REST
//! surface. Every call fails on the first error; retry decisions belong to
//! the callers that know which operations are safe to repeat.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::token_store::TokenStore;
use crate::types::{DriveConfig, DriveError, DriveErrorKind, DriveResult};

/// Base URL for Drive API v3 metadata endpoints.
pub const API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Base URL for Drive API v3 upload endpoints.
pub const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
/// Google OAuth2 authorization endpoint.
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google OAuth2 token revocation endpoint.
pub const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
/// Google userinfo endpoint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google Drive HTTP client with bearer auth from a shared token store.
#[derive(Clone)]
pub struct DriveClient {
    /// Inner reqwest client.
    inner: Client,
    /// Shared token cell; sign-in and sign-out mutate it elsewhere.
    tokens: Arc<TokenStore>,
    /// Configuration.
    config: DriveConfig,
}

impl DriveClient {
    // ── Construction ─────────────────────────────────────────────

    /// Create a new client from config and a shared token store.
    pub fn new(config: DriveConfig, tokens: Arc<TokenStore>) -> DriveResult<Self> {
        let inner = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DriveError::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            tokens,
            config,
        })
    }

    /// Shared token store handle.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Get the config reference.
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    // ── Request building helpers ─────────────────────────────────

    fn auth_headers(&self) -> DriveResult<HeaderMap> {
        let token = self.tokens.require()?;
        if token.is_expired() {
            return Err(DriveError::new(
                DriveErrorKind::TokenExpired,
                "Access token has expired, sign in again",
            ));
        }
        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", token.access_token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&val)
                .map_err(|e| DriveError::invalid(format!("Invalid auth header: {e}")))?,
        );
        Ok(headers)
    }

    fn build_request(&self, method: Method, url: &str) -> DriveResult<RequestBuilder> {
        let headers = self.auth_headers()?;
        Ok(self.inner.request(method, url).headers(headers))
    }

    /// Execute a request, mapping non-2xx statuses and transport errors.
    async fn execute(&self, req: RequestBuilder) -> DriveResult<Response> {
        let request = req
            .build()
            .map_err(|e| DriveError::network(format!("Failed to build request: {e}")))?;
        debug!("Drive API {} {}", request.method(), request.url());

        let resp = self
            .inner
            .execute(request)
            .await
            .map_err(|e| DriveError::network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DriveError::from_status(status.as_u16(), &body))
    }

    // ── Public HTTP verb helpers ──────────────────────────────────

    /// GET a JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> DriveResult<T> {
        let resp = self.execute(self.build_request(Method::GET, url)?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// GET with query parameters, return JSON.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> DriveResult<T> {
        let req = self.build_request(Method::GET, url)?.query(query);
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// POST with a JSON body, return JSON.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> DriveResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.build_request(Method::POST, url)?.json(body);
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// PATCH with a JSON body, return JSON.
    pub async fn patch_json<B, T>(&self, url: &str, body: &B) -> DriveResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.build_request(Method::PATCH, url)?.json(body);
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// PATCH raw bytes (media uploads), return JSON.
    pub async fn patch_bytes<T: DeserializeOwned>(
        &self,
        url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> DriveResult<T> {
        let req = self
            .build_request(Method::PATCH, url)?
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// POST raw bytes (for uploads), return JSON.
    pub async fn post_bytes<T: DeserializeOwned>(
        &self,
        url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> DriveResult<T> {
        let req = self
            .build_request(Method::POST, url)?
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DriveError::network(format!("JSON parse error: {e}")))
    }

    /// DELETE (no response body expected).
    pub async fn delete(&self, url: &str) -> DriveResult<()> {
        self.execute(self.build_request(Method::DELETE, url)?)
            .await?;
        Ok(())
    }

    /// GET the response body as text (for `alt=media` downloads).
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> DriveResult<String> {
        let req = self.build_request(Method::GET, url)?.query(query);
        let resp = self.execute(req).await?;
        resp.text()
            .await
            .map_err(|e| DriveError::network(format!("Download error: {e}")))
    }

    /// POST a form to an un-authenticated endpoint, return the raw response.
    pub async fn post_form_unauthenticated(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> DriveResult<Response> {
        let resp = self
            .inner
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| DriveError::network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DriveError::from_status(status, &body));
        }
        Ok(resp)
    }

    /// Build a full API URL: `{API_BASE}/{path}`.
    pub fn api_url(path: &str) -> String {
        format!("{}/{}", API_BASE, path.trim_start_matches('/'))
    }

    /// Build a full upload URL: `{UPLOAD_BASE}/{path}`.
    pub fn upload_url(path: &str) -> String {
        format!("{}/{}", UPLOAD_BASE, path.trim_start_matches('/'))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthToken;
    use chrono::Utc;

    fn client_with_store() -> (DriveClient, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::new());
        let client = DriveClient::new(DriveConfig::default(), tokens.clone()).unwrap();
        (client, tokens)
    }

    #[test]
    fn api_url_construction() {
        assert_eq!(
            DriveClient::api_url("files"),
            "https://www.googleapis.com/drive/v3/files"
        );
        assert_eq!(
            DriveClient::api_url("/files"),
            "https://www.googleapis.com/drive/v3/files"
        );
        assert_eq!(
            DriveClient::api_url("files/abc123"),
            "https://www.googleapis.com/drive/v3/files/abc123"
        );
    }

    #[test]
    fn upload_url_construction() {
        assert_eq!(
            DriveClient::upload_url("files"),
            "https://www.googleapis.com/upload/drive/v3/files"
        );
    }

    #[test]
    fn auth_headers_no_token() {
        let (client, _tokens) = client_with_store();
        let err = client.auth_headers().unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::AuthRequired);
    }

    #[test]
    fn auth_headers_expired_token() {
        let (client, tokens) = client_with_store();
        tokens.set(AuthToken {
            access_token: "ya29.expired".into(),
            expires_at: Utc::now() - chrono::Duration::hours(1),
            scope: String::new(),
        });
        let err = client.auth_headers().unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::TokenExpired);
    }

    #[test]
    fn auth_headers_valid_token() {
        let (client, tokens) = client_with_store();
        tokens.set(AuthToken {
            access_token: "ya29.valid".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            scope: String::new(),
        });
        let headers = client.auth_headers().unwrap();
        let auth_val = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert_eq!(auth_val, "Bearer ya29.valid");
    }

    #[test]
    fn token_store_shared_across_clones() {
        let (client, tokens) = client_with_store();
        let cloned = client.clone();
        tokens.set(AuthToken {
            access_token: "ya29.shared".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            scope: String::new(),
        });
        assert!(cloned.auth_headers().is_ok());
    }

    #[test]
    fn constants() {
        assert!(API_BASE.contains("googleapis.com/drive/v3"));
        assert!(UPLOAD_BASE.contains("upload/drive/v3"));
        assert!(AUTH_URL.contains("accounts.google.com"));
        assert!(REVOKE_URL.contains("oauth2.googleapis.com/revoke"));
        assert!(USERINFO_URL.contains("oauth2/v3/userinfo"));
    }
}
