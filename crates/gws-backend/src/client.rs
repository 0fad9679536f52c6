//! HTTP clients for the generation and repo-clone backends.

use std::time::Duration;

use base64::Engine;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use crate::types::{BackendError, BackendErrorKind, BackendResult, ClonedRepo, GenerateRequest};

/// Generation requests can run long; give them room.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct BackendClient {
    inner: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let base_url: String = base_url.into();
        if base_url.is_empty() {
            return Err(BackendError::invalid("Backend URL is required"));
        }
        let inner = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one generation request. The response blocks are returned as
    /// raw JSON values; the conversation layer ingests them into typed
    /// parts.
    pub async fn generate(&self, request: &GenerateRequest) -> BackendResult<Vec<Value>> {
        if request.prompt.trim().is_empty() {
            return Err(BackendError::invalid("Prompt must not be empty"));
        }

        let mut form = Form::new()
            .text("apiKey", request.api_key.clone())
            .text("prompt", request.prompt.clone())
            .text("model", request.model.clone())
            .text("refinerModel", request.refiner_model.clone());

        for file in &request.files {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&file.content_base64)
                .map_err(|e| {
                    BackendError::invalid(format!("Attachment '{}' is not base64: {e}", file.name))
                })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    BackendError::invalid(format!("Attachment '{}' MIME type: {e}", file.name))
                })?;
            form = form.part("files", part);
        }

        debug!(
            "Generate request: model={}, {} file(s)",
            request.model,
            request.files.len()
        );
        let resp = self
            .inner
            .post(format!("{}/api/generate", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        if !status.is_success() {
            return Err(server_error(status.as_u16(), &body));
        }

        serde_json::from_str::<Vec<Value>>(&body).map_err(|e| {
            BackendError::new(
                BackendErrorKind::InvalidResponse,
                format!("Expected a JSON array of response parts: {e}"),
            )
        })
    }

    /// Clone a public repository server-side and return its processed
    /// text for use as prompt context.
    pub async fn clone_repo(&self, url: &str) -> BackendResult<ClonedRepo> {
        if url.trim().is_empty() {
            return Err(BackendError::invalid("Repository URL must not be empty"));
        }

        debug!("Clone request: {url}");
        let resp = self
            .inner
            .post(format!("{}/api/clone_repo", self.base_url))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::network(e.to_string()))?;
        if !status.is_success() {
            return Err(server_error(status.as_u16(), &body));
        }

        serde_json::from_str::<ClonedRepo>(&body).map_err(|e| {
            BackendError::new(
                BackendErrorKind::InvalidResponse,
                format!("Malformed clone response: {e}"),
            )
        })
    }
}

/// Build a server error, preferring the backend's own `detail` field
/// over the raw body.
fn server_error(status: u16, body: &str) -> BackendError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(500).collect());
    BackendError::new(BackendErrorKind::Server(status), detail)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UploadFile;

    #[test]
    fn base_url_is_normalized() {
        let client = BackendClient::new("https://backend.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://backend.example.com");
    }

    #[test]
    fn empty_base_url_rejected() {
        let err = BackendClient::new("").unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn empty_prompt_rejected() {
        let client = BackendClient::new("https://backend.example.com").unwrap();
        let err = client
            .generate(&GenerateRequest {
                prompt: "   ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn invalid_base64_attachment_rejected() {
        let client = BackendClient::new("https://backend.example.com").unwrap();
        let err = client
            .generate(&GenerateRequest {
                prompt: "hi".into(),
                files: vec![UploadFile {
                    name: "x.bin".into(),
                    mime_type: "application/octet-stream".into(),
                    content_base64: "not base64!!!".into(),
                }],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::InvalidParameter);
        assert!(err.message.contains("x.bin"));
    }

    #[tokio::test]
    async fn empty_clone_url_rejected() {
        let client = BackendClient::new("https://backend.example.com").unwrap();
        let err = client.clone_repo("").await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::InvalidParameter);
    }

    #[test]
    fn server_error_prefers_detail_field() {
        let err = server_error(422, r#"{"detail":"Invalid API key"}"#);
        assert_eq!(err.kind, BackendErrorKind::Server(422));
        assert_eq!(err.message, "Invalid API key");
    }

    #[test]
    fn server_error_falls_back_to_body() {
        let err = server_error(500, "upstream exploded");
        assert_eq!(err.message, "upstream exploded");

        let err = server_error(400, r#"{"error":"no detail key"}"#);
        assert!(err.message.contains("no detail key"));
    }
}
