//! Core types for the Google Drive integration.
//!
//! All wire types are serde-friendly with camelCase JSON field naming and
//! represent the subset of the Drive API v3 resource model this app reads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for Drive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DriveErrorKind {
    /// No token is held; the call was never issued.
    AuthRequired,
    /// The server rejected the token (HTTP 401).
    TokenExpired,
    /// Resource does not exist (HTTP 404).
    NotFound,
    /// Retryable failure: HTTP 429, 5xx, or a network-level error.
    TransientServer,
    /// Non-retryable client error (4xx other than 401/404).
    PermanentClient(u16),
    /// Invalid request parameter (caught before the call).
    InvalidParameter,
}

impl DriveErrorKind {
    /// Whether an operation failing with this kind may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientServer)
    }
}

impl std::fmt::Display for DriveErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthRequired => write!(f, "AuthRequired"),
            Self::TokenExpired => write!(f, "TokenExpired"),
            Self::NotFound => write!(f, "NotFound"),
            Self::TransientServer => write!(f, "TransientServer"),
            Self::PermanentClient(code) => write!(f, "PermanentClient({})", code),
            Self::InvalidParameter => write!(f, "InvalidParameter"),
        }
    }
}

/// A Drive error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveError {
    pub kind: DriveErrorKind,
    pub message: String,
}

impl std::fmt::Display for DriveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for DriveError {}

impl DriveError {
    pub fn new(kind: DriveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 => DriveErrorKind::TokenExpired,
            404 => DriveErrorKind::NotFound,
            429 | 500..=599 => DriveErrorKind::TransientServer,
            400..=499 => DriveErrorKind::PermanentClient(status),
            _ => DriveErrorKind::TransientServer,
        };
        Self::new(kind, body.chars().take(500).collect::<String>())
    }

    pub fn auth_required(msg: impl Into<String>) -> Self {
        Self::new(DriveErrorKind::AuthRequired, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(DriveErrorKind::InvalidParameter, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(DriveErrorKind::TransientServer, msg)
    }
}

/// Convenience type alias.
pub type DriveResult<T> = Result<T, DriveError>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OAuth2 (implicit grant)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Google OAuth2 scopes used by this app.
pub mod scopes {
    /// Per-file access to files created or opened by the app.
    pub const DRIVE_FILE: &str = "https://www.googleapis.com/auth/drive.file";
}

/// MIME types this app cares about.
pub mod mime_types {
    pub const FOLDER: &str = "application/vnd.google-apps.folder";
    pub const JSON: &str = "application/json";
}

/// A short-lived access token from the implicit grant.
///
/// Tokens are never mutated in place; a fresh grant replaces the whole
/// value through the [`crate::token_store::TokenStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Bearer access token.
    pub access_token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Granted scope.
    pub scope: String,
}

impl AuthToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Payload delivered by the grant callback.
///
/// The implicit flow hands the token straight to the redirect target as
/// fragment parameters; either `access_token` or `error` is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrantResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GrantResponse {
    /// Convert a successful grant payload into a token.
    pub fn into_token(self) -> DriveResult<AuthToken> {
        if let Some(err) = self.error {
            return Err(DriveError::new(
                DriveErrorKind::PermanentClient(0),
                format!("grant error: {err}"),
            ));
        }
        if self.access_token.is_empty() {
            return Err(DriveError::invalid("grant delivered no access token"));
        }
        let ttl = self.expires_in.unwrap_or(3600);
        Ok(AuthToken {
            access_token: self.access_token,
            expires_at: Utc::now() + Duration::seconds(ttl),
            scope: self.scope.unwrap_or_default(),
        })
    }
}

/// Google user profile from the userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Raw JSON shape of the userinfo response.
#[derive(Debug, Deserialize)]
pub(crate) struct RawUserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Drive file metadata (reduced v3 files resource).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Unique opaque file ID.
    #[serde(default)]
    pub id: String,
    /// File name.
    #[serde(default)]
    pub name: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: String,
    /// Creation time.
    pub created_time: Option<DateTime<Utc>>,
    /// Last modification time.
    pub modified_time: Option<DateTime<Utc>>,
    /// Whether the file is trashed.
    #[serde(default)]
    pub trashed: bool,
    /// Parent folder IDs.
    #[serde(default)]
    pub parents: Vec<String>,
}

/// One page of a file listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Parameters for a file listing.
#[derive(Debug, Clone, Default)]
pub struct ListFilesParams {
    /// Drive query string (`q`).
    pub query: Option<String>,
    /// Page size; defaults to the client config.
    pub page_size: Option<u32>,
    /// Continuation token.
    pub page_token: Option<String>,
    /// Sort order (e.g. `createdTime desc`).
    pub order_by: Option<String>,
}

/// Metadata part of a file create.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Metadata patch (rename only in this app).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveConfig {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Default listing page size.
    pub default_page_size: u32,
    /// Metadata fields requested for file resources.
    pub file_fields: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            default_page_size: 100,
            file_fields: "id,name,mimeType,createdTime,modifiedTime,trashed,parents".into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
