//! Types for the generation and repo-clone backends.

use serde::{Deserialize, Serialize};

/// Error kind for backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendErrorKind {
    /// Transport-level failure.
    Network,
    /// Non-2xx response; carries the HTTP status.
    Server(u16),
    /// 2xx response with a body that does not match the contract.
    InvalidResponse,
    /// Bad input caught before the call.
    InvalidParameter,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Server(code) => write!(f, "Server({})", code),
            Self::InvalidResponse => write!(f, "InvalidResponse"),
            Self::InvalidParameter => write!(f, "InvalidParameter"),
        }
    }
}

/// A backend error. For server errors the message is the backend's own
/// `detail` field when present, surfaced verbatim to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InvalidParameter, msg)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for BackendError {}

/// Convenience type alias.
pub type BackendResult<T> = Result<T, BackendError>;

/// A file going along with a prompt; `content_base64` holds the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub content_base64: String,
}

/// One generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub api_key: String,
    pub prompt: String,
    pub model: String,
    pub refiner_model: String,
    #[serde(default)]
    pub files: Vec<UploadFile>,
}

/// Result of cloning a repository for analysis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClonedRepo {
    pub processed_text: String,
    pub repo_name: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status() {
        let err = BackendError::new(BackendErrorKind::Server(502), "upstream gone");
        assert_eq!(err.to_string(), "[Server(502)] upstream gone");
    }

    #[test]
    fn cloned_repo_parses() {
        let repo: ClonedRepo =
            serde_json::from_str(r#"{"processed_text":"...","repo_name":"user/repo"}"#).unwrap();
        assert_eq!(repo.repo_name, "user/repo");
    }
}
