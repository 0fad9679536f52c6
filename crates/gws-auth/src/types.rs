//! Types for the sign-in lifecycle.

use gws_gdrive::types::{DriveError, UserProfile};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of the auth controller.
///
/// The controller starts `Uninitialized`, passes through `Initializing`
/// while the grant client is constructed, and serves sign-in requests only
/// once `Ready`. A failed initialization falls back to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthPhase {
    Uninitialized,
    Initializing,
    Ready,
}

/// Snapshot of the auth state for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub phase: AuthPhase,
    pub signed_in: bool,
    pub profile: Option<UserProfile>,
}

/// Error kind for auth operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthErrorKind {
    /// Sign-in was requested before the controller reached `Ready`.
    NotReady,
    /// The grant callback carried an error or no token.
    GrantRejected,
    /// A newer sign-in request replaced this one.
    Superseded,
    /// The profile fetch after a grant failed; the session was discarded.
    ProfileUnavailable,
    /// An underlying Drive/identity call failed.
    Upstream,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "NotReady"),
            Self::GrantRejected => write!(f, "GrantRejected"),
            Self::Superseded => write!(f, "Superseded"),
            Self::ProfileUnavailable => write!(f, "ProfileUnavailable"),
            Self::Upstream => write!(f, "Upstream"),
        }
    }
}

/// An auth error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::NotReady, msg)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for AuthError {}

impl From<DriveError> for AuthError {
    fn from(e: DriveError) -> Self {
        Self::new(AuthErrorKind::Upstream, e.to_string())
    }
}

/// Convenience type alias.
pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome of one sign-in attempt, delivered through the grant exchange.
pub type SignInOutcome = AuthResult<UserProfile>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use gws_gdrive::types::DriveErrorKind;

    #[test]
    fn display_includes_kind() {
        let err = AuthError::not_ready("sign-in before initialize");
        assert_eq!(err.to_string(), "[NotReady] sign-in before initialize");
    }

    #[test]
    fn drive_error_maps_to_upstream() {
        let err: AuthError = DriveError::new(DriveErrorKind::TokenExpired, "401").into();
        assert_eq!(err.kind, AuthErrorKind::Upstream);
        assert!(err.message.contains("TokenExpired"));
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = AuthStatus {
            phase: AuthPhase::Ready,
            signed_in: false,
            profile: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"signedIn\":false"));
        assert!(json.contains("\"ready\""));
    }
}
