//! OAuth2 implicit-grant endpoints for Google identity.
//!
//! The desktop flow mirrors the browser implicit grant:
//!   1. Build an authorization URL with `response_type=token`.
//!   2. The redirect hands back `access_token` + `expires_in` directly;
//!     there is no code exchange and no refresh token.
//!   3. Fetch the user profile with the fresh token.
//!   4. Revoke the token on sign-out (best effort).

use log::debug;

use crate::client::{DriveClient, AUTH_URL, REVOKE_URL, USERINFO_URL};
use crate::types::{DriveError, DriveResult, RawUserInfo, UserProfile};

/// OAuth2 client settings for the implicit grant.
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    /// Google OAuth2 client ID.
    pub client_id: String,
    /// Redirect target registered for the client.
    pub redirect_uri: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
}

/// Build the authorization URL for the implicit grant.
pub fn build_auth_url(settings: &OAuthSettings) -> DriveResult<String> {
    if settings.client_id.is_empty() {
        return Err(DriveError::invalid("client_id is required"));
    }
    if settings.scopes.is_empty() {
        return Err(DriveError::invalid("At least one scope is required"));
    }

    let scope = settings.scopes.join(" ");
    let params = [
        ("client_id", settings.client_id.as_str()),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("response_type", "token"),
        ("scope", &scope),
        ("prompt", "select_account"),
    ];

    let url = url::Url::parse_with_params(AUTH_URL, &params)
        .map_err(|e| DriveError::invalid(format!("Failed to build auth URL: {e}")))?;

    Ok(url.to_string())
}

/// Fetch the signed-in user's profile with the current token.
pub async fn fetch_user_profile(client: &DriveClient) -> DriveResult<UserProfile> {
    debug!("Fetching user profile");
    let raw: RawUserInfo = client.get_json(USERINFO_URL).await?;
    Ok(UserProfile {
        id: raw.sub,
        name: raw.name,
        email: raw.email,
        image_url: raw.picture,
    })
}

/// Revoke a token. The revocation endpoint returns 200 with an empty body
/// on success; any failure is reported but safe to ignore on sign-out.
pub async fn revoke_token(client: &DriveClient, token: &str) -> DriveResult<()> {
    if token.is_empty() {
        return Err(DriveError::invalid("Token string is empty"));
    }

    debug!("Revoking token");
    let params = [("token", token)];
    client
        .post_form_unauthenticated(REVOKE_URL, &params)
        .await?;
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{scopes, DriveErrorKind};

    fn settings() -> OAuthSettings {
        OAuthSettings {
            client_id: "test-client-id.apps.googleusercontent.com".into(),
            redirect_uri: "http://localhost:1420/oauth".into(),
            scopes: vec![scopes::DRIVE_FILE.into()],
        }
    }

    #[test]
    fn build_auth_url_success() {
        let url = build_auth_url(&settings()).unwrap();
        assert!(url.contains("accounts.google.com"));
        assert!(url.contains("test-client-id"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("prompt=select_account"));
        // Implicit grant: no code exchange parameters
        assert!(!url.contains("access_type=offline"));
        assert!(!url.contains("client_secret"));
    }

    #[test]
    fn build_auth_url_encodes_scope() {
        let mut s = settings();
        s.scopes.push("email".into());
        let url = build_auth_url(&s).unwrap();
        assert!(url.contains("scope="));
        assert!(url.contains("drive.file"));
    }

    #[test]
    fn build_auth_url_empty_client_id() {
        let mut s = settings();
        s.client_id.clear();
        let err = build_auth_url(&s).unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::InvalidParameter);
    }

    #[test]
    fn build_auth_url_no_scopes() {
        let mut s = settings();
        s.scopes.clear();
        let err = build_auth_url(&s).unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::InvalidParameter);
    }
}
