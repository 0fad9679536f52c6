//! Identity endpoint seam.
//!
//! The controller talks to Google's userinfo and revocation endpoints
//! through this trait so tests can script outcomes without a network.

use async_trait::async_trait;

use gws_gdrive::auth;
use gws_gdrive::client::DriveClient;
use gws_gdrive::types::{DriveResult, UserProfile};

#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the signed-in user's profile with the current token.
    async fn fetch_profile(&self) -> DriveResult<UserProfile>;

    /// Revoke the given token.
    async fn revoke(&self, token: &str) -> DriveResult<()>;
}

/// Production implementation backed by the Drive client.
pub struct GoogleIdentity {
    client: DriveClient,
}

impl GoogleIdentity {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityApi for GoogleIdentity {
    async fn fetch_profile(&self) -> DriveResult<UserProfile> {
        auth::fetch_user_profile(&self.client).await
    }

    async fn revoke(&self, token: &str) -> DriveResult<()> {
        auth::revoke_token(&self.client, token).await
    }
}
