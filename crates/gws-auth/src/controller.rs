//! Sign-in lifecycle controller.
//!
//! Owns the phase machine (`Uninitialized -> Initializing -> Ready`), the
//! pending-grant handshake, and the signed-in profile. All session
//! mutations flow through here: a successful grant sets the shared token
//! and profile; any failure after the grant demotes the session back to
//! signed-out instead of leaving a half-authenticated state.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::oneshot;

use gws_gdrive::auth::{build_auth_url, OAuthSettings};
use gws_gdrive::service::DriveFiles;
use gws_gdrive::token_store::TokenStore;
use gws_gdrive::types::GrantResponse;

use crate::grant::GrantExchange;
use crate::identity::IdentityApi;
use crate::types::{AuthError, AuthErrorKind, AuthPhase, AuthResult, AuthStatus, SignInOutcome};

pub struct AuthController {
    phase: AuthPhase,
    settings: OAuthSettings,
    tokens: Arc<TokenStore>,
    drive: Arc<DriveFiles>,
    identity: Box<dyn IdentityApi>,
    exchange: GrantExchange,
    profile: Option<gws_gdrive::types::UserProfile>,
    /// Receiver for the outstanding sign-in attempt, if a waiter has not
    /// claimed it yet.
    waiter: Option<oneshot::Receiver<SignInOutcome>>,
}

impl AuthController {
    pub fn new(
        settings: OAuthSettings,
        tokens: Arc<TokenStore>,
        drive: Arc<DriveFiles>,
        identity: Box<dyn IdentityApi>,
    ) -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            settings,
            tokens,
            drive,
            identity,
            exchange: GrantExchange::new(),
            profile: None,
            waiter: None,
        }
    }

    // ── Phase machine ────────────────────────────────────────────

    /// Bring the controller to `Ready`. Idempotent: calling again once
    /// ready is a no-op. A failed initialization falls back to
    /// `Uninitialized` and returns the error.
    ///
    /// A session token restored from disk is revalidated here: the
    /// profile is fetched and kept when the server still accepts the
    /// token, otherwise the token is discarded and the app starts
    /// signed out. Either way initialization completes.
    pub async fn initialize(&mut self) -> AuthResult<AuthStatus> {
        if self.phase == AuthPhase::Ready {
            return Ok(self.status());
        }
        self.phase = AuthPhase::Initializing;

        // Constructing the grant client amounts to validating the OAuth
        // settings; the URL itself is rebuilt per sign-in.
        if let Err(e) = build_auth_url(&self.settings) {
            warn!("Auth initialization failed: {e}");
            self.phase = AuthPhase::Uninitialized;
            return Err(e.into());
        }

        if self.tokens.get().is_some() {
            match self.identity.fetch_profile().await {
                Ok(profile) => {
                    info!("Restored session for {}", profile.email);
                    self.profile = Some(profile);
                }
                Err(e) => {
                    warn!("Stored token rejected, starting signed out: {e}");
                    self.tokens.clear();
                    self.profile = None;
                }
            }
        }

        self.phase = AuthPhase::Ready;
        info!("Auth controller ready");
        Ok(self.status())
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    // ── Sign-in ──────────────────────────────────────────────────

    /// Start a sign-in attempt: register it with the exchange and return
    /// the authorization URL for the user to open. Before `Ready` this is
    /// a typed error and mutates nothing.
    pub fn sign_in(&mut self) -> AuthResult<String> {
        if self.phase != AuthPhase::Ready {
            debug!("Sign-in requested in phase {:?}, refusing", self.phase);
            return Err(AuthError::not_ready(
                "Sign-in is not available until initialization completes",
            ));
        }
        let url = build_auth_url(&self.settings)?;
        self.waiter = Some(self.exchange.begin());
        Ok(url)
    }

    /// Claim the receiver for the outstanding attempt. The caller awaits
    /// it outside the controller lock.
    pub fn take_sign_in_waiter(&mut self) -> Option<oneshot::Receiver<SignInOutcome>> {
        self.waiter.take()
    }

    /// Complete a sign-in with the payload delivered to the redirect
    /// target. Accepts deliveries without a pending attempt (a restart can
    /// drop the pending slot while the browser tab survives).
    pub async fn handle_grant(&mut self, response: GrantResponse) -> AuthResult<AuthStatus> {
        let token = match response.into_token() {
            Ok(token) => token,
            Err(e) => {
                warn!("Grant rejected: {e}");
                let err = AuthError::new(AuthErrorKind::GrantRejected, e.to_string());
                self.exchange.resolve(Err(err.clone()));
                return Err(err);
            }
        };

        self.tokens.set(token);

        match self.identity.fetch_profile().await {
            Ok(profile) => {
                info!("Signed in as {}", profile.email);
                self.profile = Some(profile.clone());
                if !self.exchange.resolve(Ok(profile)) {
                    debug!("Grant delivered with no pending attempt, accepted");
                }
                Ok(self.status())
            }
            Err(e) => {
                // A token we cannot attribute to a user is useless; drop
                // it so the app stays cleanly signed out.
                warn!("Profile fetch failed after grant, discarding token: {e}");
                self.tokens.clear();
                self.profile = None;
                let err = AuthError::new(AuthErrorKind::ProfileUnavailable, e.to_string());
                self.exchange.resolve(Err(err.clone()));
                Err(err)
            }
        }
    }

    // ── Sign-out ─────────────────────────────────────────────────

    /// Sign out: revoke the token (best effort), clear the session, and
    /// drop cached Drive state. Never fails.
    pub async fn sign_out(&mut self) -> AuthStatus {
        if let Some(token) = self.tokens.get() {
            if let Err(e) = self.identity.revoke(&token.access_token).await {
                debug!("Token revocation failed, continuing sign-out: {e}");
            }
        }
        self.tokens.clear();
        self.profile = None;
        self.exchange.cancel();
        self.waiter = None;
        self.drive.reset();
        info!("Signed out");
        self.status()
    }

    // ── Status ───────────────────────────────────────────────────

    pub fn status(&self) -> AuthStatus {
        AuthStatus {
            phase: self.phase,
            signed_in: self.tokens.is_authenticated() && self.profile.is_some(),
            profile: self.profile.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
