//! Shared access-token cell.
//!
//! The store is the single owner of the current token. Every consumer (the
//! Drive client, the auth controller, the commands) holds an `Arc` to the
//! same store, so a sign-in or a demote-to-signed-out is visible everywhere
//! at once. Optionally mirrors the token to a session file so a restart
//! within the token's lifetime picks up where it left off.

use std::path::PathBuf;
use std::sync::Mutex;

use log::{debug, warn};

use crate::types::{AuthToken, DriveError, DriveResult};

/// Thread-safe holder for the current OAuth2 token.
pub struct TokenStore {
    current: Mutex<Option<AuthToken>>,
    /// Session file the token is mirrored to, if any.
    session_path: Option<PathBuf>,
}

impl TokenStore {
    /// In-memory store with no persistence.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            session_path: None,
        }
    }

    /// Store mirrored to a session file. Loads an unexpired token from the
    /// file if one is present; a corrupt or expired file is discarded.
    pub fn with_session_file(path: PathBuf) -> Self {
        let current = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AuthToken>(&raw) {
                Ok(token) if !token.is_expired() => {
                    debug!("Restored session token from {}", path.display());
                    Some(token)
                }
                Ok(_) => {
                    debug!("Session token expired, ignoring");
                    let _ = std::fs::remove_file(&path);
                    None
                }
                Err(e) => {
                    warn!("Unreadable session token file: {e}");
                    let _ = std::fs::remove_file(&path);
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            current: Mutex::new(current),
            session_path: Some(path),
        }
    }

    /// Replace the current token.
    pub fn set(&self, token: AuthToken) {
        if let Some(path) = &self.session_path {
            match serde_json::to_string(&token) {
                Ok(raw) => {
                    if let Err(e) = std::fs::write(path, raw) {
                        warn!("Failed to persist session token: {e}");
                    }
                }
                Err(e) => warn!("Failed to serialize session token: {e}"),
            }
        }
        *self.lock() = Some(token);
    }

    /// Drop the current token and remove the session file.
    pub fn clear(&self) {
        *self.lock() = None;
        if let Some(path) = &self.session_path {
            let _ = std::fs::remove_file(path);
        }
    }

    /// Current token, cloned.
    pub fn get(&self) -> Option<AuthToken> {
        self.lock().clone()
    }

    /// Current token, or an `AuthRequired` error when none is held.
    pub fn require(&self) -> DriveResult<AuthToken> {
        self.get()
            .ok_or_else(|| DriveError::auth_required("No access token set"))
    }

    /// Whether a non-expired token is held.
    pub fn is_authenticated(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|t| !t.access_token.is_empty() && !t.is_expired())
            .unwrap_or(false)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AuthToken>> {
        // A poisoned lock only means a panicking thread held it; the
        // Option inside is still coherent.
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
