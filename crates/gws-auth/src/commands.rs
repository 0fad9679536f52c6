//! Tauri command handlers for the sign-in lifecycle.
//!
//! All commands follow the `auth_*` naming convention and accept
//! `State<'_, AuthControllerState>` as their first parameter.

use std::sync::Arc;

use tauri::State;
use tokio::sync::Mutex;

use gws_gdrive::types::GrantResponse;

use crate::controller::AuthController;
use crate::types::{AuthError, AuthErrorKind, AuthStatus};

/// Shared, managed controller state.
pub type AuthControllerState = Arc<Mutex<AuthController>>;

fn err_str(e: AuthError) -> String {
    e.to_string()
}

/// Bring the auth controller to ready.
#[tauri::command]
pub async fn auth_initialize(state: State<'_, AuthControllerState>) -> Result<AuthStatus, String> {
    let mut ctrl = state.lock().await;
    ctrl.initialize().await.map_err(err_str)
}

/// Start a sign-in attempt; returns the authorization URL to open.
#[tauri::command]
pub async fn auth_sign_in(state: State<'_, AuthControllerState>) -> Result<String, String> {
    let mut ctrl = state.lock().await;
    ctrl.sign_in().map_err(err_str)
}

/// Await the outcome of the outstanding sign-in attempt.
#[tauri::command]
pub async fn auth_wait_for_sign_in(
    state: State<'_, AuthControllerState>,
) -> Result<AuthStatus, String> {
    // Claim the waiter under the lock, await it without.
    let waiter = {
        let mut ctrl = state.lock().await;
        ctrl.take_sign_in_waiter()
    };
    let Some(waiter) = waiter else {
        return Err(err_str(AuthError::new(
            AuthErrorKind::NotReady,
            "No sign-in attempt is in progress",
        )));
    };
    match waiter.await {
        Ok(Ok(_profile)) => {
            let ctrl = state.lock().await;
            Ok(ctrl.status())
        }
        Ok(Err(e)) => Err(err_str(e)),
        Err(_) => Err(err_str(AuthError::new(
            AuthErrorKind::Superseded,
            "Sign-in attempt was superseded",
        ))),
    }
}

/// Deliver the grant payload from the redirect target.
#[tauri::command]
pub async fn auth_handle_grant(
    state: State<'_, AuthControllerState>,
    response: GrantResponse,
) -> Result<AuthStatus, String> {
    let mut ctrl = state.lock().await;
    ctrl.handle_grant(response).await.map_err(err_str)
}

/// Sign out and clear the session.
#[tauri::command]
pub async fn auth_sign_out(state: State<'_, AuthControllerState>) -> Result<AuthStatus, String> {
    let mut ctrl = state.lock().await;
    Ok(ctrl.sign_out().await)
}

/// Current auth status snapshot.
#[tauri::command]
pub async fn auth_status(state: State<'_, AuthControllerState>) -> Result<AuthStatus, String> {
    let ctrl = state.lock().await;
    Ok(ctrl.status())
}
