//! Pending sign-in handshake.
//!
//! At most one sign-in attempt is outstanding at a time. `begin()` hands
//! the caller a receiver for the attempt's outcome; a second `begin()`
//! supersedes the first (the superseded receiver observes a closed
//! channel). `resolve()` completes the current attempt and reports whether
//! one was actually pending, so a late grant delivery can be accepted and
//! logged without a matching request.

use std::sync::Mutex;

use log::debug;
use tokio::sync::oneshot;

use crate::types::SignInOutcome;

/// Single-slot coordination between a sign-in request and the grant
/// callback that completes it.
pub struct GrantExchange {
    pending: Mutex<Option<oneshot::Sender<SignInOutcome>>>,
}

impl GrantExchange {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Start a new attempt, superseding any outstanding one.
    pub fn begin(&self) -> oneshot::Receiver<SignInOutcome> {
        let (tx, rx) = oneshot::channel();
        let previous = self.lock().replace(tx);
        if previous.is_some() {
            debug!("Superseding outstanding sign-in attempt");
        }
        rx
    }

    /// Complete the current attempt. Returns `false` when none was pending
    /// (the outcome is dropped; the session state was already updated by
    /// the caller).
    pub fn resolve(&self, outcome: SignInOutcome) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Drop the current attempt without resolving it (sign-out, shutdown).
    pub fn cancel(&self) {
        self.lock().take();
    }

    /// Whether an attempt is outstanding.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<SignInOutcome>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for GrantExchange {
    fn default() -> Self {
        Self::new()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
