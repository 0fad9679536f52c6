//! # Gateway Studio – Google Sign-In
//!
//! Sign-in lifecycle for the app: a phase machine that gates sign-in
//! until initialization completes, an implicit-grant handshake between
//! the UI request and the OAuth redirect, and session teardown that
//! always lands in a clean signed-out state.

pub mod types;
pub mod grant;
pub mod identity;
pub mod controller;
pub mod commands;
