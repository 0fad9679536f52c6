//! # Gateway Studio – Google Drive Integration
//!
//! Google Drive API v3 integration backing the app's chat storage.
//!
//! ## Features
//!
//! - **Implicit-grant OAuth2** – authorization URL, userinfo, revocation
//! - **Token store** – shared session token cell with optional file mirror
//! - **File Management** – list, multipart create, media update, rename, delete
//! - **App Folder** – root-level folder find-or-create, cached per session

pub mod types;
pub mod token_store;
pub mod client;
pub mod auth;
pub mod files;
pub mod folders;
pub mod service;
