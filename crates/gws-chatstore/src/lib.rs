//! # Gateway Studio – Chat Store
//!
//! Persists conversations as JSON documents in the app's Drive folder.
//!
//! ## Features
//!
//! - **Document model** – chats, turns, structured response parts with
//!   tolerant ingestion and verbatim passthrough of unknown blocks
//! - **Promotion** – a local unsaved session becomes a remote document
//!   in one atomic step from the caller's perspective
//! - **Retrying delete** – bounded backoff, idempotent against `NotFound`
//! - **Test support** – an in-memory remote for consumers' tests

pub mod types;
pub mod remote;
pub mod store;
pub mod testing;
pub mod commands;
