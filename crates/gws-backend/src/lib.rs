//! # Gateway Studio – Backend Clients
//!
//! Thin HTTP clients for the generation backend (`POST /api/generate`,
//! multipart) and the repo-clone backend (`POST /api/clone_repo`, JSON).
//! Response blocks stay opaque here; the conversation layer owns their
//! interpretation.

pub mod types;
pub mod client;
