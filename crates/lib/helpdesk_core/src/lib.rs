//! # helpdesk_core
//!
//! Core domain logic for the Helpdesk support chat: input validation,
//! conversation storage, reply generation and the request orchestrator.

pub mod cache;
pub mod chat;
pub mod migrate;
pub mod models;
pub mod reply;
pub mod store;
pub mod uuid;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
