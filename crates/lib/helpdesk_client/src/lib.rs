//! # helpdesk_client
//!
//! Client side of the Helpdesk chat: a typed HTTP client for the API and the
//! chat widget state machine that drives it.

pub mod api;
pub mod error;
pub mod storage;
pub mod widget;

pub use api::{ChatApi, HttpChatApi};
pub use error::{ClientError, Result};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use widget::{ChatWidget, DisplayMessage, Sender};
