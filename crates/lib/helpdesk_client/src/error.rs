//! Client error types.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No data directory available for session storage")]
    NoDataDir,
}
