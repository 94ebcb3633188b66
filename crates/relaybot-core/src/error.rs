//! Error taxonomy for the relay.
//!
//! One variant per failure domain:
//! - `Transport` — connection/auth failures, fatal to one account
//! - `Assembly` — malformed/undecodable input, aborts one exchange
//! - `Backend`  — AI call failed, aborts the exchange (apology path)
//! - `Storage`  — history read/write failure, aborts the exchange
//! - `Io`       — filesystem failure opening the store or config
//!
//! Exchange-scoped kinds never propagate past the conversation engine;
//! account-scoped kinds never propagate past the account supervisor.

use thiserror::Error;

/// All errors that cross a component boundary inside the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport connection or auth failure. Fatal for one account.
    #[error("transport error: {0}")]
    Transport(String),

    /// Incoming message could not be turned into a request payload.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// The AI backend call failed (HTTP error, bad response body, ...).
    #[error("backend error: {0}")]
    Backend(String),

    /// History store read/write failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure while opening the store or config.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Stable label for structured logging and aggregate reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport",
            RelayError::Assembly(_) => "assembly",
            RelayError::Backend(_) => "backend",
            RelayError::Storage(_) => "storage",
            RelayError::Io(_) => "io",
        }
    }
}
