//! Relaybot core — shared types, error taxonomy, durable conversation
//! history, per-account session state, and configuration.
//!
//! The crates above this one (`relaybot-engine`, `relaybot-accounts`,
//! `relaybot-providers`) only ever talk to each other through the types
//! defined here.

pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod types;
pub mod utils;

pub use error::RelayError;
pub use history::HistoryStore;
pub use session::{AccountPhase, AccountState};
pub use types::{
    BackendReply, ConversationTurn, IncomingMessage, PayloadPart, RequestPayload, TurnRole,
};
