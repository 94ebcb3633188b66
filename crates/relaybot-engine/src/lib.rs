//! Conversation engine for Relaybot.
//!
//! Takes raw incoming messages from an account's transport and turns them
//! into the right outcome: a one-time greeting, an AI-generated reply
//! persisted as a turn pair, a fixed apology on failure, or silence.
//!
//! - [`assembler`] — normalize text/image input into one request payload
//! - [`commands`] — owner sleep/wake self-commands
//! - [`gates`] — at most one in-flight exchange per (account, user)
//! - [`engine`] — the exchange flow itself

pub mod assembler;
pub mod commands;
pub mod engine;
pub mod gates;

pub use commands::SelfCommand;
pub use engine::{ConversationEngine, ExchangeOutcome};
pub use gates::ExchangeGates;
