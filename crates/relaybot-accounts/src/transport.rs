//! Transport trait — the abstract interface every messaging account
//! implements.
//!
//! A transport owns one logged-in account on some messaging service. The
//! supervisor drives it: pull events with `next_event()`, deliver replies
//! with `reply()`, rewrite the owner's own command messages with
//! `edit_self()`.

use async_trait::async_trait;

use relaybot_core::{IncomingMessage, RelayError};

/// One event observed on an account.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// A message someone sent to this account.
    Incoming {
        message: IncomingMessage,
        /// Whether this arrived in a one-on-one conversation. Group
        /// traffic is observed but never answered.
        private: bool,
        /// Whether the transport knows the sender to be another bot.
        /// Bot-to-bot loops are cut off here.
        sender_is_bot: bool,
    },
    /// A message the account owner sent from their own client.
    OutgoingSelf {
        /// Transport-level id of the owner's message, for editing.
        message_id: i64,
        text: String,
    },
}

/// Every messaging account implements this trait.
///
/// The supervisor holds an `Arc<dyn Transport>` and runs the event loop;
/// a transport error is fatal for its own account only.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stable account identifier matching the config entry.
    fn account_id(&self) -> &str;

    /// Establish the session. Called once before the event loop.
    async fn connect(&self) -> Result<(), RelayError>;

    /// Next event on this account. `Ok(None)` means the stream ended
    /// cleanly (disconnect or shutdown).
    async fn next_event(&self) -> Result<Option<TransportEvent>, RelayError>;

    /// Send `text` to `user_id` in their private conversation.
    async fn reply(&self, user_id: &str, text: &str) -> Result<(), RelayError>;

    /// Edit one of the owner's own messages in place (used to confirm
    /// sleep/wake commands).
    async fn edit_self(&self, message_id: i64, text: &str) -> Result<(), RelayError>;
}
