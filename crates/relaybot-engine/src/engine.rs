//! The conversation engine — one per account.
//!
//! Every incoming private message funnels through [`ConversationEngine::handle_exchange`]:
//!
//! 1. asleep account → silence
//! 2. first contact → one-time greeting, no history touched
//! 3. otherwise → assemble payload, read recent history, call the backend,
//!    persist the turn pair, reply
//!
//! Any failure inside step 3 is contained to that exchange: the user gets a
//! fixed apology, nothing is persisted, and the account keeps running.

use std::sync::Arc;

use tracing::{debug, info, warn};

use relaybot_core::history::{call_blocking, HistoryStore};
use relaybot_core::{AccountState, IncomingMessage, RelayError};
use relaybot_providers::AiBackend;

use crate::assembler;
use crate::commands::SelfCommand;
use crate::gates::ExchangeGates;

/// Sent when an exchange fails for any reason.
pub const APOLOGY: &str = "Sorry, something went wrong. Let's start over.";

/// Persisted and sent when the backend succeeds but returns no usable text.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't catch that. Could you say it again?";

/// Stored as the user's turn when the message was image-only.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// How one exchange ended, with the text (if any) to send back.
#[derive(Clone, Debug, PartialEq)]
pub enum ExchangeOutcome {
    /// Nothing to send: asleep account or empty message.
    Silent,
    /// First contact — the one-time greeting.
    Greeting(String),
    /// A completed exchange, already persisted.
    Reply(String),
    /// The exchange failed; nothing was persisted.
    Apology(String),
}

impl ExchangeOutcome {
    /// The text the transport should deliver, if any.
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            ExchangeOutcome::Silent => None,
            ExchangeOutcome::Greeting(t)
            | ExchangeOutcome::Reply(t)
            | ExchangeOutcome::Apology(t) => Some(t),
        }
    }
}

/// Per-account conversation engine.
pub struct ConversationEngine {
    store: Arc<HistoryStore>,
    backend: Arc<dyn AiBackend>,
    account_id: String,
    persona: String,
    greeting: String,
    window: usize,
    gates: ExchangeGates,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<HistoryStore>,
        backend: Arc<dyn AiBackend>,
        account_id: impl Into<String>,
        persona: impl Into<String>,
        greeting: impl Into<String>,
        window: usize,
    ) -> Self {
        ConversationEngine {
            store,
            backend,
            account_id: account_id.into(),
            persona: persona.into(),
            greeting: greeting.into(),
            window,
            gates: ExchangeGates::new(),
        }
    }

    /// Process one incoming private message end to end.
    ///
    /// Never returns an error: failures are absorbed into
    /// [`ExchangeOutcome::Apology`] so a bad exchange cannot take the
    /// account down.
    pub async fn handle_exchange(
        &self,
        state: &AccountState,
        message: IncomingMessage,
    ) -> ExchangeOutcome {
        if !state.is_active() {
            debug!(account = %self.account_id, user = %message.user_id, "asleep, ignoring message");
            return ExchangeOutcome::Silent;
        }

        let gate = self.gates.gate(&message.user_id);
        let _guard = gate.lock().await;

        // Re-check after waiting: a sleep command may have landed while
        // this message was queued behind the gate.
        if !state.is_active() {
            return ExchangeOutcome::Silent;
        }

        if !state.has_greeted(&message.user_id) {
            state.mark_greeted(&message.user_id);
            info!(account = %self.account_id, user = %message.user_id, "greeting new user");
            return ExchangeOutcome::Greeting(self.greeting.clone());
        }

        match self.run_exchange(&message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    account = %self.account_id,
                    user = %message.user_id,
                    kind = e.kind(),
                    error = %e,
                    "exchange failed, sending apology"
                );
                ExchangeOutcome::Apology(APOLOGY.to_string())
            }
        }
    }

    /// The fallible middle of an exchange. Persistence happens only after
    /// the backend call succeeds, so a failed call leaves no trace.
    async fn run_exchange(&self, message: &IncomingMessage) -> Result<ExchangeOutcome, RelayError> {
        let payload = match assembler::assemble(message)? {
            Some(p) => p,
            None => {
                debug!(account = %self.account_id, user = %message.user_id, "empty message, nothing to do");
                return Ok(ExchangeOutcome::Silent);
            }
        };

        let user_id = message.user_id.clone();
        let window = self.window;
        let history = call_blocking(self.store.clone(), move |s| s.recent(&user_id, window)).await?;

        debug!(
            account = %self.account_id,
            user = %message.user_id,
            backend = self.backend.display_name(),
            history = history.len(),
            has_image = payload.has_image(),
            "running exchange"
        );

        let reply = self.backend.generate(&self.persona, &history, &payload).await?;
        let reply_text = reply
            .usable_text()
            .unwrap_or(FALLBACK_REPLY)
            .to_string();

        let user_id = message.user_id.clone();
        let user_content = payload.persisted_text(IMAGE_PLACEHOLDER);
        let model_content = reply_text.clone();
        call_blocking(self.store.clone(), move |s| {
            s.append_exchange(&user_id, &user_content, &model_content)
        })
        .await?;

        Ok(ExchangeOutcome::Reply(reply_text))
    }

    /// Handle a message the owner sent from their own client. Returns the
    /// confirmation text to edit the original message into, or `None` if
    /// it was ordinary outgoing traffic.
    pub fn handle_self_command(&self, state: &AccountState, text: &str) -> Option<&'static str> {
        let command = SelfCommand::parse(text)?;
        state.set_active(command.target_active());
        info!(
            account = %self.account_id,
            active = command.target_active(),
            "owner toggled account"
        );
        Some(command.confirmation())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
