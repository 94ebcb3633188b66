//! Per-account supervisor — the event loop that wires one transport to one
//! conversation engine.
//!
//! Each incoming private message is handled in its own `tokio::spawn` task,
//! so a slow backend call for one user never blocks the account's event
//! loop. The engine's per-user gates keep concurrent messages from the same
//! user serialized.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use relaybot_core::{AccountPhase, AccountState};
use relaybot_engine::ConversationEngine;

use crate::transport::{Transport, TransportEvent};

/// How one account's run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The transport's event stream ended cleanly.
    Disconnected,
    /// Connect failed or the event stream returned an error.
    Failed(String),
}

/// Supervises one account: owns its state, drives its transport, and
/// dispatches exchanges to the engine.
pub struct AccountSupervisor {
    transport: Arc<dyn Transport>,
    engine: Arc<ConversationEngine>,
    state: Arc<AccountState>,
}

impl AccountSupervisor {
    pub fn new(transport: Arc<dyn Transport>, engine: Arc<ConversationEngine>) -> Self {
        AccountSupervisor {
            transport,
            engine,
            state: Arc::new(AccountState::new()),
        }
    }

    pub fn account_id(&self) -> &str {
        self.transport.account_id()
    }

    pub fn state(&self) -> Arc<AccountState> {
        self.state.clone()
    }

    /// Run the account until its transport ends. Never panics the fleet:
    /// every failure becomes an [`AccountOutcome`].
    pub async fn run(&self) -> AccountOutcome {
        let account = self.transport.account_id().to_string();

        if let Err(e) = self.transport.connect().await {
            error!(account = %account, error = %e, "account failed to connect");
            self.state.set_phase(AccountPhase::Stopped);
            return AccountOutcome::Failed(e.to_string());
        }
        info!(account = %account, "account connected");
        self.state.set_phase(AccountPhase::Active);

        loop {
            match self.transport.next_event().await {
                Ok(Some(event)) => self.dispatch(event),
                Ok(None) => {
                    info!(account = %account, "account disconnected");
                    self.state.set_phase(AccountPhase::Stopped);
                    return AccountOutcome::Disconnected;
                }
                Err(e) => {
                    error!(account = %account, error = %e, "account event stream failed");
                    self.state.set_phase(AccountPhase::Stopped);
                    return AccountOutcome::Failed(e.to_string());
                }
            }
        }
    }

    fn dispatch(&self, event: TransportEvent) {
        match event {
            TransportEvent::Incoming {
                message,
                private,
                sender_is_bot,
            } => {
                if !private || sender_is_bot {
                    debug!(
                        account = %self.transport.account_id(),
                        user = %message.user_id,
                        private,
                        sender_is_bot,
                        "ignoring message outside the relay's scope"
                    );
                    return;
                }

                let transport = self.transport.clone();
                let engine = self.engine.clone();
                let state = self.state.clone();

                tokio::spawn(async move {
                    let user_id = message.user_id.clone();
                    let outcome = engine.handle_exchange(&state, message).await;
                    if let Some(text) = outcome.reply_text() {
                        if let Err(e) = transport.reply(&user_id, text).await {
                            warn!(
                                account = %transport.account_id(),
                                user = %user_id,
                                error = %e,
                                "failed to deliver reply"
                            );
                        }
                    }
                });
            }
            TransportEvent::OutgoingSelf { message_id, text } => {
                if let Some(confirmation) = self.engine.handle_self_command(&self.state, &text) {
                    let transport = self.transport.clone();
                    tokio::spawn(async move {
                        if let Err(e) = transport.edit_self(message_id, confirmation).await {
                            warn!(
                                account = %transport.account_id(),
                                error = %e,
                                "failed to edit command confirmation"
                            );
                        }
                    });
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relaybot_core::history::HistoryStore;
    use relaybot_core::{
        BackendReply, ConversationTurn, IncomingMessage, RelayError, RequestPayload,
    };
    use relaybot_providers::AiBackend;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct EchoBackend;

    #[async_trait]
    impl AiBackend for EchoBackend {
        async fn generate(
            &self,
            _persona: &str,
            _history: &[ConversationTurn],
            payload: &RequestPayload,
        ) -> Result<BackendReply, RelayError> {
            Ok(BackendReply::text(format!(
                "echo: {}",
                payload.persisted_text("[image]")
            )))
        }

        fn display_name(&self) -> &str {
            "Echo"
        }
    }

    /// Scripted transport: plays back a fixed event list, records what the
    /// supervisor sends.
    struct ScriptedTransport {
        id: String,
        events: StdMutex<Vec<Result<Option<TransportEvent>, RelayError>>>,
        replies: StdMutex<Vec<(String, String)>>,
        edits: StdMutex<Vec<(i64, String)>>,
        fail_connect: bool,
    }

    impl ScriptedTransport {
        fn new(id: &str, mut events: Vec<Result<Option<TransportEvent>, RelayError>>) -> Self {
            // Always end the stream after the script.
            events.push(Ok(None));
            events.reverse();
            ScriptedTransport {
                id: id.to_string(),
                events: StdMutex::new(events),
                replies: StdMutex::new(Vec::new()),
                edits: StdMutex::new(Vec::new()),
                fail_connect: false,
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn account_id(&self) -> &str {
            &self.id
        }

        async fn connect(&self) -> Result<(), RelayError> {
            if self.fail_connect {
                return Err(RelayError::Transport("login rejected".into()));
            }
            Ok(())
        }

        async fn next_event(&self) -> Result<Option<TransportEvent>, RelayError> {
            // Let previously spawned exchange tasks run to completion, so
            // scripted ordering is deterministic.
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.events.lock().unwrap().pop().unwrap_or(Ok(None))
        }

        async fn reply(&self, user_id: &str, text: &str) -> Result<(), RelayError> {
            self.replies
                .lock()
                .unwrap()
                .push((user_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn edit_self(&self, message_id: i64, text: &str) -> Result<(), RelayError> {
            self.edits
                .lock()
                .unwrap()
                .push((message_id, text.to_string()));
            Ok(())
        }
    }

    fn incoming(user: &str, text: &str) -> Result<Option<TransportEvent>, RelayError> {
        Ok(Some(TransportEvent::Incoming {
            message: IncomingMessage::text(user, text),
            private: true,
            sender_is_bot: false,
        }))
    }

    fn make_supervisor(transport: Arc<ScriptedTransport>) -> AccountSupervisor {
        let store = Arc::new(HistoryStore::open_in_memory().unwrap());
        let engine = Arc::new(ConversationEngine::new(
            store,
            Arc::new(EchoBackend),
            transport.account_id().to_string(),
            "persona",
            "Hello from the relay.",
            10,
        ));
        AccountSupervisor::new(transport, engine)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_first_contact_then_exchange() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![incoming("u1", "hi"), incoming("u1", "what's up?")],
        ));
        let supervisor = make_supervisor(transport.clone());

        let outcome = supervisor.run().await;
        settle().await;

        assert_eq!(outcome, AccountOutcome::Disconnected);
        assert_eq!(supervisor.state().phase(), AccountPhase::Stopped);
        let replies = transport.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], ("u1".to_string(), "Hello from the relay.".to_string()));
        assert_eq!(replies[1], ("u1".to_string(), "echo: what's up?".to_string()));
    }

    #[tokio::test]
    async fn test_group_messages_are_ignored() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![Ok(Some(TransportEvent::Incoming {
                message: IncomingMessage::text("u1", "hi all"),
                private: false,
                sender_is_bot: false,
            }))],
        ));
        let supervisor = make_supervisor(transport.clone());

        supervisor.run().await;
        settle().await;

        assert!(transport.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bot_senders_are_ignored() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![Ok(Some(TransportEvent::Incoming {
                message: IncomingMessage::text("some-bot", "automated notice"),
                private: true,
                sender_is_bot: true,
            }))],
        ));
        let supervisor = make_supervisor(transport.clone());

        supervisor.run().await;
        settle().await;

        assert!(transport.replies.lock().unwrap().is_empty());
        // Not even greeted: bot traffic causes no state mutation.
        assert!(!supervisor.state().has_greeted("some-bot"));
    }

    #[tokio::test]
    async fn test_sleep_command_edits_and_silences() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![
                incoming("u1", "hi"), // greeting, marks u1
                Ok(Some(TransportEvent::OutgoingSelf {
                    message_id: 7,
                    text: "/bot_sleep".to_string(),
                })),
                incoming("u1", "are you there?"),
            ],
        ));
        let supervisor = make_supervisor(transport.clone());

        supervisor.run().await;
        settle().await;

        let edits = transport.edits.lock().unwrap().clone();
        assert_eq!(edits, vec![(7, "Bot is now asleep. \u{1F634}".to_string())]);

        // Only the greeting went out; the post-sleep message got nothing.
        let replies = transport.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 1);
        assert!(!supervisor.state().is_active());
    }

    #[tokio::test]
    async fn test_wake_resumes_replies() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![
                incoming("u1", "hi"),
                Ok(Some(TransportEvent::OutgoingSelf {
                    message_id: 1,
                    text: "/bot_sleep".to_string(),
                })),
                Ok(Some(TransportEvent::OutgoingSelf {
                    message_id: 2,
                    text: "/bot_wakeup".to_string(),
                })),
                incoming("u1", "back?"),
            ],
        ));
        let supervisor = make_supervisor(transport.clone());

        supervisor.run().await;
        settle().await;

        let replies = transport.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].1, "echo: back?");
        assert!(supervisor.state().is_active());
    }

    #[tokio::test]
    async fn test_ordinary_outgoing_is_left_alone() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![Ok(Some(TransportEvent::OutgoingSelf {
                message_id: 3,
                text: "see you at 8".to_string(),
            }))],
        ));
        let supervisor = make_supervisor(transport.clone());

        supervisor.run().await;
        settle().await;

        assert!(transport.edits.lock().unwrap().is_empty());
        assert!(supervisor.state().is_active());
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let mut transport = ScriptedTransport::new("acct", vec![]);
        transport.fail_connect = true;
        let supervisor = make_supervisor(Arc::new(transport));

        let outcome = supervisor.run().await;
        assert!(matches!(outcome, AccountOutcome::Failed(msg) if msg.contains("login rejected")));
        assert_eq!(supervisor.state().phase(), AccountPhase::Stopped);
    }

    #[tokio::test]
    async fn test_event_stream_error_ends_account() {
        let transport = Arc::new(ScriptedTransport::new(
            "acct",
            vec![
                incoming("u1", "hi"),
                Err(RelayError::Transport("connection reset".into())),
            ],
        ));
        let supervisor = make_supervisor(transport.clone());

        let outcome = supervisor.run().await;
        settle().await;

        assert!(matches!(outcome, AccountOutcome::Failed(msg) if msg.contains("connection reset")));
        // The exchange before the failure still went out.
        assert_eq!(transport.replies.lock().unwrap().len(), 1);
    }
}
