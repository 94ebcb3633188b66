//! Console transport — a local stdin/stdout account for development and
//! demos.
//!
//! Every typed line arrives as a private message from the user `console`;
//! lines starting with `/bot_` are treated as the owner's own outgoing
//! messages so sleep/wake can be exercised without a real account.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use relaybot_core::{IncomingMessage, RelayError};

use crate::transport::{Transport, TransportEvent};

/// Pseudo user id for everything typed on stdin.
pub const CONSOLE_USER: &str = "console";

pub struct ConsoleTransport {
    account_id: String,
    lines: Mutex<Lines<BufReader<Stdin>>>,
    next_message_id: AtomicI64,
}

impl ConsoleTransport {
    pub fn new(account_id: impl Into<String>) -> Self {
        ConsoleTransport {
            account_id: account_id.into(),
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            next_message_id: AtomicI64::new(1),
        }
    }

    fn classify(&self, line: String) -> TransportEvent {
        if line.trim_start().starts_with("/bot_") {
            TransportEvent::OutgoingSelf {
                message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
                text: line,
            }
        } else {
            TransportEvent::Incoming {
                message: IncomingMessage::text(CONSOLE_USER, line),
                private: true,
                sender_is_bot: false,
            }
        }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn connect(&self) -> Result<(), RelayError> {
        println!("Console session open. Type a message, or /bot_sleep and /bot_wakeup. Ctrl-D to quit.");
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<TransportEvent>, RelayError> {
        let mut lines = self.lines.lock().await;
        let line = lines
            .next_line()
            .await
            .map_err(|e| RelayError::Transport(format!("stdin read failed: {e}")))?;
        Ok(line.map(|l| self.classify(l)))
    }

    async fn reply(&self, user_id: &str, text: &str) -> Result<(), RelayError> {
        println!("[{} -> {}] {}", self.account_id, user_id, text);
        Ok(())
    }

    async fn edit_self(&self, _message_id: i64, text: &str) -> Result<(), RelayError> {
        println!("[{}] {}", self.account_id, text);
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
