//! Owner self-commands — sleep and wake toggles typed from the account
//! owner's own client.

/// A recognized self-command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfCommand {
    Sleep,
    Wake,
}

/// Confirmation text the original message is edited into.
pub const SLEEP_CONFIRMATION: &str = "Bot is now asleep. \u{1F634}";
pub const WAKE_CONFIRMATION: &str = "Bot is now awake. \u{1F60E}";

impl SelfCommand {
    /// Parse an outgoing message typed by the owner. Commands are matched
    /// on the trimmed text, case-insensitively; anything else is not a
    /// command and must be left alone.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "/bot_sleep" => Some(SelfCommand::Sleep),
            "/bot_wakeup" => Some(SelfCommand::Wake),
            _ => None,
        }
    }

    /// Whether this command leaves the account active.
    pub fn target_active(&self) -> bool {
        matches!(self, SelfCommand::Wake)
    }

    pub fn confirmation(&self) -> &'static str {
        match self {
            SelfCommand::Sleep => SLEEP_CONFIRMATION,
            SelfCommand::Wake => WAKE_CONFIRMATION,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
