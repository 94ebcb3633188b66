//! Configuration schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

/// Default greeting for first contact. Per-account override via
/// `accounts[].greeting`.
pub const DEFAULT_GREETING: &str = "Hey, this is an AI assistant covering for the account owner. \
They're not here at the moment, but I can help you with any topic or pass a message along.";

/// Default persona text sent as the backend's system instruction.
pub const DEFAULT_PERSONA: &str = "You are a polite, concise assistant answering direct messages \
on behalf of the account owner while they are away. Keep answers to 2-3 lines unless more detail \
is genuinely needed, answer in the language the user wrote in, and describe images neutrally. \
If the user leaves a message for the owner, confirm that you will pass it along.";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.relaybot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub accounts: Vec<AccountConfig>,
    pub provider: ProviderConfig,
    pub history: HistoryConfig,
    pub liveness: LivenessConfig,
}

// ─────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────

/// One messaging account managed by its own supervisor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountConfig {
    /// Stable identifier used in logs and the aggregate outcome report.
    pub id: String,
    /// Opaque transport credential (e.g. a session string).
    #[serde(default)]
    pub session: String,
    /// System instruction defining the backend's behavior for this account.
    pub persona: String,
    /// First-contact reply. Falls back to the fixed default when empty.
    #[serde(default)]
    pub greeting: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            session: String::new(),
            persona: DEFAULT_PERSONA.to_string(),
            greeting: String::new(),
        }
    }
}

impl AccountConfig {
    /// The greeting to send on first contact.
    pub fn greeting_text(&self) -> &str {
        if self.greeting.is_empty() {
            DEFAULT_GREETING
        } else {
            &self.greeting
        }
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// AI backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            api_base: None,
        }
    }
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// History
// ─────────────────────────────────────────────

/// History store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Path to the SQLite database. `~` is expanded.
    pub db_path: String,
    /// How many recent turns seed the backend's memory per exchange.
    pub window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.relaybot/relaybot.db".to_string(),
            window: 10,
        }
    }
}

// ─────────────────────────────────────────────
// Liveness
// ─────────────────────────────────────────────

/// Liveness HTTP endpoint, for external uptime monitors.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivenessConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

fn default_true() -> bool {
    true
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.accounts.is_empty());
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.history.window, 10);
        assert_eq!(config.liveness.port, 10000);
        assert!(config.liveness.enabled);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "accounts": [
                { "id": "main", "session": "abc123", "persona": "Be terse." }
            ],
            "history": { "dbPath": "/tmp/test.db", "window": 6 },
            "liveness": { "host": "127.0.0.1", "port": 9090 }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].id, "main");
        assert_eq!(config.accounts[0].persona, "Be terse.");
        assert_eq!(config.history.db_path, "/tmp/test.db");
        assert_eq!(config.history.window, 6);
        assert_eq!(config.liveness.port, 9090);
        // Defaults preserved for missing fields
        assert_eq!(config.provider.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_account_greeting_fallback() {
        let account = AccountConfig::default();
        assert_eq!(account.greeting_text(), DEFAULT_GREETING);

        let custom = AccountConfig {
            greeting: "Hi, leave a message!".to_string(),
            ..Default::default()
        };
        assert_eq!(custom.greeting_text(), "Hi, leave a message!");
    }

    #[test]
    fn test_provider_is_configured() {
        assert!(!ProviderConfig::default().is_configured());
        let with_key = ProviderConfig {
            api_key: "key-123".to_string(),
            ..Default::default()
        };
        assert!(with_key.is_configured());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default();
        config.accounts.push(AccountConfig::default());
        config.provider.api_key = "k".into();

        let json_str = serde_json::to_string_pretty(&config).unwrap();
        let reloaded: Config = serde_json::from_str(&json_str).unwrap();
        assert_eq!(reloaded.accounts.len(), 1);
        assert_eq!(reloaded.provider.api_key, "k");
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["history"].get("dbPath").is_some());
        assert!(json["history"].get("db_path").is_none());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.history.window, 10);
        assert_eq!(config.liveness.host, "0.0.0.0");
    }
}
