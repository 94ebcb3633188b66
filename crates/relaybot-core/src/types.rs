//! Core types for Relaybot — conversation turns, transient incoming
//! messages, and the normalized request payload sent to the AI backend.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Who produced a persisted turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    /// Stable string form used in the `turns` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(TurnRole::User),
            "model" => Some(TurnRole::Model),
            _ => None,
        }
    }
}

/// One persisted unit of conversation — either the user's input or the
/// model's reply. Immutable once written; `id` is the store-assigned
/// monotonic order key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub user_id: String,
    pub role: TurnRole,
    pub content: String,
    /// RFC 3339 timestamp assigned at insert time.
    pub created_at: String,
}

// ─────────────────────────────────────────────
// Incoming messages (transient)
// ─────────────────────────────────────────────

/// A raw incoming direct message as handed over by the transport.
///
/// Lives only for the duration of one exchange; only its derived
/// [`ConversationTurn`] is ever stored.
#[derive(Clone, Debug, Default)]
pub struct IncomingMessage {
    /// Opaque sender identifier within the transport.
    pub user_id: String,
    /// Text content, if any.
    pub text: Option<String>,
    /// Raw image bytes, if the message carried a photo.
    pub image: Option<Vec<u8>>,
}

impl IncomingMessage {
    /// A text-only message.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        IncomingMessage {
            user_id: user_id.into(),
            text: Some(text.into()),
            image: None,
        }
    }

    /// Whether there is nothing to process at all.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.is_empty()) && self.image.is_none()
    }
}

// ─────────────────────────────────────────────
// Request payload (assembler output)
// ─────────────────────────────────────────────

/// One ordered part of a backend request.
#[derive(Clone, Debug, PartialEq)]
pub enum PayloadPart {
    /// Verbatim user text.
    Text(String),
    /// Re-encoded image bytes in a fixed transport-neutral format.
    Image { mime_type: String, data: Vec<u8> },
}

/// The normalized, ordered payload for a single backend call.
///
/// Invariant: parts are ordered text-then-image and the payload is never
/// empty (the assembler returns `None` instead of an empty payload).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestPayload {
    pub parts: Vec<PayloadPart>,
}

impl RequestPayload {
    /// The text persisted as the user's turn: text parts joined verbatim,
    /// or the fixed placeholder when the payload is image-only.
    pub fn persisted_text(&self, image_placeholder: &str) -> String {
        let text: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                PayloadPart::Text(t) => Some(t.as_str()),
                PayloadPart::Image { .. } => None,
            })
            .collect();
        if text.is_empty() {
            image_placeholder.to_string()
        } else {
            text.join("\n")
        }
    }

    /// Whether any part is an image.
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, PayloadPart::Image { .. }))
    }
}

// ─────────────────────────────────────────────
// Backend reply
// ─────────────────────────────────────────────

/// What a successful AI backend call produced.
///
/// `text: None` (or empty) means the call succeeded but carried no usable
/// answer — the engine substitutes its fixed fallback string and still
/// persists the exchange. A failed call is a `RelayError::Backend` instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendReply {
    pub text: Option<String>,
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        BackendReply {
            text: Some(text.into()),
        }
    }

    /// Empty-but-successful reply.
    pub fn empty() -> Self {
        BackendReply { text: None }
    }

    /// The reply text, if it is non-empty after trimming.
    pub fn usable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
