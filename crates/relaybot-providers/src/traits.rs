//! AI backend trait — the single seam between the conversation engine and
//! whatever model serves the replies.

use async_trait::async_trait;

use relaybot_core::{BackendReply, ConversationTurn, RelayError, RequestPayload};

/// One request/response call against a generative backend.
///
/// The engine performs no retries: a failed call surfaces as
/// `RelayError::Backend` and takes the fixed-apology path, while a
/// successful call with no usable text takes the fixed-fallback path.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generate a reply from (system persona, prior turns, new payload).
    ///
    /// `history` is oldest-first and already trimmed to the configured
    /// window by the caller.
    async fn generate(
        &self,
        persona: &str,
        history: &[ConversationTurn],
        payload: &RequestPayload,
    ) -> Result<BackendReply, RelayError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
