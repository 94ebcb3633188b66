//! Gemini `generateContent` HTTP client.
//!
//! Talks directly to the REST endpoint via `reqwest`: prior turns become
//! `contents` entries with role `user`/`model`, the persona becomes the
//! `systemInstruction`, and image parts are sent as base64 `inlineData`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use relaybot_core::{BackendReply, ConversationTurn, PayloadPart, RelayError, RequestPayload, TurnRole};

use crate::traits::AiBackend;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Backend implementation that talks to the Gemini HTTP API.
pub struct GeminiBackend {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL, overridable for tests and proxies.
    api_base: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a new backend for the given key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, api_base: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        GeminiBackend {
            client,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/{}:generateContent?key={}", base, self.model, self.api_key)
    }

    fn build_request(
        &self,
        persona: &str,
        history: &[ConversationTurn],
        payload: &RequestPayload,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                }
                .to_string(),
                parts: vec![Part::Text {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        let parts = payload
            .parts
            .iter()
            .map(|part| match part {
                PayloadPart::Text(text) => Part::Text { text: text.clone() },
                PayloadPart::Image { mime_type, data } => Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: mime_type.clone(),
                        data: BASE64_STANDARD.encode(data),
                    },
                },
            })
            .collect();

        contents.push(Content {
            role: "user".to_string(),
            parts,
        });

        let system_instruction = if persona.is_empty() {
            None
        } else {
            Some(Content {
                role: "system".to_string(),
                parts: vec![Part::Text {
                    text: persona.to_string(),
                }],
            })
        };

        GenerateContentRequest {
            contents,
            system_instruction,
        }
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn generate(
        &self,
        persona: &str,
        history: &[ConversationTurn],
        payload: &RequestPayload,
    ) -> Result<BackendReply, RelayError> {
        let request = self.build_request(persona, history, payload);

        debug!(
            model = %self.model,
            history = history.len(),
            parts = payload.parts.len(),
            "calling Gemini"
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gemini request failed");
                RelayError::Backend(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(status = %status, body = %body, "Gemini API error");
            return Err(RelayError::Backend(format!("status {status}: {}", api_error_message(&body))));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Backend(format!("failed to parse response: {e}")))?;

        // A 200 with no text is a weak answer, not a failed call — the
        // engine substitutes its fallback string and still persists.
        Ok(BackendReply {
            text: extract_text(parsed),
        })
    }

    fn display_name(&self) -> &str {
        "Gemini"
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                Some(candidates.remove(0))
            }
        })
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
}

/// Pull the human-readable message out of a Gemini error body, falling
/// back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| w.error.message)
        .unwrap_or_else(|| body.to_string())
}

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
