//! Request assembly — normalize one incoming message into a backend payload.
//!
//! Text goes through verbatim. Images are decoded from whatever format the
//! transport delivered and re-encoded as PNG, so the backend always sees one
//! predictable format regardless of the source. A message with neither text
//! nor image assembles to `None` and the exchange ends silently.

use std::io::Cursor;

use image::ImageFormat;
use tracing::debug;

use relaybot_core::{IncomingMessage, PayloadPart, RelayError, RequestPayload};

/// MIME type of every re-encoded image part.
pub const IMAGE_MIME: &str = "image/png";

/// Build the ordered payload for one message: text first, then image.
///
/// Returns `Ok(None)` when the message carries nothing to send. An image
/// that cannot be decoded is an `Assembly` error; the caller maps it to
/// the apology path.
pub fn assemble(message: &IncomingMessage) -> Result<Option<RequestPayload>, RelayError> {
    let mut parts = Vec::new();

    if let Some(text) = message.text.as_deref() {
        if !text.is_empty() {
            parts.push(PayloadPart::Text(text.to_string()));
        }
    }

    if let Some(raw) = message.image.as_deref() {
        let data = reencode_png(raw)?;
        debug!(raw_bytes = raw.len(), png_bytes = data.len(), "re-encoded image");
        parts.push(PayloadPart::Image {
            mime_type: IMAGE_MIME.to_string(),
            data,
        });
    }

    if parts.is_empty() {
        return Ok(None);
    }

    Ok(Some(RequestPayload { parts }))
}

fn reencode_png(raw: &[u8]) -> Result<Vec<u8>, RelayError> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| RelayError::Assembly(format!("failed to decode image: {e}")))?;

    let mut out = Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| RelayError::Assembly(format!("failed to encode image: {e}")))?;

    Ok(out.into_inner())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
