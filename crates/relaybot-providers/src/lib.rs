//! AI backend layer for Relaybot.
//!
//! - [`traits::AiBackend`] — trait the conversation engine calls through
//! - [`gemini::GeminiBackend`] — Gemini `generateContent` HTTP client

pub mod gemini;
pub mod traits;

pub use gemini::GeminiBackend;
pub use traits::AiBackend;
