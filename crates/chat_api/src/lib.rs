//! Transport-only client primitives for OpenAI-compatible chat completions.
//!
//! This crate owns request building, streamed response parsing, and
//! cancellation behavior for the `/chat/completions` wire contract. It
//! intentionally contains no conversation state and no UI coupling; the
//! session layer decides what each delta means.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{ChatApiClient, StreamResult};
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::ChatStreamEvent;
pub use payload::{ChatRequest, ChatRole, ChatTurn};
pub use sse::SseLineParser;
pub use url::normalize_chat_url;
