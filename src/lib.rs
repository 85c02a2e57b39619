//! Renderer core for an AI-assisted single-file web program studio.
//!
//! The user describes a small web program in chat, an AI model streams back
//! markdown with an HTML artifact inside, and the artifact is previewed in a
//! sandboxed frame that relays its console output to the host. This crate
//! holds the pure, host-agnostic pieces of that pipeline:
//!
//! - [`markdown`]: incremental markdown-to-HTML rendering that is safe to run
//!   on partial streaming output.
//! - [`extract`]: locating the HTML document inside an assistant reply.
//! - [`logbridge`]: the console interceptor injected into previewed programs
//!   plus parsing and rate limiting of the messages it posts back.
//! - [`scroll`]: pin-to-end auto-scroll bookkeeping for the transcript view.
//! - [`settings`]: application settings with per-field fallback to defaults.
//! - [`host`]: the command envelope shared with the embedding shell.
//!
//! Streaming transport lives in the `chat_api` crate, conversation state in
//! `program_session`, and persistence in `program_store`.

pub mod extract;
pub mod host;
pub mod logbridge;
pub mod markdown;
pub mod scroll;
pub mod settings;

pub use extract::extract_program_html;
pub use logbridge::{
    inject_log_interceptor, parse_log_message, ErrorRateLimiter, LogBuffer, LogEntry, LogLevel,
    ProgramLogMessage, LOG_MESSAGE_TYPE,
};
pub use markdown::{escape_html, render_markdown};
pub use scroll::AutoScrollController;
pub use settings::{AiProvider, AiSettings, AppSettings, SettingsStore, Theme, ThemeController};
