//! Conversation state and turn execution for the program studio.
//!
//! A session owns the chat transcript, the current draft program extracted
//! from assistant replies, the preview console buffer, and the state machine
//! for the single in-flight generation turn. Turn execution itself is
//! delegated through the [`provider::TurnProvider`] seam: the production
//! provider streams from an OpenAI-compatible endpoint via `chat_api`, while
//! tests script event sequences through a mock.
//!
//! Threading model: providers run on a dedicated worker thread owned by
//! [`runtime::TurnRuntime`]; their events are queued and applied to the
//! session strictly in emission order on the caller's thread.

pub mod prompts;
pub mod provider;
pub mod providers;
pub mod runtime;
pub mod session;

pub use provider::{CancelSignal, TurnEvent, TurnId, TurnProvider, TurnRequest};
pub use providers::OpenAiProvider;
pub use runtime::TurnRuntime;
pub use session::{
    ChatMessage, ChatSession, Mode, Notice, NoticeLevel, Role, SessionError, SessionHost,
};
