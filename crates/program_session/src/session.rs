//! Conversation session state machine.
//!
//! One session backs one create/edit dialog: a transcript, at most one
//! in-flight generation turn, the draft program extracted from assistant
//! replies, and the preview console state. All methods run on the UI thread;
//! turn events arrive through the `on_turn_*` handlers in emission order.

use chat_api::ChatTurn;
use program_store::{current_epoch_ms, Program, ProgramStore, ProgramStoreError};
use program_studio::extract::extract_program_html;
use program_studio::logbridge::{
    inject_log_interceptor, ErrorRateLimiter, LogBuffer, LogEntry, LogLevel, ProgramLogMessage,
};
use program_studio::scroll::AutoScrollController;
use program_studio::settings::AiSettings;
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::prompts;
use crate::provider::TurnId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    fn as_chat_turn(self, content: &str) -> ChatTurn {
        match self {
            Role::User => ChatTurn::user(content),
            Role::Assistant => ChatTurn::assistant(content),
            Role::System => ChatTurn::system(content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Display timestamp, already formatted for the transcript.
    pub timestamp: String,
    /// Turn that is (or was) streaming into this message.
    pub turn_id: Option<TurnId>,
    /// When set, the message carries a fix affordance for this runtime error.
    pub error_log: Option<String>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: display_timestamp(),
            turn_id: None,
            error_log: None,
        }
    }
}

/// Session lifecycle around the single in-flight turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    /// Request issued, no delta received yet.
    Sending { turn_id: TurnId },
    /// At least one delta received.
    Streaming { turn_id: TurnId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Host seam the session drives. Implemented by the turn runtime wrapper in
/// production and by recording fakes in tests.
pub trait SessionHost {
    fn start_turn(&mut self, messages: Vec<ChatTurn>) -> Result<TurnId, String>;
    fn cancel_turn(&mut self, turn_id: TurnId);
    fn request_render(&mut self);
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no program code has been generated yet")]
    NoCodeGenerated,
    #[error(transparent)]
    Store(#[from] ProgramStoreError),
}

pub struct ChatSession {
    ai: AiSettings,
    mode: Mode,
    transcript: Vec<ChatMessage>,
    generated_code: Option<String>,
    program_name: String,
    editing: Option<Program>,
    logs: LogBuffer,
    error_limiter: ErrorRateLimiter,
    preview_epoch: u64,
    scroll: AutoScrollController,
    cancelling_turn: Option<TurnId>,
}

impl ChatSession {
    #[must_use]
    pub fn new(ai: AiSettings) -> Self {
        Self {
            ai,
            mode: Mode::Idle,
            transcript: Vec::new(),
            generated_code: None,
            program_name: prompts::DEFAULT_PROGRAM_NAME.to_string(),
            editing: None,
            logs: LogBuffer::new(),
            error_limiter: ErrorRateLimiter::new(),
            preview_epoch: 0,
            scroll: AutoScrollController::new(),
            cancelling_turn: None,
        }
    }

    /// Resets the session for a fresh dialog.
    ///
    /// With a `target` the session continues an existing program: its content
    /// seeds the draft and the transcript opens with a continue greeting.
    /// Without one the session starts blank, optionally submitting
    /// `initial_prompt` right away (which also becomes the working name).
    pub fn reset_for(
        &mut self,
        target: Option<Program>,
        initial_prompt: Option<&str>,
        host: &mut dyn SessionHost,
    ) {
        self.mode = Mode::Idle;
        self.cancelling_turn = None;
        self.transcript.clear();
        self.logs.clear();
        self.error_limiter.reset();
        self.preview_epoch += 1;
        self.scroll.pin();

        match target {
            Some(program) => {
                self.transcript
                    .push(ChatMessage::new(Role::Assistant, prompts::GREETING_CONTINUE));
                self.generated_code = Some(program.content.clone());
                self.program_name = program.name.clone();
                self.editing = Some(program);
            }
            None => {
                self.transcript
                    .push(ChatMessage::new(Role::Assistant, prompts::GREETING_NEW));
                self.generated_code = None;
                self.editing = None;
                self.program_name = initial_prompt
                    .map(str::to_string)
                    .unwrap_or_else(|| prompts::DEFAULT_PROGRAM_NAME.to_string());

                if let Some(prompt) = initial_prompt {
                    let prompt = prompt.to_string();
                    self.submit(&prompt, host);
                    return;
                }
            }
        }

        host.request_render();
    }

    /// Submits a user message and starts a generation turn.
    ///
    /// Preconditions are checked in order: blank input is a render-only
    /// no-op, unusable AI settings and an already open turn each produce a
    /// notice without touching the transcript.
    pub fn submit(&mut self, text: &str, host: &mut dyn SessionHost) {
        let content = text.trim();
        if content.is_empty() {
            host.request_render();
            return;
        }

        if !self.ai.is_usable() {
            host.notify(Notice::warning(prompts::ai_disabled_notice(&self.ai)));
            return;
        }

        if self.is_loading() || self.cancelling_turn.is_some() {
            host.notify(Notice::warning("A generation turn is already running."));
            return;
        }

        self.scroll.pin();
        self.transcript.push(ChatMessage::new(Role::User, content));

        let messages = self.build_turn_messages();
        match host.start_turn(messages) {
            Ok(turn_id) => {
                self.mode = Mode::Sending { turn_id };
            }
            Err(error) => {
                self.transcript.push(ChatMessage::new(
                    Role::Assistant,
                    format!("Error: {error}"),
                ));
                host.notify(Notice::error("AI request failed."));
            }
        }

        host.request_render();
    }

    /// Requests cancellation of the in-flight turn. The session leaves the
    /// loading state immediately; streamed content is kept as-is and the
    /// turn's terminal event is awaited silently.
    pub fn cancel(&mut self, host: &mut dyn SessionHost) {
        if self.cancelling_turn.is_some() {
            return;
        }

        let (Mode::Sending { turn_id } | Mode::Streaming { turn_id }) = self.mode else {
            return;
        };

        self.cancelling_turn = Some(turn_id);
        self.mode = Mode::Idle;
        host.cancel_turn(turn_id);
        host.notify(Notice::info("Generation interrupted."));
        host.request_render();
    }

    /// Submits the fix-error prompt for a runtime error from the preview.
    pub fn request_fix(&mut self, error_log: &str, host: &mut dyn SessionHost) {
        let prompt = prompts::fix_error_prompt(error_log);
        self.submit(&prompt, host);
    }

    pub fn on_turn_started(&mut self, turn_id: TurnId) {
        if !self.is_active_turn(turn_id) {
            log::debug!("dropping started event for stale turn {turn_id}");
        }
    }

    /// Applies one streamed delta: the first delta opens the assistant
    /// message and moves the session to streaming, every delta appends to
    /// that message and re-runs artifact extraction.
    pub fn on_turn_chunk(&mut self, turn_id: TurnId, chunk: &str) {
        if !self.is_active_turn(turn_id) {
            log::debug!("dropping chunk for stale turn {turn_id}");
            return;
        }

        if let Mode::Sending { turn_id: current } = self.mode {
            if current == turn_id {
                self.mode = Mode::Streaming { turn_id };
                let mut message = ChatMessage::new(Role::Assistant, "");
                message.turn_id = Some(turn_id);
                self.transcript.push(message);
            }
        }

        let Some(index) = self.open_assistant_index(turn_id) else {
            return;
        };
        self.transcript[index].content.push_str(chunk);

        let candidate = extract_program_html(&self.transcript[index].content);
        if let Some(code) = candidate {
            self.generated_code = Some(code);
        }
    }

    pub fn on_turn_finished(&mut self, turn_id: TurnId) {
        if self.clear_if_cancelling(turn_id) {
            return;
        }
        if !self.is_active_turn(turn_id) {
            log::debug!("dropping finished event for stale turn {turn_id}");
            return;
        }

        if let Some(index) = self.open_assistant_index(turn_id) {
            if let Some(code) = extract_program_html(&self.transcript[index].content) {
                self.generated_code = Some(code);
            }
        }

        self.mode = Mode::Idle;
    }

    pub fn on_turn_failed(&mut self, turn_id: TurnId, error: &str, host: &mut dyn SessionHost) {
        if self.clear_if_cancelling(turn_id) {
            return;
        }
        if !self.is_active_turn(turn_id) {
            log::debug!("dropping failed event for stale turn {turn_id}");
            return;
        }

        self.transcript.push(ChatMessage::new(
            Role::Assistant,
            format!("Error: {error}"),
        ));
        host.notify(Notice::error("AI request failed."));
        self.mode = Mode::Idle;
    }

    pub fn on_turn_cancelled(&mut self, turn_id: TurnId) {
        if self.clear_if_cancelling(turn_id) {
            return;
        }
        if self.is_active_turn(turn_id) {
            // Provider-side cancellation without a local cancel request.
            self.mode = Mode::Idle;
        }
    }

    /// Ingests one message relayed from the preview frame.
    ///
    /// `epoch` identifies the preview mount the message came from; messages
    /// from a previous mount are dropped. Error-level entries consult the
    /// rate limiter and, when accepted, append an assistant message carrying
    /// the fix affordance. Nothing is ever requested automatically.
    pub fn on_program_log(&mut self, epoch: u64, message: &ProgramLogMessage, now_ms: i64) {
        if epoch != self.preview_epoch {
            log::debug!("dropping program log from stale preview epoch {epoch}");
            return;
        }

        self.logs.push(message);

        if message.level == LogLevel::Error
            && self.error_limiter.should_offer_fix(&message.content, now_ms)
        {
            let mut offer = ChatMessage::new(Role::Assistant, prompts::FIX_OFFER_MESSAGE);
            offer.error_log = Some(message.content.clone());
            self.transcript.push(offer);
        }
    }

    /// Saves the draft, updating the program being edited or adding a new
    /// one. On success the saved program becomes the editing target, so a
    /// second save updates instead of duplicating. Store failures leave the
    /// session untouched.
    pub fn save(&mut self, store: &mut ProgramStore) -> Result<Program, SessionError> {
        let content = self
            .generated_code
            .clone()
            .ok_or(SessionError::NoCodeGenerated)?;

        let description = self
            .transcript
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.clone())
            .unwrap_or_else(|| prompts::DEFAULT_PROGRAM_DESCRIPTION.to_string());

        let program = match &self.editing {
            Some(existing) => {
                let program = Program {
                    id: existing.id.clone(),
                    name: self.program_name.clone(),
                    description: Some(description),
                    content,
                    created_at: existing.created_at,
                    updated_at: current_epoch_ms(),
                };
                store.update(program.clone())?;
                program
            }
            None => {
                let program = Program::new(self.program_name.clone(), content, Some(description));
                store.add(program.clone())?;
                program
            }
        };

        self.editing = Some(program.clone());
        Ok(program)
    }

    /// The draft document with the console interceptor injected, ready to
    /// mount in the preview frame.
    #[must_use]
    pub fn preview_document(&self) -> Option<String> {
        self.generated_code
            .as_deref()
            .map(inject_log_interceptor)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        !matches!(self.mode, Mode::Idle)
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    #[must_use]
    pub fn generated_code(&self) -> Option<&str> {
        self.generated_code.as_deref()
    }

    #[must_use]
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn set_program_name(&mut self, name: impl Into<String>) {
        self.program_name = name.into();
    }

    #[must_use]
    pub fn log_entries(&self) -> &[LogEntry] {
        self.logs.entries()
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    #[must_use]
    pub fn preview_epoch(&self) -> u64 {
        self.preview_epoch
    }

    pub fn scroll_mut(&mut self) -> &mut AutoScrollController {
        &mut self.scroll
    }

    #[must_use]
    pub fn scroll(&self) -> &AutoScrollController {
        &self.scroll
    }

    pub fn update_ai_settings(&mut self, ai: AiSettings) {
        self.ai = ai;
    }

    fn build_turn_messages(&self) -> Vec<ChatTurn> {
        let system = prompts::system_prompt(self.generated_code.as_deref().unwrap_or(""));
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(ChatTurn::system(system));
        for message in &self.transcript {
            messages.push(message.role.as_chat_turn(&message.content));
        }
        messages
    }

    fn is_active_turn(&self, turn_id: TurnId) -> bool {
        matches!(
            self.mode,
            Mode::Sending { turn_id: current } | Mode::Streaming { turn_id: current }
                if current == turn_id
        )
    }

    fn clear_if_cancelling(&mut self, turn_id: TurnId) -> bool {
        if self.cancelling_turn == Some(turn_id) {
            self.cancelling_turn = None;
            return true;
        }
        false
    }

    fn open_assistant_index(&self, turn_id: TurnId) -> Option<usize> {
        self.transcript
            .iter()
            .rposition(|message| message.role == Role::Assistant && message.turn_id == Some(turn_id))
    }
}

fn display_timestamp() -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}
