use chat_api::ChatTurn;
use program_session::{ChatSession, Notice, SessionHost, TurnId};
use program_studio::settings::AiSettings;

/// Host fake that records every interaction and hands out sequential ids.
pub struct RecordingHost {
    next_turn_id: TurnId,
    pub started: Vec<Vec<ChatTurn>>,
    pub cancelled: Vec<TurnId>,
    pub notices: Vec<Notice>,
    pub renders: usize,
    pub fail_start_with: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            next_turn_id: 1,
            started: Vec::new(),
            cancelled: Vec::new(),
            notices: Vec::new(),
            renders: 0,
            fail_start_with: None,
        }
    }
}

impl SessionHost for RecordingHost {
    fn start_turn(&mut self, messages: Vec<ChatTurn>) -> Result<TurnId, String> {
        if let Some(error) = &self.fail_start_with {
            return Err(error.clone());
        }
        self.started.push(messages);
        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;
        Ok(turn_id)
    }

    fn cancel_turn(&mut self, turn_id: TurnId) {
        self.cancelled.push(turn_id);
    }

    fn request_render(&mut self) {
        self.renders += 1;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

pub fn usable_ai() -> AiSettings {
    let mut ai = AiSettings::default();
    ai.enabled = true;
    ai.api_key = "sk-test".to_string();
    ai
}

/// Fresh session with a greeting already in the transcript.
pub fn new_session(host: &mut RecordingHost) -> ChatSession {
    let mut session = ChatSession::new(usable_ai());
    session.reset_for(None, None, host);
    session
}
