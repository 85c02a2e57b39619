//! Turn provider implementations.

pub mod mock;

use std::sync::Arc;

use chat_api::{ChatApiClient, ChatApiConfig, ChatApiError, ChatStreamEvent, ChatTurn};
use program_studio::settings::AiSettings;

use crate::provider::{CancelSignal, TurnEvent, TurnProvider, TurnRequest};

/// Blocking bridge over the async streaming transport, seam for tests.
trait ChatStream: Send + Sync {
    fn stream(
        &self,
        messages: Vec<ChatTurn>,
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(String),
    ) -> Result<(), ChatApiError>;
}

struct HttpChatStream {
    client: ChatApiClient,
}

impl ChatStream for HttpChatStream {
    fn stream(
        &self,
        messages: Vec<ChatTurn>,
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(String),
    ) -> Result<(), ChatApiError> {
        // Providers run on a dedicated worker thread, so a current-thread
        // runtime per turn is enough to drive the async transport.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                ChatApiError::Unknown(format!("failed to start async runtime: {error}"))
            })?;

        let request = self.client.request_for(messages);
        runtime.block_on(self.client.stream_with_handler(
            &request,
            Some(cancel),
            |event| {
                if let ChatStreamEvent::ContentDelta { delta } = event {
                    on_delta(delta);
                }
            },
        ))
    }
}

/// Streams turns from an OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    stream: Arc<dyn ChatStream>,
}

impl OpenAiProvider {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        Ok(Self {
            stream: Arc::new(HttpChatStream {
                client: ChatApiClient::new(config)?,
            }),
        })
    }

    /// Builds a provider from the app's AI settings.
    pub fn from_settings(ai: &AiSettings) -> Result<Self, ChatApiError> {
        let config = ChatApiConfig::new(ai.api_key.clone())
            .with_base_url(ai.base_url.clone())
            .with_model(ai.model.clone());
        Self::new(config)
    }

    #[cfg(test)]
    fn with_stream(stream: Arc<dyn ChatStream>) -> Self {
        Self { stream }
    }
}

impl TurnProvider for OpenAiProvider {
    fn run(
        &self,
        request: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), String> {
        let turn_id = request.turn_id;
        emit(TurnEvent::Started { turn_id });

        let mut on_delta = |text: String| emit_chunk(emit, turn_id, text);
        let outcome = self
            .stream
            .stream(request.messages, &cancel, &mut on_delta);

        match outcome {
            Ok(()) => emit(TurnEvent::Finished { turn_id }),
            Err(ChatApiError::Cancelled) => emit(TurnEvent::Cancelled { turn_id }),
            Err(error) => emit(TurnEvent::Failed {
                turn_id,
                error: error.to_string(),
            }),
        }

        Ok(())
    }
}

fn emit_chunk(emit: &mut dyn FnMut(TurnEvent), turn_id: u64, text: String) {
    emit(TurnEvent::Chunk { turn_id, text });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    struct FakeStream {
        deltas: Vec<String>,
        outcome: Result<(), ChatApiError>,
        seen_messages: Mutex<Vec<ChatTurn>>,
    }

    impl ChatStream for FakeStream {
        fn stream(
            &self,
            messages: Vec<ChatTurn>,
            _cancel: &CancelSignal,
            on_delta: &mut dyn FnMut(String),
        ) -> Result<(), ChatApiError> {
            *self.seen_messages.lock().unwrap() = messages;
            for delta in &self.deltas {
                on_delta(delta.clone());
            }
            match &self.outcome {
                Ok(()) => Ok(()),
                Err(ChatApiError::Cancelled) => Err(ChatApiError::Cancelled),
                Err(error) => Err(ChatApiError::Unknown(error.to_string())),
            }
        }
    }

    fn run_provider(stream: FakeStream) -> Vec<TurnEvent> {
        let provider = OpenAiProvider::with_stream(Arc::new(stream));
        let mut events = Vec::new();
        provider
            .run(
                TurnRequest {
                    turn_id: 7,
                    messages: vec![ChatTurn::user("make a clock")],
                },
                CancelSignal::new(AtomicBool::new(false)),
                &mut |event| events.push(event),
            )
            .expect("provider run");
        events
    }

    #[test]
    fn successful_stream_emits_started_chunks_finished() {
        let events = run_provider(FakeStream {
            deltas: vec!["Hello".to_string(), " there".to_string()],
            outcome: Ok(()),
            seen_messages: Mutex::new(Vec::new()),
        });

        assert_eq!(
            events,
            vec![
                TurnEvent::Started { turn_id: 7 },
                TurnEvent::Chunk {
                    turn_id: 7,
                    text: "Hello".to_string()
                },
                TurnEvent::Chunk {
                    turn_id: 7,
                    text: " there".to_string()
                },
                TurnEvent::Finished { turn_id: 7 },
            ]
        );
    }

    #[test]
    fn cancelled_transport_maps_to_cancelled_event() {
        let events = run_provider(FakeStream {
            deltas: vec!["partial".to_string()],
            outcome: Err(ChatApiError::Cancelled),
            seen_messages: Mutex::new(Vec::new()),
        });

        assert_eq!(events.last(), Some(&TurnEvent::Cancelled { turn_id: 7 }));
    }

    #[test]
    fn transport_failure_maps_to_failed_event() {
        let events = run_provider(FakeStream {
            deltas: Vec::new(),
            outcome: Err(ChatApiError::Unknown("boom".to_string())),
            seen_messages: Mutex::new(Vec::new()),
        });

        assert!(matches!(
            events.last(),
            Some(TurnEvent::Failed { turn_id: 7, error }) if error.contains("boom")
        ));
    }
}
