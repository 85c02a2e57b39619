use std::sync::atomic::Ordering;

use crate::provider::{CancelSignal, TurnEvent, TurnProvider, TurnRequest};

/// How a scripted mock turn ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Finish,
    Fail(String),
}

/// Deterministic provider for tests: emits the scripted chunks, then the
/// scripted outcome. Honors the cancel signal between chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProvider {
    chunks: Vec<String>,
    outcome: MockOutcome,
}

impl MockProvider {
    #[must_use]
    pub fn new(chunks: Vec<String>, outcome: MockOutcome) -> Self {
        Self { chunks, outcome }
    }

    #[must_use]
    pub fn finishing(chunks: Vec<&str>) -> Self {
        Self::new(
            chunks.into_iter().map(str::to_string).collect(),
            MockOutcome::Finish,
        )
    }

    #[must_use]
    pub fn failing(error: impl Into<String>) -> Self {
        Self::new(Vec::new(), MockOutcome::Fail(error.into()))
    }
}

impl TurnProvider for MockProvider {
    fn run(
        &self,
        request: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), String> {
        let turn_id = request.turn_id;
        emit(TurnEvent::Started { turn_id });

        for chunk in &self.chunks {
            if cancel.load(Ordering::SeqCst) {
                emit(TurnEvent::Cancelled { turn_id });
                return Ok(());
            }

            emit(TurnEvent::Chunk {
                turn_id,
                text: chunk.clone(),
            });
        }

        if cancel.load(Ordering::SeqCst) {
            emit(TurnEvent::Cancelled { turn_id });
            return Ok(());
        }

        match &self.outcome {
            MockOutcome::Finish => emit(TurnEvent::Finished { turn_id }),
            MockOutcome::Fail(error) => emit(TurnEvent::Failed {
                turn_id,
                error: error.clone(),
            }),
        }

        Ok(())
    }
}
