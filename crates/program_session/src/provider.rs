//! Turn provider contract.
//!
//! A provider runs one generation turn to completion on the caller's thread,
//! emitting [`TurnEvent`]s as output arrives. Exactly one terminal event
//! (`Finished`, `Failed`, or `Cancelled`) ends every turn; the runtime
//! enforces this for providers that misbehave.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chat_api::ChatTurn;

pub type TurnId = u64;

/// Set to true to request cooperative cancellation; the provider observes it
/// at its next suspension point.
pub type CancelSignal = Arc<AtomicBool>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub turn_id: TurnId,
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Started { turn_id: TurnId },
    Chunk { turn_id: TurnId, text: String },
    Finished { turn_id: TurnId },
    Failed { turn_id: TurnId, error: String },
    Cancelled { turn_id: TurnId },
}

impl TurnEvent {
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::Started { turn_id }
            | Self::Finished { turn_id }
            | Self::Cancelled { turn_id } => *turn_id,
            Self::Chunk { turn_id, .. } | Self::Failed { turn_id, .. } => *turn_id,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

pub trait TurnProvider: Send + Sync {
    /// Runs one turn, emitting events in order. An `Err` return is treated
    /// by the runtime as a turn failure.
    fn run(
        &self,
        request: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), String>;
}
