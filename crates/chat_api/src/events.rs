use serde::Deserialize;

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// One incremental piece of assistant text, in network arrival order.
    ContentDelta { delta: String },
    /// The `data: [DONE]` sentinel closing the stream.
    Done,
}

/// Wire shape of one `data:` payload from a chat completions stream.
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Returns the incremental text of the first choice, if any.
    pub(crate) fn delta_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }
}
