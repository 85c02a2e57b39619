use crate::events::{ChatStreamEvent, CompletionChunk};

/// Incremental parser for `data:`-line streamed chat completion bodies.
///
/// Chunks arrive at arbitrary byte boundaries, which can fall inside a line
/// or inside a multi-byte UTF-8 character. The buffer therefore holds raw
/// bytes; nothing is decoded until a terminating newline arrives, so a
/// character split across chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buffer: Vec<u8>,
}

impl SseLineParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(split) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(0..=split).collect();
            // Only the buffer tail can end mid-character; a complete line is
            // decodable on its own.
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);

            if let Some(event) = parse_data_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Parse a complete stream body in one shot.
    pub fn parse_lines(input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn parse_data_line(line: &str) -> Option<ChatStreamEvent> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(ChatStreamEvent::Done);
    }

    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => {
            let delta = chunk.delta_content().unwrap_or("");
            if delta.is_empty() {
                None
            } else {
                Some(ChatStreamEvent::ContentDelta {
                    delta: delta.to_owned(),
                })
            }
        }
        Err(error) => {
            // Malformed payload lines are skipped, never fatal to the turn.
            log::debug!("skipping malformed stream line: {error}");
            None
        }
    }
}
