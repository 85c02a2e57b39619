//! Console bridge between the sandboxed preview frame and the host.
//!
//! Previewed programs run inside an isolated frame with no host access. To
//! still surface their console output and runtime errors, a small script is
//! injected into the document before mounting; it wraps the console methods
//! and `window.onerror` and posts each record to the parent as a structured
//! message. This module owns the injected script, the parsing of those
//! messages on the host side, the log buffer shown in the console panel, and
//! the rate limiter that turns repeated runtime errors into at most an
//! occasional fix offer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator value on every message posted by the injected script.
pub const LOG_MESSAGE_TYPE: &str = "program-log";

/// Minimum gap between fix offers for a repeating identical error.
pub const ERROR_OFFER_WINDOW_MS: i64 = 5000;

const INTERCEPTOR_SCRIPT: &str = r#"<script>
(function () {
  var original = {
    log: console.log,
    info: console.info,
    warn: console.warn,
    error: console.error
  };

  function describe(value) {
    if (typeof value === 'object') {
      try {
        return JSON.stringify(value, null, 2);
      } catch (e) {
        return String(value);
      }
    }
    return String(value);
  }

  function post(logType, parts) {
    try {
      window.parent.postMessage({
        type: 'program-log',
        logType: logType,
        content: parts.map(describe).join(' '),
        timestamp: new Date().toLocaleTimeString()
      }, '*');
    } catch (e) {
      // The frame may already be detached.
    }
  }

  ['log', 'info', 'warn', 'error'].forEach(function (level) {
    console[level] = function () {
      var parts = Array.prototype.slice.call(arguments);
      post(level, parts);
      original[level].apply(console, parts);
    };
  });

  window.onerror = function (message) {
    post('error', [message]);
    return false;
  };
})();
</script>"#;

/// Injects the console interceptor into a program document.
///
/// The script goes immediately after the head-open tag so it installs before
/// any program code runs; documents without a `<head>` tag get it prepended.
#[must_use]
pub fn inject_log_interceptor(html: &str) -> String {
    if html.contains("<head>") {
        html.replacen("<head>", &format!("<head>{INTERCEPTOR_SCRIPT}"), 1)
    } else {
        format!("{INTERCEPTOR_SCRIPT}{html}")
    }
}

/// Console level reported by the injected script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// One message posted by the injected script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramLogMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "logType")]
    pub level: LogLevel,
    pub content: String,
    pub timestamp: String,
}

impl ProgramLogMessage {
    #[must_use]
    pub fn new(level: LogLevel, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            message_type: LOG_MESSAGE_TYPE.to_string(),
            level,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Parses a frame message, accepting only well-formed `program-log` records.
///
/// The preview frame can post arbitrary messages (program code may call
/// `postMessage` itself), so anything without the discriminator or with a
/// malformed shape is ignored rather than treated as an error.
#[must_use]
pub fn parse_log_message(value: &Value) -> Option<ProgramLogMessage> {
    if value.get("type").and_then(Value::as_str) != Some(LOG_MESSAGE_TYPE) {
        return None;
    }

    match serde_json::from_value::<ProgramLogMessage>(value.clone()) {
        Ok(message) => Some(message),
        Err(error) => {
            log::debug!("dropping malformed program-log message: {error}");
            None
        }
    }
}

/// One row in the console panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: u64,
    pub level: LogLevel,
    pub content: String,
    pub timestamp: String,
    /// Structured payload attached by the host, not by the frame.
    pub meta: Option<Value>,
}

/// Append-only console buffer with stable per-entry ids.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl LogBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &ProgramLogMessage) -> &LogEntry {
        self.push_with_meta(message, None)
    }

    pub fn push_with_meta(
        &mut self,
        message: &ProgramLogMessage,
        meta: Option<Value>,
    ) -> &LogEntry {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(LogEntry {
            id,
            level: message.level,
            content: message.content.clone(),
            timestamp: message.timestamp.clone(),
            meta,
        });
        self.entries.last().expect("entry just pushed")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.level == LogLevel::Error)
    }
}

/// Decides when a runtime error warrants offering an automatic fix.
///
/// A program stuck in a tight error loop posts the same error dozens of
/// times per second; offering a fix for each one would flood the transcript.
/// An offer goes out when the error text differs from the previously offered
/// one, or when [`ERROR_OFFER_WINDOW_MS`] has elapsed since the last offer.
#[derive(Debug, Default)]
pub struct ErrorRateLimiter {
    last_content: Option<String>,
    last_offer_at_ms: i64,
}

impl ErrorRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports an error observation; returns true when a fix offer is due.
    /// `now_ms` is caller-supplied wall-clock milliseconds.
    pub fn should_offer_fix(&mut self, content: &str, now_ms: i64) -> bool {
        let is_repeat = self.last_content.as_deref() == Some(content);
        if is_repeat && now_ms - self.last_offer_at_ms <= ERROR_OFFER_WINDOW_MS {
            return false;
        }

        self.last_content = Some(content.to_string());
        self.last_offer_at_ms = now_ms;
        true
    }

    pub fn reset(&mut self) {
        self.last_content = None;
        self.last_offer_at_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interceptor_lands_directly_after_head_open_tag() {
        let injected = inject_log_interceptor("<html><head><title>t</title></head></html>");
        let head = injected.find("<head>").expect("head tag");
        assert_eq!(&injected[head + "<head>".len()..head + "<head><script>".len()], "<script>");
        assert!(injected.contains("<title>t</title>"));
    }

    #[test]
    fn interceptor_is_prepended_when_head_is_missing() {
        let injected = inject_log_interceptor("<html><body></body></html>");
        assert!(injected.starts_with("<script>"));
        assert!(injected.ends_with("<html><body></body></html>"));
    }

    #[test]
    fn injected_script_posts_the_expected_discriminator() {
        assert!(INTERCEPTOR_SCRIPT.contains("type: 'program-log'"));
        assert!(INTERCEPTOR_SCRIPT.contains("window.onerror"));
    }

    #[test]
    fn parse_accepts_well_formed_records() {
        let value = json!({
            "type": "program-log",
            "logType": "error",
            "content": "boom",
            "timestamp": "10:00:00"
        });
        let message = parse_log_message(&value).expect("parse");
        assert_eq!(message.level, LogLevel::Error);
        assert_eq!(message.content, "boom");
    }

    #[test]
    fn parse_rejects_foreign_and_malformed_messages() {
        assert!(parse_log_message(&json!({"hello": "world"})).is_none());
        assert!(parse_log_message(&json!({"type": "other", "logType": "log"})).is_none());
        assert!(parse_log_message(&json!({
            "type": "program-log",
            "logType": "fatal",
            "content": "x",
            "timestamp": "t"
        }))
        .is_none());
    }

    #[test]
    fn buffer_assigns_monotonic_ids_and_tracks_errors() {
        let mut buffer = LogBuffer::new();
        buffer.push(&ProgramLogMessage::new(LogLevel::Log, "a", "t"));
        buffer.push(&ProgramLogMessage::new(LogLevel::Error, "b", "t"));
        let ids: Vec<u64> = buffer.entries().iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(buffer.has_errors());

        buffer.clear();
        assert!(buffer.entries().is_empty());
        let entry = buffer.push(&ProgramLogMessage::new(LogLevel::Info, "c", "t")).clone();
        // Ids stay unique across clears.
        assert_eq!(entry.id, 2);
    }

    #[test]
    fn identical_error_inside_window_is_suppressed() {
        let mut limiter = ErrorRateLimiter::new();
        assert!(limiter.should_offer_fix("boom", 1_000));
        assert!(!limiter.should_offer_fix("boom", 1_100));
    }

    #[test]
    fn identical_error_after_window_is_offered_again() {
        let mut limiter = ErrorRateLimiter::new();
        assert!(limiter.should_offer_fix("boom", 1_000));
        assert!(limiter.should_offer_fix("boom", 7_000));
    }

    #[test]
    fn different_error_is_offered_immediately() {
        let mut limiter = ErrorRateLimiter::new();
        assert!(limiter.should_offer_fix("boom", 1_000));
        assert!(limiter.should_offer_fix("crash", 1_001));
    }

    #[test]
    fn reset_forgets_previous_error() {
        let mut limiter = ErrorRateLimiter::new();
        assert!(limiter.should_offer_fix("boom", 1_000));
        limiter.reset();
        assert!(limiter.should_offer_fix("boom", 1_001));
    }
}
