//! Locating the HTML artifact inside an assistant reply.
//!
//! Replies usually carry the program inside an ` ```html ` fence, but models
//! also emit untagged fences and occasionally bare documents with no fence at
//! all. Extraction therefore walks a fixed precedence chain from the most
//! explicit shape to the least, and must keep working on partial streaming
//! text where the closing fence has not arrived yet.

use once_cell::sync::Lazy;
use regex::Regex;

static COMPLETE_HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```\s*html(.*?)```").expect("complete html fence pattern"));
static TRAILING_HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```\s*html(.*)$").expect("trailing html fence pattern"));
static COMPLETE_ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("complete fence pattern"));
static TRAILING_ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*)$").expect("trailing fence pattern"));

/// True when a fence body carries an HTML document marker.
fn looks_like_html(candidate: &str) -> bool {
    candidate.contains("<html") || candidate.contains("<!DOCTYPE")
}

/// Extracts the current best HTML document candidate from a reply.
///
/// Precedence, first hit wins:
/// 1. complete ` ```html ` fence
/// 2. unterminated trailing ` ```html ` fence (streaming)
/// 3. complete untagged fence whose body carries a document marker
/// 4. unterminated trailing untagged fence with a document marker
/// 5. the whole reply, when it starts with `<!DOCTYPE` or `<html`
///
/// Returns `None` when no candidate is found; callers keep the previous
/// candidate in that case.
#[must_use]
pub fn extract_program_html(content: &str) -> Option<String> {
    if let Some(caps) = COMPLETE_HTML_FENCE.captures(content) {
        let body = caps[1].trim();
        if !body.is_empty() {
            return Some(body.to_string());
        }
    }

    if let Some(caps) = TRAILING_HTML_FENCE.captures(content) {
        let body = caps[1].trim();
        if !body.is_empty() {
            return Some(body.to_string());
        }
    }

    if let Some(caps) = COMPLETE_ANY_FENCE.captures(content) {
        if looks_like_html(&caps[1]) {
            return Some(caps[1].trim().to_string());
        }
    }

    if let Some(caps) = TRAILING_ANY_FENCE.captures(content) {
        if looks_like_html(&caps[1]) {
            return Some(caps[1].trim().to_string());
        }
    }

    let trimmed = content.trim();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        return Some(trimmed.to_string());
    }

    None
}
