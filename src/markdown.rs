//! Incremental markdown-to-HTML rendering for streaming chat transcripts.
//!
//! The renderer is called on every delta while an assistant reply is still
//! arriving, so it must behave on partial input: an unterminated code fence
//! at the end of the text renders as a code block instead of leaking raw
//! backticks into the transcript.
//!
//! Code spans are lifted out into placeholders first so that none of the
//! later inline or block rules can rewrite code content. Only code content is
//! HTML-escaped; surrounding prose passes through unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMPLETE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("complete fence pattern"));
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\n(.*)$").expect("trailing fence pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\*(.*?)\*").expect("italic pattern"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern"));
static HEADING_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("h3 pattern"));
static HEADING_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("h2 pattern"));
static HEADING_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("h1 pattern"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+\.\s+(.*)$").expect("ordered item pattern"));
static UNORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[-*]\s+(.*)$").expect("unordered item pattern"));
static BLOCKQUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^>\s*(.*)$").expect("blockquote pattern"));

/// Escapes the five HTML metacharacters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Code spans lifted out of the text, addressed by placeholder index.
struct CodeSpans {
    blocks: Vec<String>,
}

impl CodeSpans {
    fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    fn placeholder_for(&mut self, markup: String) -> String {
        let placeholder = format!("__CODE_BLOCK_{}__", self.blocks.len());
        self.blocks.push(markup);
        placeholder
    }

    fn fenced_block(&mut self, code: &str) -> String {
        self.placeholder_for(format!(
            "<pre class=\"bg-muted p-3 rounded-lg overflow-x-auto my-2 font-mono\"><code class=\"text-sm whitespace-pre-wrap\">{}</code></pre>",
            escape_html(code)
        ))
    }

    fn inline_code(&mut self, code: &str) -> String {
        self.placeholder_for(format!(
            "<code class=\"bg-muted px-1 py-0.5 rounded text-sm font-mono\">{}</code>",
            escape_html(code)
        ))
    }

    fn restore_into(self, mut html: String) -> String {
        for (index, block) in self.blocks.into_iter().enumerate() {
            let placeholder = format!("__CODE_BLOCK_{index}__");
            html = html.replacen(&placeholder, &block, 1);
        }
        html
    }
}

/// Renders a chat message to transcript HTML.
///
/// Safe to call on partial streaming text: a trailing unterminated fence is
/// rendered as a code block with everything after the fence opener treated
/// as code.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut spans = CodeSpans::new();

    let processed = COMPLETE_FENCE
        .replace_all(content, |caps: &Captures| spans.fenced_block(&caps[2]))
        .into_owned();

    // With complete fences gone, any fence opener left is unterminated
    // streaming output. Only the first one matters; it swallows the rest of
    // the text.
    let processed = TRAILING_FENCE
        .replace(&processed, |caps: &Captures| spans.fenced_block(&caps[2]))
        .into_owned();

    let processed = INLINE_CODE
        .replace_all(&processed, |caps: &Captures| spans.inline_code(&caps[1]))
        .into_owned();

    let html = BOLD.replace_all(&processed, "<strong class=\"font-semibold\">$1</strong>");
    let html = ITALIC.replace_all(&html, "<em class=\"italic\">$1</em>");
    let html = LINK.replace_all(
        &html,
        "<a href=\"$2\" class=\"text-primary hover:underline\" target=\"_blank\" rel=\"noopener noreferrer\">$1</a>",
    );
    let html = HEADING_3.replace_all(&html, "<h3 class=\"text-lg font-semibold mt-4 mb-2\">$1</h3>");
    let html = HEADING_2.replace_all(&html, "<h2 class=\"text-xl font-bold mt-4 mb-2\">$1</h2>");
    let html = HEADING_1.replace_all(&html, "<h1 class=\"text-2xl font-bold mt-4 mb-2\">$1</h1>");
    let html = ORDERED_ITEM.replace_all(&html, "<li class=\"ml-4 list-decimal mb-1\">$1</li>");
    let html = UNORDERED_ITEM.replace_all(&html, "<li class=\"ml-4 list-disc mb-1\">$1</li>");
    let html = BLOCKQUOTE.replace_all(
        &html,
        "<blockquote class=\"border-l-4 border-primary pl-4 my-2 text-muted-foreground italic\">$1</blockquote>",
    );

    let html = html.replace("\n\n", "</p><p class=\"mb-2\">").replace('\n', "<br/>");

    let html = if !html.is_empty() && !html.starts_with('<') {
        format!("<p class=\"mb-2\">{html}</p>")
    } else {
        html
    };

    spans.restore_into(html)
}
