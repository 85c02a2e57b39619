use chat_api::normalize_chat_url;
use chat_api::url::DEFAULT_CHAT_BASE_URL;

#[test]
fn appends_chat_completions_to_bare_base() {
    assert_eq!(
        normalize_chat_url("https://api.openai.com/v1"),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn keeps_existing_completions_path() {
    assert_eq!(
        normalize_chat_url("https://api.openai.com/v1/chat/completions"),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn completes_partial_chat_suffix() {
    assert_eq!(
        normalize_chat_url("https://example.com/v1/chat"),
        "https://example.com/v1/chat/completions"
    );
}

#[test]
fn trims_whitespace_and_trailing_slashes() {
    assert_eq!(
        normalize_chat_url("  https://example.com/v1/  "),
        "https://example.com/v1/chat/completions"
    );
}

#[test]
fn empty_input_falls_back_to_default_base() {
    assert_eq!(
        normalize_chat_url(""),
        format!("{DEFAULT_CHAT_BASE_URL}/chat/completions")
    );
}
