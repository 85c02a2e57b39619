use std::collections::BTreeMap;

use crate::config::ChatApiConfig;
use crate::error::ChatApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";

/// Build a deterministic header map for chat completion requests.
pub fn build_headers(config: &ChatApiConfig) -> Result<BTreeMap<String, String>, ChatApiError> {
    if config.api_key.trim().is_empty() {
        return Err(ChatApiError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.api_key.trim()),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json; charset=utf-8".to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "text/event-stream".to_owned());

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::build_headers;
    use crate::config::ChatApiConfig;
    use crate::error::ChatApiError;

    #[test]
    fn bearer_header_uses_trimmed_key() {
        let config = ChatApiConfig::new("  sk-test  ");
        let headers = build_headers(&config).expect("headers should build");
        assert_eq!(
            headers.get("authorization").map(String::as_str),
            Some("Bearer sk-test")
        );
    }

    #[test]
    fn blank_key_is_rejected_before_any_request() {
        let config = ChatApiConfig::new("   ");
        assert!(matches!(
            build_headers(&config),
            Err(ChatApiError::MissingApiKey)
        ));
    }

    #[test]
    fn extra_headers_are_lowercased_and_merged() {
        let config = ChatApiConfig::new("sk-test").insert_header("X-Custom", " value ");
        let headers = build_headers(&config).expect("headers should build");
        assert_eq!(headers.get("x-custom").map(String::as_str), Some("value"));
    }
}
