//! Log redaction layer.
//!
//! Scrubs API keys and access tokens from strings prior to logging.

use std::sync::LazyLock;

use regex::Regex;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").expect("api key pattern is valid")
});

static TOKEN_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((?:access_)?token=)[^&\s]+").expect("token param pattern is valid")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    TOKEN_PARAM_RE
        .replace_all(&redacted, "${1}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_keys_and_bearer_tokens() {
        let raw = "calling with sk-abcdef0123456789abcdef and Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-abcdef0123456789abcdef"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn redacts_token_query_params() {
        let clean = redact_sensitive_data("GET /?token=s3cret&lang=en");
        assert_eq!(clean, "GET /?token=[REDACTED]&lang=en");
    }

    #[test]
    fn leaves_table_text_alone() {
        let text = r#"[["apples","3","kg",""]]"#;
        assert_eq!(redact_sensitive_data(text), text);
    }
}
