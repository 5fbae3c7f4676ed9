use std::fmt;

pub const REDACTED_TOKEN_PLACEHOLDER: &str = "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

/// GitHub access token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubToken(String);

impl GithubToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Replaces every occurrence of this token in `text`.
    pub fn redact(&self, text: &str) -> String {
        redact_token(text, self.expose())
    }
}

impl fmt::Debug for GithubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GithubToken(<redacted>)")
    }
}

/// Replaces every literal occurrence of `token` with the fixed placeholder.
/// A blank token leaves the text untouched.
pub fn redact_token(text: &str, token: &str) -> String {
    let token = token.trim();
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, REDACTED_TOKEN_PLACEHOLDER)
}
