//! Session configuration.

/// Default Ollama API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "dolphin-mistral:latest";

/// Default cap on an unterminated record (1 MiB).
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1024 * 1024;

/// What to do with the response body once a record with `done: true` arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AfterDone {
    /// Drop the reader right away. Trailing bytes are never read.
    #[default]
    Stop,
    /// Keep reading until the server closes the body. Trailing chunks are
    /// logged but never decoded into the transcript.
    Drain,
}

/// Editable settings of a [`Chat`](crate::Chat).
///
/// Changes apply to the next session; a running session keeps the values it
/// started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Server base URL, without the `/api/chat` path.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum bytes of an unterminated record; `None` disables the check.
    pub max_record_bytes: Option<usize>,
    /// Behaviour after the completion record.
    pub after_done: AfterDone,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            max_record_bytes: Some(DEFAULT_MAX_RECORD_BYTES),
            after_done: AfterDone::Stop,
        }
    }
}

impl ChatConfig {
    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the unterminated-record limit.
    #[must_use]
    pub fn with_max_record_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_record_bytes = limit;
        self
    }

    /// Override the post-completion policy.
    #[must_use]
    pub fn with_after_done(mut self, policy: AfterDone) -> Self {
        self.after_done = policy;
        self
    }

    /// Full chat endpoint URL. A trailing `/` on the base URL is ignored.
    #[must_use]
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ChatConfig::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.max_record_bytes, Some(DEFAULT_MAX_RECORD_BYTES));
        assert_eq!(cfg.after_done, AfterDone::Stop);
    }

    #[test]
    fn builders_override() {
        let cfg = ChatConfig::default()
            .with_base_url("http://remote:11434")
            .with_model("mistral")
            .with_max_record_bytes(None)
            .with_after_done(AfterDone::Drain);
        assert_eq!(cfg.base_url, "http://remote:11434");
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.max_record_bytes, None);
        assert_eq!(cfg.after_done, AfterDone::Drain);
    }

    #[test]
    fn chat_url_includes_path() {
        let cfg = ChatConfig::default().with_base_url("http://localhost:9999");
        assert_eq!(cfg.chat_url(), "http://localhost:9999/api/chat");
    }

    #[test]
    fn chat_url_ignores_trailing_slash() {
        let cfg = ChatConfig::default().with_base_url("http://localhost:9999/");
        assert_eq!(cfg.chat_url(), "http://localhost:9999/api/chat");
    }
}
