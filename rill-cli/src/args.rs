//! Command-line flags.

use std::time::Duration;

use clap::Parser;
use rill_session::config::{DEFAULT_BASE_URL, DEFAULT_MAX_RECORD_BYTES, DEFAULT_MODEL};
use rill_session::{AfterDone, ChatConfig};

/// rill: stream chat replies from a local Ollama server
#[derive(Parser, Debug)]
#[command(name = "rill", version, about, long_about = None)]
pub struct Args {
    /// Ollama server base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Model to chat with
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Print the observation log after every response
    #[arg(long)]
    pub debug: bool,

    /// Largest unterminated record to buffer, in bytes (0 disables the limit)
    #[arg(long, default_value_t = DEFAULT_MAX_RECORD_BYTES)]
    pub max_record_bytes: usize,

    /// Keep reading the response after the completion record
    #[arg(long)]
    pub drain_after_done: bool,

    /// Connection timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Whole-request timeout in seconds, streaming included
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Session settings described by the flags.
    pub fn config(&self) -> ChatConfig {
        let limit = (self.max_record_bytes > 0).then_some(self.max_record_bytes);
        let policy = if self.drain_after_done {
            AfterDone::Drain
        } else {
            AfterDone::Stop
        };
        ChatConfig::default()
            .with_base_url(self.url.clone())
            .with_model(self.model.clone())
            .with_max_record_bytes(limit)
            .with_after_done(policy)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_defaults() {
        let args = Args::try_parse_from(["rill"]).unwrap();
        assert_eq!(args.config(), ChatConfig::default());
        assert!(!args.debug);
        assert_eq!(args.log_level, "warn");
        assert_eq!(args.connect_timeout(), None);
        assert_eq!(args.timeout(), None);
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "rill",
            "--url",
            "http://gpu-box:11434/",
            "-m",
            "llama3.2",
            "--max-record-bytes",
            "0",
            "--drain-after-done",
            "--connect-timeout",
            "5",
            "--timeout",
            "120",
            "--debug",
        ])
        .unwrap();

        let config = args.config();
        assert_eq!(config.chat_url(), "http://gpu-box:11434/api/chat");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_record_bytes, None);
        assert_eq!(config.after_done, AfterDone::Drain);
        assert_eq!(args.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(args.timeout(), Some(Duration::from_secs(120)));
        assert!(args.debug);
    }
}
