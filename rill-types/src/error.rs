//! Error types for all rill crates.

use std::time::Duration;

/// Session-level failures. Each one ends the session in the `Failed` state
/// and is surfaced in the transcript as an annotation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request could not be sent or the connection dropped before a
    /// response arrived (unreachable host, refused connection, ...).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The HTTP client gave up waiting.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// The server answered with a non-success status.
    #[error("server error: {status} {reason}. {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status, possibly empty.
        reason: String,
        /// Response body text.
        body: String,
    },
    /// Reading the response body failed after streaming began.
    #[error("stream error: {0}")]
    Stream(String),
    /// The record framing layer gave up.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl SessionError {
    /// HTTP status code, when the failure came from the server.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text appended to the in-flight assistant message on failure.
    #[must_use]
    pub fn annotation(&self) -> String {
        format!("\n\n[Error: {self}]")
    }
}

/// Errors from the record framing layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A record grew past the configured limit without a separator.
    #[error("record exceeds {limit} bytes without a newline ({buffered} bytes buffered)")]
    RecordTooLarge {
        /// Configured maximum size of a partial record.
        limit: usize,
        /// Bytes that were buffered when the limit was hit.
        buffered: usize,
    },
}

/// A single line that could not be decoded as a record.
///
/// Never fatal: the session logs it and keeps reading.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not valid JSON.
    #[error("parse error: {source}")]
    Json {
        /// The offending line.
        line: String,
        /// Parser diagnostic.
        #[source]
        source: serde_json::Error,
    },
    /// The line is valid JSON but not an object.
    #[error("parse error: expected a JSON object, found {found}")]
    NotAnObject {
        /// The offending line.
        line: String,
        /// Kind of JSON value that was found instead.
        found: &'static str,
    },
}

impl DecodeError {
    /// The raw line that failed to decode.
    #[must_use]
    pub fn line(&self) -> &str {
        match self {
            Self::Json { line, .. } | Self::NotAnObject { line, .. } => line,
        }
    }
}

/// Reasons a submit is refused before a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    /// The input was empty or whitespace-only.
    #[error("nothing to send")]
    EmptyInput,
    /// Another session is still in flight.
    #[error("a response is still streaming")]
    Busy,
}
