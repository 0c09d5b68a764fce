//! The diagnostic observation log.
//!
//! Every raw chunk, parsed record, extracted token, completion marker, and
//! error seen during a session is appended here, independently of the
//! transcript. The log is append-only while a session runs and is cleared
//! when the next session starts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Tag of an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    /// A raw chunk read from the response body.
    Chunk,
    /// A line that decoded into a JSON object.
    Parsed,
    /// A non-empty token extracted from a record.
    Token,
    /// The server signalled completion.
    Done,
    /// A record-level or session-level failure.
    Error,
}

impl ObservationKind {
    /// Lowercase tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::Parsed => "parsed",
            Self::Token => "token",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of an [`Observation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObservationData {
    /// Decoded text of one raw chunk.
    Chunk {
        /// 1-based position of the chunk within the session.
        number: u64,
        /// Chunk text, exactly as decoded.
        text: String,
    },
    /// A successfully decoded record.
    Parsed {
        /// The decoded JSON object.
        value: serde_json::Value,
        /// The line it was decoded from.
        raw_line: String,
    },
    /// A token appended to the transcript.
    Token {
        /// Token text.
        text: String,
        /// JSON-quoted form of the token, making whitespace visible.
        escaped: String,
    },
    /// Completion marker.
    Done {
        /// Human-readable completion note.
        message: String,
    },
    /// A failure.
    Error {
        /// What went wrong.
        message: String,
        /// The raw line involved, for record-level failures.
        raw_line: Option<String>,
    },
}

/// One timestamped log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Payload.
    #[serde(flatten)]
    pub data: ObservationData,
}

impl Observation {
    fn now(data: ObservationData) -> Self {
        Self {
            timestamp: Utc::now(),
            data,
        }
    }

    /// A raw chunk observation.
    pub fn chunk(number: u64, text: impl Into<String>) -> Self {
        Self::now(ObservationData::Chunk {
            number,
            text: text.into(),
        })
    }

    /// A parsed record observation.
    pub fn parsed(value: serde_json::Value, raw_line: impl Into<String>) -> Self {
        Self::now(ObservationData::Parsed {
            value,
            raw_line: raw_line.into(),
        })
    }

    /// A token observation. The escaped form is computed here.
    pub fn token(text: impl Into<String>) -> Self {
        let text = text.into();
        let escaped = serde_json::to_string(&text).unwrap_or_else(|_| format!("{text:?}"));
        Self::now(ObservationData::Token { text, escaped })
    }

    /// A completion observation.
    pub fn done(message: impl Into<String>) -> Self {
        Self::now(ObservationData::Done {
            message: message.into(),
        })
    }

    /// An error observation, optionally tied to a raw line.
    pub fn error(message: impl Into<String>, raw_line: Option<String>) -> Self {
        Self::now(ObservationData::Error {
            message: message.into(),
            raw_line,
        })
    }

    /// Tag of this entry.
    #[must_use]
    pub fn kind(&self) -> ObservationKind {
        match self.data {
            ObservationData::Chunk { .. } => ObservationKind::Chunk,
            ObservationData::Parsed { .. } => ObservationKind::Parsed,
            ObservationData::Token { .. } => ObservationKind::Token,
            ObservationData::Done { .. } => ObservationKind::Done,
            ObservationData::Error { .. } => ObservationKind::Error,
        }
    }
}

/// Per-kind entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationCounts {
    /// Raw chunks.
    pub chunks: usize,
    /// Parsed records.
    pub parsed: usize,
    /// Extracted tokens.
    pub tokens: usize,
    /// Completion markers.
    pub done: usize,
    /// Errors.
    pub errors: usize,
}

/// Append-only sequence of [`Observation`]s.
#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    entries: Vec<Observation>,
}

impl ObservationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a reference to it.
    pub fn record(&mut self, observation: Observation) -> &Observation {
        self.entries.push(observation);
        // Just pushed, so the log is non-empty.
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in recording order.
    #[must_use]
    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    /// Iterate entries in recording order.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.entries.iter()
    }

    /// Entries of a single kind.
    pub fn of_kind(&self, kind: ObservationKind) -> impl Iterator<Item = &Observation> {
        self.entries.iter().filter(move |o| o.kind() == kind)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries per kind.
    #[must_use]
    pub fn counts(&self) -> ObservationCounts {
        let mut counts = ObservationCounts::default();
        for entry in &self.entries {
            match entry.kind() {
                ObservationKind::Chunk => counts.chunks += 1,
                ObservationKind::Parsed => counts.parsed += 1,
                ObservationKind::Token => counts.tokens += 1,
                ObservationKind::Done => counts.done += 1,
                ObservationKind::Error => counts.errors += 1,
            }
        }
        counts
    }

    /// Drop every entry. Only called between sessions.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a ObservationLog {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
