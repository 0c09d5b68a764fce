//! Newline framing with carry-over.

use rill_types::FrameError;

/// What one [`FrameAssembler::feed`] produced.
///
/// `records` holds every record the chunk completed, even when the retained
/// tail overflowed the limit in the same call.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Feed {
    /// Completed records, in order, without their separators.
    pub records: Vec<String>,
    /// Set when the unterminated tail grew past the limit. The tail has been
    /// dropped.
    pub overflow: Option<FrameError>,
}

/// Splits a text stream into newline-terminated records.
///
/// Each [`feed`](Self::feed) appends to an internal buffer and returns every
/// record completed by that call, in order. The unterminated tail stays in the
/// buffer until a later chunk completes it, so a record split across any
/// number of chunks comes out exactly once and unchanged.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: String,
    max_partial: Option<usize>,
}

impl FrameAssembler {
    /// Create an assembler with no limit on the partial record size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler that reports an overflow once the unterminated
    /// tail grows past `max_partial` bytes. `None` means unbounded.
    #[must_use]
    pub fn with_limit(max_partial: Option<usize>) -> Self {
        Self {
            buffer: String::new(),
            max_partial,
        }
    }

    /// Append `chunk` and return the records it completed.
    ///
    /// Records are returned without their `\n` (and without a `\r` directly
    /// before it). Empty records are returned as empty strings.
    ///
    /// When the retained tail exceeds the limit the tail is dropped and
    /// [`Feed::overflow`] is set; records completed by the same call are
    /// still returned.
    pub fn feed(&mut self, chunk: &str) -> Feed {
        let scanned = self.buffer.len();
        self.buffer.push_str(chunk);

        let mut feed = Feed::default();
        // Only the appended text can hold a new separator.
        if let Some(pos) = self.buffer[scanned..].rfind('\n') {
            let last = scanned + pos;
            let tail = self.buffer.split_off(last + 1);
            let complete = std::mem::replace(&mut self.buffer, tail);
            feed.records.extend(
                complete[..last]
                    .split('\n')
                    .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string()),
            );
        }

        if let Some(limit) = self.max_partial {
            if self.buffer.len() > limit {
                let buffered = self.buffer.len();
                self.buffer.clear();
                feed.overflow = Some(FrameError::RecordTooLarge { limit, buffered });
            }
        }

        feed
    }

    /// The unterminated tail currently buffered.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Remove and return the unterminated tail.
    pub fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}
