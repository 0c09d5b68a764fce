#![deny(missing_docs)]
//! Incremental NDJSON ingestion for the Ollama Chat API.
//!
//! Ollama streams one JSON object per line:
//! ```text
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hello"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":" world"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","eval_count":10,"prompt_eval_count":20}
//! ```
//!
//! Network reads split that text at arbitrary byte offsets. This crate turns
//! the raw reads back into records in three stages, none of which touches the
//! network:
//!
//! 1. [`Utf8ChunkDecoder`] turns byte chunks into text, holding back a
//!    multi-byte character split across two reads.
//! 2. [`FrameAssembler`] splits text on `\n`, carrying the unterminated tail
//!    forward to the next chunk.
//! 3. [`decode_record`] parses one complete line and extracts the token and
//!    completion flag.
//!
//! ```
//! use rill_ndjson::{FrameAssembler, Utf8ChunkDecoder, decode_record};
//!
//! let mut text = Utf8ChunkDecoder::new();
//! let mut frames = FrameAssembler::new();
//! let mut out = String::new();
//!
//! for chunk in [&b"{\"message\":{\"content\":\"Hel\"},\"do"[..], &b"ne\":false}\n"[..]] {
//!     for line in frames.feed(&text.decode(chunk)).records {
//!         if let Some(Ok(record)) = decode_record(&line) {
//!             out.push_str(&record.token);
//!         }
//!     }
//! }
//! assert_eq!(out, "Hel");
//! ```

pub mod frame;
pub mod record;
pub mod utf8;

pub use frame::{Feed, FrameAssembler};
pub use record::{DecodedRecord, Usage, decode_record};
pub use utf8::Utf8ChunkDecoder;
