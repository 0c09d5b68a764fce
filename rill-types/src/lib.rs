#![deny(missing_docs)]
//! Shared types for the rill streaming chat client.
//!
//! - [`Conversation`] and [`ChatMessage`]: the in-memory transcript, keyed by
//!   [`MessageId`], with at most one in-flight assistant message.
//! - [`ObservationLog`]: the append-only diagnostic side channel recording
//!   every chunk, parsed record, token, completion, and error of a session.
//! - Error enums for every layer of the pipeline.

pub mod error;
pub mod observe;
pub mod types;

pub use error::*;
pub use observe::*;
pub use types::*;
