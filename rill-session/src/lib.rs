#![deny(missing_docs)]
//! Streaming chat sessions against Ollama's `/api/chat` endpoint.
//!
//! A [`Chat`] owns the transcript, the observation log, and the busy flag.
//! [`Chat::begin`] turns a submit into a [`StreamSession`], which
//! [`StreamSession::run`] drives to `Completed` or `Failed`:
//!
//! ```no_run
//! use rill_session::{Chat, ChatConfig, NoopHook, OllamaTransport};
//!
//! # async fn demo() {
//! let mut chat = Chat::new(ChatConfig::default().with_model("llama3.2"));
//! let transport = OllamaTransport::new();
//!
//! let outcome = chat
//!     .submit(&transport, "Why is the sky blue?", &mut NoopHook)
//!     .await
//!     .expect("input is not empty and nothing else is streaming");
//! println!("{:?}: {}", outcome.state, chat.conversation().messages()[1].content);
//! # }
//! ```
//!
//! Record-level problems (a malformed line) are logged and skipped.
//! Session-level problems (refused connection, error status, broken body)
//! end the session and are appended to the assistant message as an
//! `[Error: ...]` annotation after whatever text had already arrived.

pub mod chat;
pub mod config;
pub mod hook;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;
pub mod wire;

pub use chat::Chat;
pub use config::{AfterDone, ChatConfig};
pub use hook::{NoopHook, SessionHook};
pub use session::{SessionOutcome, SessionState, StreamSession};
pub use transport::{ByteStream, OllamaTransport, Transport};
pub use wire::{ChatRequest, WireMessage};

pub use rill_ndjson::Usage;
pub use rill_types;
