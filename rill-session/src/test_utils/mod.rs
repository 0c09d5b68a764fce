//! In-memory collaborators for testing.
//!
//! Available behind the `test-utils` feature flag.

mod recording_hook;
mod scripted_transport;

pub use recording_hook::RecordingHook;
pub use scripted_transport::{Script, ScriptedTransport};
