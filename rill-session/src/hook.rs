//! Live notification of session progress.

use rill_types::{Conversation, Observation};

use crate::session::SessionState;

/// Receives every observation as it is recorded, together with a read-only
/// view of the transcript at that moment.
///
/// Hooks observe; they cannot steer the session. Front ends use them to
/// render tokens as they arrive.
pub trait SessionHook {
    /// Called after `observation` has been appended to the log.
    fn on_observation(&mut self, observation: &Observation, conversation: &Conversation);

    /// Called on every state transition.
    fn on_state(&mut self, _state: SessionState) {}
}

/// A hook that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl SessionHook for NoopHook {
    fn on_observation(&mut self, _observation: &Observation, _conversation: &Conversation) {}
}
