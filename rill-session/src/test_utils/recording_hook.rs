//! RecordingHook — keeps everything it is told.

use rill_types::{Conversation, Observation, ObservationKind};

use crate::hook::SessionHook;
use crate::session::SessionState;

/// A hook that records every observation kind, the in-flight content seen at
/// each token, and every state transition.
#[derive(Debug, Default)]
pub struct RecordingHook {
    /// Observation kinds, in notification order.
    pub kinds: Vec<ObservationKind>,
    /// Content of the in-flight message at each token notification.
    pub snapshots: Vec<String>,
    /// State transitions, in order.
    pub states: Vec<SessionState>,
}

impl RecordingHook {
    /// Create an empty recording hook.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionHook for RecordingHook {
    fn on_observation(&mut self, observation: &Observation, conversation: &Conversation) {
        self.kinds.push(observation.kind());
        if observation.kind() == ObservationKind::Token {
            if let Some(message) = conversation.in_flight() {
                self.snapshots.push(message.content.clone());
            }
        }
    }

    fn on_state(&mut self, state: SessionState) {
        self.states.push(state);
    }
}
