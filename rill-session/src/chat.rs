//! The session host: transcript, observation log, draft input, busy flag.

use std::ops::{Deref, DerefMut};

use rill_types::{Conversation, MessageId, Observation, ObservationLog, Role, SubmitRejected};

use crate::config::ChatConfig;
use crate::hook::SessionHook;
use crate::session::{SessionOutcome, StreamSession};
use crate::transport::Transport;
use crate::wire::{ChatRequest, WireMessage};

/// Owner of everything that outlives a single session.
///
/// Only one [`StreamSession`] may be in flight at a time. While one is, the
/// busy flag is set and every further [`begin`](Self::begin) is rejected
/// without side effects.
#[derive(Debug, Default)]
pub struct Chat {
    config: ChatConfig,
    conversation: Conversation,
    log: ObservationLog,
    input: String,
    busy: bool,
}

impl Chat {
    /// Create an idle chat with an empty transcript.
    #[must_use]
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Mutable settings. Changes take effect on the next session.
    pub fn config_mut(&mut self) -> &mut ChatConfig {
        &mut self.config
    }

    /// The transcript.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The diagnostic log of the current (or last) session.
    #[must_use]
    pub fn log(&self) -> &ObservationLog {
        &self.log
    }

    /// The draft input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the draft input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether a session is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether a session is in flight and its assistant message is still
    /// empty (the "typing" indicator).
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.busy
            && self
                .conversation
                .in_flight()
                .is_some_and(|m| m.content.is_empty())
    }

    /// Start a session for `input`.
    ///
    /// Rejected with no effect when the trimmed input is empty or another
    /// session is in flight. Otherwise appends the user message and an empty
    /// assistant message, clears the observation log and the draft input,
    /// and sets the busy flag.
    pub fn begin(&mut self, input: &str) -> Result<StreamSession, SubmitRejected> {
        if self.busy || self.conversation.in_flight().is_some() {
            tracing::debug!("submit rejected: session in flight");
            return Err(SubmitRejected::Busy);
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }

        let mut messages: Vec<WireMessage> =
            self.conversation.iter().map(WireMessage::from).collect();
        let Some(message_id) = self.conversation.begin_exchange(text) else {
            return Err(SubmitRejected::Busy);
        };
        messages.push(WireMessage {
            role: Role::User,
            content: text.to_string(),
        });

        self.log.clear();
        self.input.clear();
        self.busy = true;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
        };
        Ok(StreamSession::new(message_id, &self.config, request))
    }

    /// Start a session from the draft input. The draft is kept when the
    /// submit is rejected.
    pub fn begin_from_input(&mut self) -> Result<StreamSession, SubmitRejected> {
        let draft = self.input.clone();
        self.begin(&draft)
    }

    /// [`begin`](Self::begin) and [`run`](StreamSession::run) in one call.
    pub async fn submit<T, H>(
        &mut self,
        transport: &T,
        input: &str,
        hook: &mut H,
    ) -> Result<SessionOutcome, SubmitRejected>
    where
        T: Transport,
        H: SessionHook,
    {
        let session = self.begin(input)?;
        Ok(session.run(self, transport, hook).await)
    }

    /// Reset the transcript and the log. Refused (returns `false`) while a
    /// session is in flight.
    pub fn clear(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.conversation.clear();
        self.log.clear();
        true
    }

    /// Record an observation and notify the hook.
    pub(crate) fn observe<H: SessionHook>(&mut self, observation: Observation, hook: &mut H) {
        let entry = self.log.record(observation);
        hook.on_observation(entry, &self.conversation);
    }

    /// Append text to the in-flight message.
    pub(crate) fn append(&mut self, id: MessageId, text: &str) -> bool {
        let appended = self.conversation.append_to(id, text);
        if !appended {
            tracing::warn!(message_id = %id, "in-flight message is gone; text dropped");
        }
        appended
    }

    /// End the session that owns `id`.
    pub(crate) fn release(&mut self, id: MessageId) {
        self.conversation.finish(id);
        self.busy = false;
    }

    /// Borrow the chat for the running session `id`. The claim releases the
    /// chat when dropped, even if the session never reaches a terminal state.
    pub(crate) fn claim(&mut self, id: MessageId) -> Claim<'_> {
        Claim {
            chat: self,
            id,
            settled: false,
        }
    }
}

/// A running session's hold on its [`Chat`].
pub(crate) struct Claim<'a> {
    chat: &'a mut Chat,
    id: MessageId,
    settled: bool,
}

impl Claim<'_> {
    /// Release after the session reached `Completed` or `Failed`.
    pub(crate) fn settle(mut self) {
        self.settled = true;
    }
}

impl Deref for Claim<'_> {
    type Target = Chat;

    fn deref(&self) -> &Chat {
        self.chat
    }
}

impl DerefMut for Claim<'_> {
    fn deref_mut(&mut self) -> &mut Chat {
        self.chat
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(message_id = %self.id, "session dropped before finishing; releasing chat");
        }
        self.chat.release(self.id);
    }
}
