//! The stream session controller.
//!
//! One [`StreamSession`] covers one submit: it opens the response, feeds raw
//! chunks through the UTF-8 decoder and the frame assembler, decodes each
//! complete record, and applies the results to the host [`Chat`].
//!
//! ```text
//! Idle ──begin──▶ Sending ──body readable──▶ Streaming ──done / closed──▶ Completed
//!                    │                          │
//!                    └──── request / status ────┴──── read error / oversize ──▶ Failed
//! ```

use futures::StreamExt;
use rill_ndjson::{FrameAssembler, Usage, Utf8ChunkDecoder, decode_record};
use rill_types::{MessageId, Observation, SessionError};
use tracing::Instrument;

use crate::chat::Chat;
use crate::config::{AfterDone, ChatConfig};
use crate::hook::SessionHook;
use crate::transport::{ByteStream, Transport};
use crate::wire::ChatRequest;

/// Lifecycle state of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// Request sent, waiting for the response head.
    Sending,
    /// Reading the response body.
    Streaming,
    /// The server finished (or closed the body) without a session error.
    Completed,
    /// A session-level error ended the session.
    Failed,
}

impl SessionState {
    /// Whether the state is `Completed` or `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Summary of a finished session.
#[derive(Debug)]
pub struct SessionOutcome {
    /// The assistant message the session streamed into.
    pub message_id: MessageId,
    /// `Completed` or `Failed`.
    pub state: SessionState,
    /// Raw chunks read from the body.
    pub chunks: u64,
    /// Tokens appended to the transcript.
    pub tokens: usize,
    /// Model name reported by the server.
    pub model: Option<String>,
    /// Statistics from the completion record, if one arrived.
    pub usage: Option<Usage>,
    /// The error that ended a failed session.
    pub error: Option<SessionError>,
}

impl SessionOutcome {
    /// Whether the session completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }
}

enum Flow {
    Continue,
    Done,
}

const COMPLETED_NOTE: &str = "Stream completed";

/// Controller for a single streaming request.
///
/// Created by [`Chat::begin`]; consumed by [`run`](Self::run).
#[derive(Debug)]
pub struct StreamSession {
    message_id: MessageId,
    url: String,
    request: ChatRequest,
    after_done: AfterDone,
    text: Utf8ChunkDecoder,
    frames: FrameAssembler,
    state: SessionState,
    chunks: u64,
    tokens: usize,
    model: Option<String>,
    usage: Option<Usage>,
}

impl StreamSession {
    pub(crate) fn new(message_id: MessageId, config: &ChatConfig, request: ChatRequest) -> Self {
        Self {
            message_id,
            url: config.chat_url(),
            request,
            after_done: config.after_done,
            text: Utf8ChunkDecoder::new(),
            frames: FrameAssembler::with_limit(config.max_record_bytes),
            state: SessionState::Sending,
            chunks: 0,
            tokens: 0,
            model: None,
            usage: None,
        }
    }

    /// The assistant message this session streams into.
    #[must_use]
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Endpoint the request goes to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request body.
    #[must_use]
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to a terminal state.
    ///
    /// Never returns early on a malformed record. Releases the host's busy
    /// flag before returning, and also when the returned future is dropped
    /// before it finishes (a timeout or `select!` elsewhere).
    pub async fn run<T, H>(mut self, chat: &mut Chat, transport: &T, hook: &mut H) -> SessionOutcome
    where
        T: Transport,
        H: SessionHook,
    {
        let span = tracing::info_span!(
            "rill.session",
            message_id = %self.message_id,
            model = %self.request.model,
        );

        async move {
            let mut chat = chat.claim(self.message_id);
            hook.on_state(SessionState::Sending);
            tracing::debug!(
                url = %self.url,
                messages = self.request.messages.len(),
                "sending chat request"
            );

            let error = match self.stream(&mut chat, transport, hook).await {
                Ok(()) => {
                    self.state = SessionState::Completed;
                    tracing::debug!(
                        chunks = self.chunks,
                        tokens = self.tokens,
                        "session completed"
                    );
                    None
                }
                Err(err) => {
                    self.fail(&mut chat, &err, hook);
                    Some(err)
                }
            };

            chat.settle();
            hook.on_state(self.state);

            SessionOutcome {
                message_id: self.message_id,
                state: self.state,
                chunks: self.chunks,
                tokens: self.tokens,
                model: self.model,
                usage: self.usage,
                error,
            }
        }
        .instrument(span)
        .await
    }

    async fn stream<T, H>(
        &mut self,
        chat: &mut Chat,
        transport: &T,
        hook: &mut H,
    ) -> Result<(), SessionError>
    where
        T: Transport,
        H: SessionHook,
    {
        let mut body = transport.open(&self.url, &self.request).await?;
        self.state = SessionState::Streaming;
        hook.on_state(SessionState::Streaming);

        while let Some(chunk) = body.next().await {
            let bytes = chunk?;
            if let Flow::Done = self.ingest(chat, &bytes, hook)? {
                match self.after_done {
                    AfterDone::Stop => {
                        tracing::debug!("completion record received; closing body");
                    }
                    AfterDone::Drain => self.drain(chat, &mut body, hook).await,
                }
                return Ok(());
            }
        }

        self.finish_body(chat, hook);
        Ok(())
    }

    /// Process one raw chunk. Returns [`Flow::Done`] at the completion record;
    /// records after it in the same chunk are not looked at. Records the chunk
    /// completed are applied before an oversized tail fails the session.
    fn ingest<H: SessionHook>(
        &mut self,
        chat: &mut Chat,
        bytes: &[u8],
        hook: &mut H,
    ) -> Result<Flow, SessionError> {
        let text = self.record_chunk(chat, bytes, hook);
        let feed = self.frames.feed(&text);

        for line in feed.records {
            let record = match decode_record(&line) {
                None => continue,
                Some(Ok(record)) => record,
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "skipping malformed record");
                    chat.observe(Observation::error(err.to_string(), Some(line)), hook);
                    continue;
                }
            };
            tracing::trace!(done = record.done, token_len = record.token.len(), "record");

            if record.model.is_some() {
                self.model = record.model;
            }
            chat.observe(Observation::parsed(record.value, line), hook);

            if !record.token.is_empty() && chat.append(self.message_id, &record.token) {
                self.tokens += 1;
                chat.observe(Observation::token(record.token), hook);
            }

            if record.done {
                self.usage = record.usage;
                chat.observe(Observation::done(COMPLETED_NOTE), hook);
                return Ok(Flow::Done);
            }
        }

        match feed.overflow {
            Some(err) => Err(err.into()),
            None => Ok(Flow::Continue),
        }
    }

    /// Decode and log a chunk, returning its text.
    fn record_chunk<H: SessionHook>(&mut self, chat: &mut Chat, bytes: &[u8], hook: &mut H) -> String {
        self.chunks += 1;
        let text = self.text.decode(bytes);
        tracing::trace!(chunk = self.chunks, bytes = bytes.len(), "chunk");
        chat.observe(Observation::chunk(self.chunks, text.clone()), hook);
        text
    }

    /// Read the rest of the body after the completion record, logging chunks
    /// only. A read error here cannot undo the completion.
    async fn drain<H: SessionHook>(&mut self, chat: &mut Chat, body: &mut ByteStream, hook: &mut H) {
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    self.record_chunk(chat, &bytes, hook);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "read error after completion; ignoring");
                    break;
                }
            }
        }
    }

    /// The body closed without a completion record.
    fn finish_body<H: SessionHook>(&mut self, chat: &mut Chat, hook: &mut H) {
        let flushed = self.text.finish();
        let mut partial = self.frames.take_pending();
        partial.push_str(&flushed);

        if !partial.trim().is_empty() {
            tracing::warn!(bytes = partial.len(), "discarding unterminated record at end of body");
            chat.observe(
                Observation::error("stream ended inside an unterminated record", Some(partial)),
                hook,
            );
        }
    }

    fn fail<H: SessionHook>(&mut self, chat: &mut Chat, err: &SessionError, hook: &mut H) {
        self.state = SessionState::Failed;
        tracing::warn!(error = %err, chunks = self.chunks, tokens = self.tokens, "session failed");
        chat.append(self.message_id, &err.annotation());
        chat.observe(Observation::error(err.to_string(), None), hook);
    }
}
