//! ScriptedTransport — replays a fixed response without a network.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use rill_types::SessionError;

use crate::transport::{ByteStream, Transport, map_http_status};
use crate::wire::ChatRequest;

/// What a [`ScriptedTransport`] answers with.
#[derive(Debug, Clone)]
pub enum Script {
    /// A success status followed by these body chunks.
    Body(Vec<Vec<u8>>),
    /// These chunks, then a read error with the given message.
    BodyThenBreak(Vec<Vec<u8>>, String),
    /// A non-success status with a text body.
    Status(u16, String),
    /// The request fails before any response.
    Refuse(String),
}

impl Script {
    /// A success body delivered as the given text chunks.
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Body(
            chunks
                .into_iter()
                .map(|c| c.as_ref().as_bytes().to_vec())
                .collect(),
        )
    }
}

/// A [`Transport`] that replays a [`Script`] on every call.
///
/// Records every request it receives and counts how many body chunks the
/// caller actually pulled.
pub struct ScriptedTransport {
    script: Script,
    requests: Mutex<Vec<(String, ChatRequest)>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    /// Create a transport that answers with `script`.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of `(url, body)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    /// Body items handed out so far, across all calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn open(
        &self,
        url: &str,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, SessionError>> + Send {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push((url.to_string(), request.clone()));
        let script = self.script.clone();
        let reads = Arc::clone(&self.reads);

        async move {
            let items: Vec<Result<Bytes, SessionError>> = match script {
                Script::Refuse(message) => return Err(SessionError::Transport(message.into())),
                Script::Status(code, body) => {
                    let status = reqwest::StatusCode::from_u16(code)
                        .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                    return Err(map_http_status(status, body));
                }
                Script::Body(chunks) => chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect(),
                Script::BodyThenBreak(chunks, message) => chunks
                    .into_iter()
                    .map(|c| Ok(Bytes::from(c)))
                    .chain(std::iter::once(Err(SessionError::Stream(message))))
                    .collect(),
            };

            let body = futures::stream::iter(items).inspect(move |_| {
                reads.fetch_add(1, Ordering::SeqCst);
            });
            Ok(Box::pin(body) as ByteStream)
        }
    }
}
