//! HTTP transport for the Ollama Chat API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use rill_types::SessionError;

use crate::wire::ChatRequest;

/// Raw response body, one item per network read.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, SessionError>> + Send>>;

/// Opens a streaming chat response.
///
/// Implementations resolve to the response body once the server has answered
/// with a success status, or to a [`SessionError`] when the request fails or
/// the status is an error. Reading the body is left to the caller.
///
/// This trait uses RPITIT and is not object-safe; sessions are generic over
/// the transport.
pub trait Transport: Send + Sync {
    /// `POST` `request` to `url` and return the body stream.
    fn open(
        &self,
        url: &str,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, SessionError>> + Send;
}

/// [`Transport`] backed by `reqwest`.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use rill_session::OllamaTransport;
///
/// let transport = OllamaTransport::new()
///     .with_connect_timeout(Duration::from_secs(5))
///     .expect("client builds");
/// ```
#[derive(Debug, Clone, Default)]
pub struct OllamaTransport {
    client: reqwest::Client,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl OllamaTransport {
    /// Create a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured `reqwest` client. Timeouts set earlier are
    /// forgotten; configure them on `client` instead.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self.connect_timeout = None;
        self.timeout = None;
        self
    }

    /// Bound connection setup only. A response may stream for as long as the
    /// model keeps generating.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Result<Self, SessionError> {
        self.connect_timeout = Some(timeout);
        self.rebuild()
    }

    /// Bound the whole request, from connecting until the last byte of the
    /// streamed body. A reply still streaming when it expires fails with
    /// [`SessionError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SessionError> {
        self.timeout = Some(timeout);
        self.rebuild()
    }

    fn rebuild(mut self) -> Result<Self, SessionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        self.client = builder
            .build()
            .map_err(|e| SessionError::Transport(Box::new(e)))?;
        Ok(self)
    }

    fn limits(&self) -> Limits {
        Limits {
            connect: self.connect_timeout,
            total: self.timeout,
        }
    }
}

/// Configured timeouts, used to report which one expired.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Limits {
    connect: Option<Duration>,
    total: Option<Duration>,
}

impl Transport for OllamaTransport {
    fn open(
        &self,
        url: &str,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, SessionError>> + Send {
        let pending = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(request);
        let limits = self.limits();

        async move {
            let response = pending
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, limits))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|e| map_reqwest_error(e, limits))?;
                return Err(map_http_status(status, body));
            }

            let body = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| match limits.total {
                    Some(limit) if e.is_timeout() => SessionError::Timeout(limit),
                    _ => SessionError::Stream(e.to_string()),
                })
            });
            Ok(Box::pin(body) as ByteStream)
        }
    }
}

/// Map a non-success HTTP status to [`SessionError::Server`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: String) -> SessionError {
    SessionError::Server {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    }
}

/// Map a [`reqwest::Error`] raised before streaming began.
pub(crate) fn map_reqwest_error(err: reqwest::Error, limits: Limits) -> SessionError {
    if err.is_timeout() {
        let expired = if err.is_connect() {
            limits.connect.or(limits.total)
        } else {
            limits.total.or(limits.connect)
        };
        if let Some(limit) = expired {
            return SessionError::Timeout(limit);
        }
    }
    SessionError::Transport(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_500_keeps_code_reason_and_body() {
        let err = map_http_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "model not found".into(),
        );
        match &err {
            SessionError::Server {
                status,
                reason,
                body,
            } => {
                assert_eq!(*status, 500);
                assert_eq!(reason, "Internal Server Error");
                assert_eq!(body, "model not found");
            }
            other => panic!("expected Server, got: {other:?}"),
        }
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let status = reqwest::StatusCode::from_u16(599).expect("valid status");
        let err = map_http_status(status, "edge case".into());
        assert!(matches!(
            err,
            SessionError::Server { status: 599, ref reason, .. } if reason.is_empty()
        ));
    }

    #[test]
    fn empty_body_preserved_in_error() {
        let err = map_http_status(reqwest::StatusCode::BAD_REQUEST, String::new());
        assert!(matches!(err, SessionError::Server { ref body, .. } if body.is_empty()));
    }

    #[test]
    fn timeout_builders_keep_each_other() {
        let transport = OllamaTransport::new()
            .with_connect_timeout(Duration::from_secs(3))
            .and_then(|t| t.with_timeout(Duration::from_secs(60)))
            .expect("client builds");
        assert_eq!(transport.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(transport.timeout, Some(Duration::from_secs(60)));

        let transport = transport.with_client(reqwest::Client::new());
        assert_eq!(transport.connect_timeout, None);
        assert_eq!(transport.timeout, None);
    }
}
