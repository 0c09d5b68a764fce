//! End-to-end chats: a multi-turn conversation over HTTP, and a custom
//! transport plugged into the same session controller.
//!
//! Everything runs against wiremock or in memory; no Ollama server needed.

use std::future::Future;

use bytes::Bytes;
use rill_session::rill_types::{ObservationKind, Role, SessionError};
use rill_session::test_utils::RecordingHook;
use rill_session::{
    AfterDone, ByteStream, Chat, ChatConfig, ChatRequest, NoopHook, OllamaTransport,
    SessionState, Transport,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reply(tokens: &[&str]) -> String {
    let mut body = String::new();
    for token in tokens {
        body.push_str(
            &serde_json::json!({ "message": { "role": "assistant", "content": token }, "done": false })
                .to_string(),
        );
        body.push('\n');
    }
    body.push_str(
        &serde_json::json!({ "message": { "role": "assistant", "content": "" }, "done": true, "done_reason": "stop" })
            .to_string(),
    );
    body.push('\n');
    body
}

#[tokio::test]
async fn multi_turn_conversation_accumulates_history() {
    let mock_server = MockServer::start().await;

    // The more specific history is mounted first.
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                { "role": "user", "content": "Name a colour." },
                { "role": "assistant", "content": "Blue." },
                { "role": "user", "content": "Another?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(reply(&["Green", "."])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{ "role": "user", "content": "Name a colour." }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(reply(&["Bl", "ue", "."])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = OllamaTransport::new();
    let mut chat = Chat::new(ChatConfig::default().with_base_url(mock_server.uri()));

    let first = chat
        .submit(&transport, "Name a colour.", &mut NoopHook)
        .await
        .expect("accepted");
    assert!(first.is_completed());
    assert_eq!(first.tokens, 3);

    let mut hook = RecordingHook::new();
    let second = chat
        .submit(&transport, "Another?", &mut hook)
        .await
        .expect("accepted");
    assert!(second.is_completed());
    assert_eq!(hook.snapshots, vec!["Green", "Green."]);

    let transcript: Vec<(Role, &str)> = chat
        .conversation()
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        transcript,
        vec![
            (Role::User, "Name a colour."),
            (Role::Assistant, "Blue."),
            (Role::User, "Another?"),
            (Role::Assistant, "Green."),
        ]
    );

    // The log only covers the latest reply.
    assert_eq!(chat.log().of_kind(ObservationKind::Token).count(), 2);

    assert!(chat.clear());
    assert!(chat.conversation().is_empty());
    assert!(chat.log().is_empty());
}

#[tokio::test]
async fn failed_turn_stays_in_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({ "model": "missing" })))
        .respond_with(ResponseTemplate::new(404).set_body_string("model 'missing' not found"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(reply(&["ok"])))
        .mount(&mock_server)
        .await;

    let transport = OllamaTransport::new();
    let mut chat = Chat::new(
        ChatConfig::default()
            .with_base_url(mock_server.uri())
            .with_model("missing"),
    );

    let outcome = chat
        .submit(&transport, "hi", &mut NoopHook)
        .await
        .expect("accepted");
    assert_eq!(outcome.state, SessionState::Failed);

    chat.config_mut().model = "llama3.2".into();
    let outcome = chat
        .submit(&transport, "again", &mut NoopHook)
        .await
        .expect("accepted");
    assert!(outcome.is_completed());

    let messages = chat.conversation().messages();
    assert_eq!(messages.len(), 4);
    assert!(messages[1].content.contains("404"));
    assert_eq!(messages[3].content, "ok");
}

/// A transport that answers every request with the same canned chunks.
struct Canned(Vec<&'static [u8]>);

impl Transport for Canned {
    fn open(
        &self,
        _url: &str,
        _request: &ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, SessionError>> + Send {
        let chunks: Vec<Result<Bytes, SessionError>> = self
            .0
            .iter()
            .copied()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        std::future::ready(Ok(Box::pin(futures::stream::iter(chunks)) as ByteStream))
    }
}

#[tokio::test]
async fn custom_transport_with_multibyte_split() {
    // "é" is 0xC3 0xA9; the chunk boundary falls inside it.
    let transport = Canned(vec![
        &b"{\"response\":\"caf\xC3"[..],
        &b"\xA9\"}\n{\"done\":true}\n"[..],
    ]);
    let mut chat = Chat::new(ChatConfig::default().with_after_done(AfterDone::Drain));
    let outcome = chat
        .submit(&transport, "coffee?", &mut NoopHook)
        .await
        .expect("accepted");

    assert!(outcome.is_completed());
    assert_eq!(chat.conversation().messages()[1].content, "café");
    assert_eq!(chat.log().counts().errors, 0);
}
