//! Plain-text rendering of the transcript and the observation log.

use std::fmt::Write as _;

use rill_types::{Conversation, Observation, ObservationData, ObservationLog, Role};

pub const TYPING: &str = "...";

/// Display label for a role.
pub fn label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// Role-labelled transcript. With `typing`, an empty in-flight assistant
/// message shows the typing indicator instead of nothing.
pub fn render_transcript(conversation: &Conversation, typing: bool) -> String {
    let in_flight = conversation.in_flight().map(|m| m.id);
    let mut out = String::new();
    for message in conversation {
        let body = if typing && in_flight == Some(message.id) && message.content.is_empty() {
            TYPING
        } else {
            message.content.as_str()
        };
        let _ = writeln!(out, "{}: {body}", label(message.role));
    }
    out
}

/// The observation log: a counts summary followed by every entry.
pub fn render_log(log: &ObservationLog) -> String {
    let counts = log.counts();
    let mut out = format!(
        "Observation Log ({} chunks, {} parsed, {} tokens)\n",
        counts.chunks, counts.parsed, counts.tokens
    );
    if log.is_empty() {
        out.push_str("  No logs yet. Send a message to see streaming data.\n");
    }
    for entry in log {
        out.push_str(&render_entry(entry));
    }
    out
}

/// One log entry: an `[KIND] time` header and an indented body.
pub fn render_entry(entry: &Observation) -> String {
    let mut out = format!(
        "[{}] {}\n",
        entry.kind().as_str().to_uppercase(),
        entry.timestamp.format("%H:%M:%S%.3f")
    );
    match &entry.data {
        ObservationData::Chunk { number, text } => {
            let _ = writeln!(out, "  Raw Chunk #{number}:");
            indent(&mut out, text);
        }
        ObservationData::Parsed { value, raw_line } => {
            out.push_str("  Parsed JSON:\n");
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            indent(&mut out, &pretty);
            let _ = writeln!(out, "  Raw Line: {raw_line}");
        }
        ObservationData::Token { text, escaped } => {
            let _ = writeln!(out, "  Extracted Token: {text}");
            let _ = writeln!(out, "  Escaped: {escaped}");
        }
        ObservationData::Done { message } => {
            let _ = writeln!(out, "  \u{2713} {message}");
        }
        ObservationData::Error { message, raw_line } => {
            let _ = writeln!(out, "  \u{2717} {message}");
            if let Some(line) = raw_line {
                let _ = writeln!(out, "  Raw Line: {line}");
            }
        }
    }
    out
}

fn indent(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "    {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_labels_roles_and_shows_typing() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        let id = conversation.begin_assistant().unwrap();

        assert_eq!(
            render_transcript(&conversation, true),
            "You: hi\nAssistant: ...\n"
        );
        assert_eq!(
            render_transcript(&conversation, false),
            "You: hi\nAssistant: \n"
        );

        conversation.append_to(id, "Hello");
        assert_eq!(
            render_transcript(&conversation, true),
            "You: hi\nAssistant: Hello\n"
        );
    }

    #[test]
    fn finished_empty_reply_is_not_typing() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        let id = conversation.begin_assistant().unwrap();
        conversation.finish(id);
        assert!(!render_transcript(&conversation, true).contains(TYPING));
        assert_eq!(label(Role::Assistant), "Assistant");
    }

    #[test]
    fn log_summary_counts_entries() {
        let mut log = ObservationLog::new();
        log.record(Observation::chunk(1, "{\"response\":\"a\"}\n"));
        log.record(Observation::parsed(
            serde_json::json!({"response": "a"}),
            "{\"response\":\"a\"}",
        ));
        log.record(Observation::token("a"));

        let text = render_log(&log);
        assert!(text.starts_with("Observation Log (1 chunks, 1 parsed, 1 tokens)\n"));
        assert!(text.contains("[CHUNK] "));
        assert!(text.contains("  Raw Chunk #1:\n"));
        assert!(text.contains("  Parsed JSON:\n"));
        assert!(text.contains("\"response\": \"a\""));
        assert!(text.contains("  Extracted Token: a\n"));
        assert!(text.contains("  Escaped: \"a\"\n"));
    }

    #[test]
    fn empty_log_has_placeholder() {
        let text = render_log(&ObservationLog::new());
        assert!(text.contains("0 chunks, 0 parsed, 0 tokens"));
        assert!(text.contains("No logs yet"));
    }

    #[test]
    fn errors_and_done_use_markers() {
        let entry = Observation::error("parse error: bad", Some("{oops".into()));
        let text = render_entry(&entry);
        assert!(text.starts_with("[ERROR] "));
        assert!(text.contains("\u{2717} parse error: bad"));
        assert!(text.contains("Raw Line: {oops"));

        let text = render_entry(&Observation::done("Stream completed"));
        assert!(text.starts_with("[DONE] "));
        assert!(text.contains("\u{2713} Stream completed"));
    }

    #[test]
    fn whitespace_token_is_visible_when_escaped() {
        let text = render_entry(&Observation::token("\n"));
        assert!(text.contains("Escaped: \"\\n\""));
    }
}
