//! Decoding of a single NDJSON record.

use rill_types::DecodeError;
use serde_json::Value;

/// Completion statistics reported on the final (`done: true`) record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    /// Why generation stopped (`"stop"`, `"length"`, ...).
    pub done_reason: Option<String>,
    /// Prompt tokens evaluated.
    pub prompt_eval_count: Option<u64>,
    /// Tokens generated.
    pub eval_count: Option<u64>,
}

/// The useful content of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// The full JSON object.
    pub value: Value,
    /// Incremental text. Empty means no token was produced.
    pub token: String,
    /// Whether the server marked this record as the last one.
    pub done: bool,
    /// Model that produced the record, when reported.
    pub model: Option<String>,
    /// Completion statistics, present only when `done` is set.
    pub usage: Option<Usage>,
}

impl DecodedRecord {
    /// Whether this record carries a non-empty token.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Decode one line of the stream.
///
/// Blank lines yield `None`. Anything else yields either the decoded record or
/// a [`DecodeError`] carrying the line; the error is meant to be logged, not to
/// end the stream.
///
/// The token is taken from `message.content` when that is a non-empty string,
/// otherwise from the legacy `response` field, otherwise it is empty.
#[must_use]
pub fn decode_record(line: &str) -> Option<Result<DecodedRecord, DecodeError>> {
    if line.trim().is_empty() {
        return None;
    }
    Some(decode_object(line))
}

fn decode_object(line: &str) -> Result<DecodedRecord, DecodeError> {
    let value: Value = serde_json::from_str(line).map_err(|source| DecodeError::Json {
        line: line.to_string(),
        source,
    })?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject {
            line: line.to_string(),
            found: kind_name(&value),
        });
    }

    let token = value["message"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .or_else(|| value["response"].as_str())
        .unwrap_or_default()
        .to_string();

    let done = value["done"].as_bool().unwrap_or(false);
    let model = value["model"].as_str().map(str::to_string);

    let usage = done.then(|| Usage {
        done_reason: value["done_reason"].as_str().map(str::to_string),
        prompt_eval_count: value["prompt_eval_count"].as_u64(),
        eval_count: value["eval_count"].as_u64(),
    });

    Ok(DecodedRecord {
        value,
        token,
        done,
        model,
        usage,
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
