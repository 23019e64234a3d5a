use serde_json::Value;

use super::types::BackendReply;
use crate::constants::REPLY_FIELD_PRIORITY;

/// Pull the reply text out of a backend response.
///
/// Flat fields are tried in `REPLY_FIELD_PRIORITY` order, then the
/// OpenAI-style `choices[0].message.content`. Only non-empty strings count.
pub fn extract_reply_text(body: &Value) -> Option<String> {
    REPLY_FIELD_PRIORITY
        .iter()
        .find_map(|field| non_empty_str(body.get(*field)))
        .or_else(|| non_empty_str(body.pointer("/choices/0/message/content")))
}

/// Decode a response body into the reply the session consumes
pub fn decode_reply(body: &Value) -> BackendReply {
    BackendReply {
        text: extract_reply_text(body),
        image_url: non_empty_str(body.get("image_url")),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
