//! Wire payload types for the generate-stream endpoint and the mapping from
//! raw SSE frames to typed events.

use serde_json::{Map, Value};

use crate::sse::SseFrame;

/// Default event kind when a frame carries no `event:` line.
const DEFAULT_EVENT_KIND: &str = "message";

/// Default message for `error` frames that carry no `message` field.
const DEFAULT_ERROR_MESSAGE: &str = "error";

/// Request body for `POST /api/jd/generate/stream`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerateRequest {
    pub company_code: String,
    pub job_code: String,
    /// Output language (server defaults to `ko` when omitted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style_name: Option<String>,
    /// Inline knowledge payload; skips the server-side lookup when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_override: Option<Value>,
    /// Inline style payload; skips the server-side lookup when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_override: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerateRequest {
    /// Creates a request for the given company/job pair.
    pub fn new(company_code: impl Into<String>, job_code: impl Into<String>) -> Self {
        Self {
            company_code: company_code.into(),
            job_code: job_code.into(),
            ..Self::default()
        }
    }
}

/// Payload of the `start` event.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StartPayload {
    /// Server-assigned request id (empty when the server omits it).
    #[serde(default)]
    pub request_id: String,
    /// Any additional metadata fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of the `end` event.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EndPayload {
    /// Title of the generated draft, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Any additional metadata fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed event decoded from one SSE frame.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateEvent {
    Started(StartPayload),
    Delta { text: String },
    Ended(EndPayload),
    Failed { message: String },
}

/// Maps one frame to a typed event.
///
/// Returns `None` for frames that must be dropped without aborting the
/// stream: unrecognized event kinds, payloads that fail to parse as JSON,
/// and deltas with empty text.
pub(crate) fn map_frame(frame: &SseFrame) -> Option<GenerateEvent> {
    let kind = frame.event.as_deref().unwrap_or(DEFAULT_EVENT_KIND);
    let payload: Option<Value> = if frame.data.is_empty() {
        None
    } else {
        match serde_json::from_str(&frame.data) {
            Ok(value) => Some(value),
            // Malformed payloads drop this single event, not the stream.
            Err(_) => return None,
        }
    };

    match kind {
        "start" => {
            let payload = payload.unwrap_or(Value::Null);
            let parsed = serde_json::from_value(payload).unwrap_or_default();
            Some(GenerateEvent::Started(parsed))
        }
        "delta" => {
            let text = payload.as_ref().and_then(extract_delta_text)?;
            if text.is_empty() {
                return None;
            }
            Some(GenerateEvent::Delta { text })
        }
        "end" => {
            let payload = payload.unwrap_or(Value::Null);
            let parsed = serde_json::from_value(payload).unwrap_or_default();
            Some(GenerateEvent::Ended(parsed))
        }
        "error" => {
            let message = payload
                .as_ref()
                .and_then(|p| p.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string();
            Some(GenerateEvent::Failed { message })
        }
        _ => None,
    }
}

/// Extracts delta text, preferring `text` over `delta` when both are present.
fn extract_delta_text(payload: &Value) -> Option<String> {
    match payload.get("text") {
        Some(value) => value.as_str().map(ToOwned::to_owned),
        None => payload
            .get("delta")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
    }
}
