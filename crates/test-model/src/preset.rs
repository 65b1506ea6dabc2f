use parley_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// A scripted answer to one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events streamed by this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this kind instead of streaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ErrorKind>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a text-only response, streamed in one delta per word.
    pub fn text(text: &str) -> Self {
        Self::with_events(
            text.split_inclusive(' ')
                .map(|word| PresetEvent::MessageDelta(word.to_owned()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a response whose request fails with `kind`.
    #[inline]
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            events: vec![],
            failure: Some(kind),
        }
    }

    pub(crate) fn has_tool_call(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Let me look that up.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "call_1".to_owned(),
                name: "wikipedia".to_owned(),
                arguments: json!({ "query": "Paris" }),
            }),
        ]);

        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(serialized["events"][0]["type"], "message_delta");
        assert!(serialized.get("failure").is_none());

        let deserialized: PresetResponse =
            serde_json::from_value(serialized).unwrap();
        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_text_split() {
        let response = PresetResponse::text("It is Paris.");
        assert_eq!(
            response.events,
            vec![
                PresetEvent::MessageDelta("It ".to_owned()),
                PresetEvent::MessageDelta("is ".to_owned()),
                PresetEvent::MessageDelta("Paris.".to_owned()),
            ]
        );
        assert!(!response.has_tool_call());
    }
}
