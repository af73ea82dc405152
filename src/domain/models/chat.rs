use serde::Serialize;

use super::{Conversation, ErrorBody, Message, Sender};

/// One history entry sent to the inference backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Sender,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.sender(),
            content: message.content().to_string(),
        }
    }
}

/// Streaming chat request for the inference backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    /// Replay `history` against the conversation's frozen model.
    pub fn streaming(conversation: &Conversation, history: &[Message]) -> Self {
        Self {
            model: conversation.model_tag().to_string(),
            messages: history.iter().map(ChatMessage::from).collect(),
            stream: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaEvent {
    pub conversation_id: i64,
    pub message_id: i64,
    pub model_tag: String,
    pub model_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaEvent {
    pub message_id: i64,
    pub delta_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoneEvent {
    pub message_id: i64,
}

/// Typed push event emitted during a chat turn.
///
/// Serializes as its bare payload; the event name travels separately via [`ChatEvent::name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatEvent {
    Meta(MetaEvent),
    Delta(DeltaEvent),
    Done(DoneEvent),
    Error(ErrorBody),
}

impl ChatEvent {
    pub fn delta(message_id: i64, text: impl Into<String>) -> Self {
        Self::Delta(DeltaEvent {
            message_id,
            delta_text: text.into(),
        })
    }

    pub fn done(message_id: i64) -> Self {
        Self::Done(DoneEvent { message_id })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Meta(_) => "meta",
            ChatEvent::Delta(_) => "delta",
            ChatEvent::Done(_) => "done",
            ChatEvent::Error(_) => "error",
        }
    }

    /// JSON payload line for this event.
    pub fn payload_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_omits_resolution_when_absent() {
        let event = ChatEvent::Meta(MetaEvent {
            conversation_id: 3,
            message_id: 9,
            model_tag: "m:1".into(),
            model_digest: "d".into(),
            resolution: None,
        });
        let value: serde_json::Value = serde_json::from_str(&event.payload_json()).unwrap();
        assert_eq!(
            value,
            json!({"conversation_id": 3, "message_id": 9, "model_tag": "m:1", "model_digest": "d"})
        );
        assert_eq!(event.name(), "meta");
    }

    #[test]
    fn delta_and_done_payloads() {
        let delta = ChatEvent::delta(4, "He");
        assert_eq!(delta.payload_json(), r#"{"message_id":4,"delta_text":"He"}"#);

        let done = ChatEvent::done(4);
        assert_eq!(done.payload_json(), r#"{"message_id":4}"#);
    }

    #[test]
    fn error_payload_carries_code() {
        let event = ChatEvent::Error(ErrorBody::new("BACKEND_ERROR", "boom").with_hint("retry"));
        let value: serde_json::Value = serde_json::from_str(&event.payload_json()).unwrap();
        assert_eq!(value["code"], "BACKEND_ERROR");
        assert_eq!(value["hint"], "retry");
        assert!(value.get("detail").is_none());
    }

    #[test]
    fn history_roles_serialize_lowercase() {
        let request = ChatRequest {
            model: "m:1".into(),
            messages: vec![ChatMessage {
                role: Sender::Assistant,
                content: "hi".into(),
            }],
            stream: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "assistant");
        assert_eq!(value["stream"], true);
    }
}
