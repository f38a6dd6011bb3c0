use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a chat message on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message sent to `/api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Build the message sequence for a single-turn request: an optional system
/// message followed by exactly one user message. An empty system prompt counts
/// as none.
pub fn build_messages(prompt: &str, system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

/// One entry of the model listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(default)]
    pub name: Option<String>,
    /// Newer servers repeat the identifier under `model`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ModelRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The identifier this record is known by
    pub fn identifier(&self) -> Option<&str> {
        self.name.as_deref().or(self.model.as_deref())
    }
}

/// Response of the list-models call.
///
/// The server normally wraps the records in a `models` key, but a bare array is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelListing {
    Wrapped { models: Vec<ModelRecord> },
    Bare(Vec<ModelRecord>),
}

impl ModelListing {
    pub fn records(&self) -> &[ModelRecord] {
        match self {
            ModelListing::Wrapped { models } => models,
            ModelListing::Bare(models) => models,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r.identifier())
            .map(|s| s.to_string())
            .collect()
    }

    /// Exact string match against the listed identifiers
    pub fn contains(&self, model: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.identifier() == Some(model))
    }
}

impl From<Vec<ModelRecord>> for ModelListing {
    fn from(models: Vec<ModelRecord>) -> Self {
        ModelListing::Wrapped { models }
    }
}

/// The structured chat response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    pub message: ResponseMessage,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<MessageRole>,
    pub content: String,
}

/// What came back from a chat call
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Structured(ChatResponse),
    /// The response did not carry `message.content`; holds the stringified body
    Raw(String),
}

impl ChatReply {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ChatResponse>(value.clone()) {
            Ok(response) => ChatReply::Structured(response),
            Err(_) => ChatReply::Raw(value.to_string()),
        }
    }

    /// Parse a raw response body. Bodies that are not JSON are kept verbatim.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return ChatReply::Raw(Value::Null.to_string());
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => ChatReply::Raw(body.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ChatReply::Structured(_))
    }

    pub fn into_text(self) -> String {
        match self {
            ChatReply::Structured(response) => response.message.content,
            ChatReply::Raw(text) => text,
        }
    }
}
