//! Assistant chat payloads: conversations, messages, and tool calls.
//!
//! The backend agent mutates tasks on the user's behalf; the client
//! displays the tool calls it reports but never interprets them. Task
//! state changed by the agent is picked up on the next list refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human user.
    User,
    /// The backend agent.
    Agent,
}

/// Outcome of a tool invocation reported by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Invocation accepted but not yet settled.
    Pending,
    /// Invocation ran to completion.
    Completed,
    /// Invocation failed.
    Failed,
}

/// A tool invoked by the agent, with its input and (once settled) output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name (e.g. `"create_task"`).
    pub name: String,
    /// Tool input as reported by the agent.
    pub input: Value,
    /// Tool output, absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Invocation status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolStatus>,
}

/// Payload for `POST /api/v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Conversation to continue; `None` starts a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Response from `POST /api/v1/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Conversation the exchange belongs to (newly created if the
    /// request carried none).
    pub conversation_id: String,
    /// Identifier of the agent's reply message.
    pub message_id: String,
    /// Echo of the user's message.
    pub user_message: String,
    /// The agent's reply text.
    pub agent_response: String,
    /// Tools the agent invoked while handling the message.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// When the exchange was recorded.
    pub created_at: DateTime<Utc>,
}

/// Conversation metadata, returned by `GET /api/v1/conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-assigned conversation identifier.
    pub id: String,
    /// Owning user's identifier.
    pub user_id: String,
    /// Display title (derived from the first message).
    pub title: String,
    /// When the conversation started.
    pub created_at: DateTime<Utc>,
    /// When the last message was added.
    pub updated_at: DateTime<Utc>,
    /// Number of messages, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Server-assigned message identifier.
    pub id: String,
    /// Conversation this message belongs to.
    pub conversation_id: String,
    /// Owning user's identifier.
    pub user_id: String,
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Tool calls attached to an agent message.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

/// Paginated message list, returned by
/// `GET /api/v1/conversations/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListResponse {
    /// The requested page of messages, oldest first.
    pub data: Vec<MessageRecord>,
    /// Total number of messages in the conversation.
    pub total: u64,
    /// Page size that was applied.
    pub limit: u32,
    /// Page offset that was applied.
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Agent).unwrap(), "\"agent\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn chat_request_omits_absent_conversation() {
        let req = ChatRequest {
            message: "add buy milk".to_string(),
            conversation_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("conversation_id"));
    }

    #[test]
    fn chat_response_defaults_empty_tool_calls() {
        let json = r#"{
            "conversation_id": "c1",
            "message_id": "m1",
            "user_message": "hello",
            "agent_response": "hi",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(resp.tool_calls.is_empty());
    }

    #[test]
    fn tool_call_round_trips_with_output() {
        let call = ToolCall {
            name: "create_task".to_string(),
            input: serde_json::json!({"title": "Buy milk"}),
            output: Some(serde_json::json!({"id": "t1"})),
            status: Some(ToolStatus::Completed),
        };
        let json = serde_json::to_string(&call).unwrap();
        let back: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(call, back);
    }
}
