//! Assistant chat: conversational task management via the backend agent.
//!
//! The agent runs server-side and mutates tasks on the user's behalf;
//! this module only ships messages and pages through history. Tool
//! calls in the reply are display material — task state changed by the
//! agent shows up on the next list refresh, not here.

use std::sync::Arc;

use taskdeck_api::chat::{ChatResponse, Conversation, MessageListResponse};

use crate::api::{ApiClient, ApiError};

/// Default page size when fetching conversation history.
pub const DEFAULT_HISTORY_PAGE: u32 = 50;

/// Client for the assistant chat endpoints.
pub struct Assistant {
    api: Arc<ApiClient>,
}

impl Assistant {
    /// Creates an assistant client sharing the given API client.
    #[must_use]
    pub const fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Sends a message, starting a new conversation when
    /// `conversation_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn send(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        self.api.chat(message, conversation_id).await
    }

    /// Lists the caller's conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.api.conversations().await
    }

    /// Fetches one page of a conversation's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn history(
        &self,
        conversation_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<MessageListResponse, ApiError> {
        self.api
            .conversation_messages(conversation_id, limit, offset)
            .await
    }
}
