use async_trait::async_trait;

use super::types::{BackendReply, ConversationRequest, VisionRequest};
use crate::utils::ChatError;

/// Remote assistant the chat session talks to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a text turn to the conversation endpoint
    async fn converse(&self, request: ConversationRequest) -> Result<BackendReply, ChatError>;

    /// Upload an image with a prompt to the image-analysis endpoint
    async fn analyze_image(&self, request: VisionRequest) -> Result<BackendReply, ChatError>;
}
