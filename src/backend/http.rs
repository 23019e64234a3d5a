use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::reply::decode_reply;
use super::traits::ChatBackend;
use super::types::{BackendReply, ConversationRequest, VisionRequest};
use crate::app::BackendConfig;
use crate::constants::{CHAT_ENDPOINT_PATH, VISION_UPLOAD_PATH};
use crate::utils::ChatError;

/// Backend reached over HTTP: JSON for text turns, multipart for images
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ChatError> {
        let base_url = config.normalized_base_url();
        if base_url.is_empty() {
            return Err(ChatError::Config("backend base_url is empty".to_string()));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_ENDPOINT_PATH)
    }

    pub fn vision_url(&self) -> String {
        format!("{}{}", self.base_url, VISION_UPLOAD_PATH)
    }

    /// Non-2xx becomes `Http`, an unreadable body becomes `Decode`
    async fn read_reply(response: Response) -> Result<BackendReply, ChatError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(decode_reply(&body))
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn converse(&self, request: ConversationRequest) -> Result<BackendReply, ChatError> {
        let url = self.chat_url();
        debug!(
            url = %url,
            session = %request.session_id,
            history = request.history.len(),
            "chat request"
        );

        let response = self.client.post(&url).json(&request).send().await?;
        Self::read_reply(response).await
    }

    async fn analyze_image(&self, request: VisionRequest) -> Result<BackendReply, ChatError> {
        let url = self.vision_url();
        debug!(
            url = %url,
            session = %request.session_id,
            size = request.image.len(),
            mime = request.image.mime(),
            "vision upload"
        );

        let history = serde_json::to_string(&request.history)
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        let image = Part::bytes(request.image.bytes().to_vec())
            .file_name(request.image.file_name().to_string())
            .mime_str(request.image.mime())
            .map_err(|e| ChatError::InvalidAttachment(e.to_string()))?;

        let form = Form::new()
            .part("image", image)
            .text("prompt", request.prompt)
            .text("sessionId", request.session_id)
            .text("history", history);

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_reply(response).await
    }
}
