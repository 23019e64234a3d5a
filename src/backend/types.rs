use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chat::{ImageAttachment, Turn};

/// JSON body for the conversation endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    pub message: String,
    pub session_id: String,
    pub history: Vec<Turn>,
    /// Client clock at send time, ISO-8601
    pub timestamp: DateTime<Utc>,
}

impl ConversationRequest {
    pub fn new(message: String, session_id: String, history: Vec<Turn>) -> Self {
        Self {
            message,
            session_id,
            history,
            timestamp: Utc::now(),
        }
    }
}

/// Multipart upload for the image-analysis endpoint
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub image: ImageAttachment,
    pub prompt: String,
    pub session_id: String,
    pub history: Vec<Turn>,
}

/// What the session needs out of a backend reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendReply {
    /// Reply text, if any of the accepted fields carried one
    pub text: Option<String>,
    /// Image returned by the vision endpoint
    pub image_url: Option<String>,
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image_url: None,
        }
    }
}
