use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use std::path::Path;

use crate::constants::{CHAT_ERROR_MARKER, IMAGE_ERROR_MARKER};
use crate::utils::ChatError;

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Internal marker attached to an assistant turn that stands in for a failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMarker {
    ChatFailed,
    ImageFailed,
}

impl TurnMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatFailed => CHAT_ERROR_MARKER,
            Self::ImageFailed => IMAGE_ERROR_MARKER,
        }
    }
}

/// One message of the conversation.
///
/// Turns are immutable once built; the wire form is `{"role", "content", "ts"}`
/// with `ts` in epoch milliseconds. A marked turn goes out with the marker as
/// its content, so the backend never sees the apology as its own words.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(skip)]
    marker: Option<TurnMarker>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), None)
    }

    /// Assistant turn shown in place of a reply that never arrived
    pub fn failure(content: impl Into<String>, marker: TurnMarker) -> Self {
        Self::new(Role::Assistant, content.into(), Some(marker))
    }

    fn new(role: Role, content: String, marker: Option<TurnMarker>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
            marker,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn marker(&self) -> Option<TurnMarker> {
        self.marker
    }

    pub fn is_error(&self) -> bool {
        self.marker.is_some()
    }
}

impl Serialize for Turn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let content = match self.marker {
            Some(marker) => marker.as_str(),
            None => self.content.as_str(),
        };
        let mut state = serializer.serialize_struct("Turn", 3)?;
        state.serialize_field("role", &self.role)?;
        state.serialize_field("content", content)?;
        state.serialize_field("ts", &self.timestamp.timestamp_millis())?;
        state.end()
    }
}

/// An image queued to go out with the next turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    file_name: String,
    mime: String,
    bytes: Bytes,
}

impl ImageAttachment {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let mut file_name = file_name.into();
        if file_name.trim().is_empty() {
            file_name = "image.png".to_string();
        }
        Self {
            file_name,
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, mime, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
