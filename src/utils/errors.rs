use thiserror::Error;

/// Main error type for the chat core
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Network(err.to_string())
        }
    }
}

impl ChatError {
    /// Whether this error came from the exchange with the backend
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_) | ChatError::Http { .. } | ChatError::Decode(_)
        )
    }
}
