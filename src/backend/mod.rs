// Gateway module for backend - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod http;
mod reply;
mod traits;
mod types;

// Public re-exports - the ONLY way to access backend functionality
pub use http::HttpChatBackend;
pub use reply::{decode_reply, extract_reply_text};
pub use traits::ChatBackend;
pub use types::{BackendReply, ConversationRequest, VisionRequest};

#[cfg(test)]
pub use traits::MockChatBackend;
