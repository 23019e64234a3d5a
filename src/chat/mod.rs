// Gateway module for chat - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod history;
mod observer;
mod session;
mod types;

// Public re-exports - the ONLY way to access chat functionality
pub use history::TurnHistory;
pub use observer::{ChatObserver, NoopObserver};
pub use session::{generate_session_id, ChatSession, SendOutcome};
pub use types::{ImageAttachment, Role, Turn, TurnMarker};
