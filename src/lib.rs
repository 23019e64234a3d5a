pub mod app;
pub mod backend;
pub mod chat;
pub mod cli;
pub mod constants;
pub mod runtime;
pub mod utils;

pub use app::{load_config, Config};
pub use backend::{ChatBackend, HttpChatBackend};
pub use chat::{ChatObserver, ChatSession, ImageAttachment, SendOutcome, Turn};
pub use utils::ChatError;
