use super::types::Turn;

/// Port the rendering surface implements to follow a chat session.
///
/// The session calls these after it has released its own state, so an
/// implementation may read the session back from inside a callback.
#[cfg_attr(test, mockall::automock)]
pub trait ChatObserver: Send + Sync {
    /// A turn was added to the transcript
    fn on_turn_appended(&self, _turn: &Turn) {}

    /// The pending attachment slot became filled (`true`) or empty (`false`)
    fn on_attachment_state_changed(&self, _pending: bool) {}

    /// A request went out (`true`) or finished (`false`)
    fn on_awaiting_reply_changed(&self, _awaiting: bool) {}

    fn on_visibility_changed(&self, _open: bool) {}

    /// The input field should take focus
    fn on_focus_requested(&self) {}

    /// The image-analysis endpoint returned an image to show
    fn on_image_received(&self, _url: &str) {}

    /// Short informational text that is not part of the transcript
    fn on_notice(&self, _message: &str) {}
}

/// Observer for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChatObserver for NoopObserver {}
