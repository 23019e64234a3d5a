use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::history::TurnHistory;
use super::observer::ChatObserver;
use super::types::{ImageAttachment, Turn, TurnMarker};
use crate::app::ChatConfig;
use crate::backend::{ChatBackend, ConversationRequest, VisionRequest};
use crate::constants::{
    CHAT_FAILURE_REPLY, DEFAULT_CHAT_REPLY, DEFAULT_IMAGE_REPLY, HISTORY_CLEARED_NOTICE,
    IMAGE_FAILURE_REPLY, INVALID_ATTACHMENT_NOTICE, SESSION_ID_PREFIX, SESSION_ID_SUFFIX_LEN,
};
use crate::utils::ChatError;

/// Result of a `send_turn` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// A reply is still pending; nothing was sent
    Busy,
    /// No text and no attachment; nothing was sent
    Empty,
    /// The backend answered with this turn
    Replied(Turn),
    /// The exchange failed and this apology turn was recorded
    Failed(Turn),
}

impl SendOutcome {
    /// Whether a request actually went out
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Replied(_) | Self::Failed(_))
    }

    /// The assistant turn produced by the exchange
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            Self::Replied(turn) | Self::Failed(turn) => Some(turn),
            Self::Busy | Self::Empty => None,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    history: TurnHistory,
    is_open: bool,
    awaiting_reply: bool,
    pending_attachment: Option<ImageAttachment>,
}

/// One conversation between the dashboard user and the remote assistant.
///
/// Holds the transcript, the open/closed flag, and a single pending image.
/// The state lock is never held across an `.await` or an observer call, so the
/// session can be shared behind an `Arc` and read from inside callbacks. At most
/// one request is in flight; `send_turn` calls made meanwhile return
/// [`SendOutcome::Busy`].
pub struct ChatSession {
    session_id: String,
    backend: Arc<dyn ChatBackend>,
    observer: Arc<dyn ChatObserver>,
    default_image_prompt: String,
    state: Mutex<SessionState>,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        observer: Arc<dyn ChatObserver>,
        config: &ChatConfig,
    ) -> Self {
        let session_id = generate_session_id();
        let history = TurnHistory::new(config.max_history);
        info!(session = %session_id, max_history = history.capacity(), "chat session created");

        Self {
            session_id,
            backend,
            observer,
            default_image_prompt: config.default_image_prompt.clone(),
            state: Mutex::new(SessionState {
                history,
                is_open: false,
                awaiting_reply: false,
                pending_attachment: None,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_open
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state.lock().awaiting_reply
    }

    pub fn has_pending_attachment(&self) -> bool {
        self.state.lock().pending_attachment.is_some()
    }

    /// Copy of the transcript, oldest first
    pub fn history(&self) -> Vec<Turn> {
        self.state.lock().history.snapshot()
    }

    pub fn open(&self) {
        if self.set_open(true) {
            self.observer.on_visibility_changed(true);
            self.observer.on_focus_requested();
        }
    }

    pub fn close(&self) {
        if self.set_open(false) {
            self.observer.on_visibility_changed(false);
        }
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Returns true if the flag changed
    fn set_open(&self, open: bool) -> bool {
        let mut state = self.state.lock();
        if state.is_open == open {
            return false;
        }
        state.is_open = open;
        true
    }

    /// Queue an image for the next turn, replacing any queued one.
    ///
    /// Anything that is not `image/*` is rejected and the slot is left as it was.
    pub fn attach_image(&self, attachment: ImageAttachment) -> Result<(), ChatError> {
        if !attachment.is_image() {
            warn!(
                file = attachment.file_name(),
                mime = attachment.mime(),
                "rejected non-image attachment"
            );
            self.observer.on_notice(INVALID_ATTACHMENT_NOTICE);
            return Err(ChatError::InvalidAttachment(format!(
                "{} ({})",
                attachment.file_name(),
                attachment.mime()
            )));
        }

        debug!(file = attachment.file_name(), size = attachment.len(), "attachment queued");
        self.state.lock().pending_attachment = Some(attachment);
        self.observer.on_attachment_state_changed(true);
        Ok(())
    }

    /// Drop the queued image without sending it. Returns true if one was queued.
    pub fn clear_attachment(&self) -> bool {
        let removed = self.state.lock().pending_attachment.take().is_some();
        if removed {
            self.observer.on_attachment_state_changed(false);
        }
        removed
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
        info!(session = %self.session_id, "chat history cleared");
        self.observer.on_notice(HISTORY_CLEARED_NOTICE);
    }

    /// Send the user's text, plus the pending image if there is one.
    ///
    /// The user turn is recorded before the request goes out and stays even
    /// if the exchange fails. Failures are turned into an apology turn; there
    /// is no retry.
    pub async fn send_turn(&self, text: &str) -> SendOutcome {
        let message = text.trim().to_string();

        let (user_turn, attachment, history) = {
            let mut state = self.state.lock();
            if state.awaiting_reply {
                debug!(session = %self.session_id, "send rejected, reply pending");
                return SendOutcome::Busy;
            }
            if message.is_empty() && state.pending_attachment.is_none() {
                return SendOutcome::Empty;
            }

            let user_turn = if message.is_empty() {
                None
            } else {
                let turn = Turn::user(message.clone());
                state.history.push(turn.clone());
                Some(turn)
            };
            state.awaiting_reply = true;
            // taken here so the slot is empty before any request is issued
            let attachment = state.pending_attachment.take();
            (user_turn, attachment, state.history.snapshot())
        };
        let mut awaiting = AwaitingGuard::new(self);

        if let Some(turn) = &user_turn {
            self.observer.on_turn_appended(turn);
        }
        self.observer.on_awaiting_reply_changed(true);

        let outcome = match attachment {
            Some(image) => {
                self.observer.on_attachment_state_changed(false);
                self.exchange_image(image, message, history).await
            }
            None => self.exchange_text(message, history).await,
        };

        awaiting.disarm();
        {
            let mut state = self.state.lock();
            if let Some(turn) = outcome.turn() {
                state.history.push(turn.clone());
            }
            state.awaiting_reply = false;
        }
        if let Some(turn) = outcome.turn() {
            self.observer.on_turn_appended(turn);
        }
        self.observer.on_awaiting_reply_changed(false);

        outcome
    }

    async fn exchange_text(&self, message: String, history: Vec<Turn>) -> SendOutcome {
        let request = ConversationRequest::new(message, self.session_id.clone(), history);

        match self.backend.converse(request).await {
            Ok(reply) => SendOutcome::Replied(Turn::assistant(
                reply.text.unwrap_or_else(|| DEFAULT_CHAT_REPLY.to_string()),
            )),
            Err(err) => {
                warn!(
                    session = %self.session_id,
                    error = %err,
                    transport = err.is_transport(),
                    "chat request failed"
                );
                SendOutcome::Failed(Turn::failure(CHAT_FAILURE_REPLY, TurnMarker::ChatFailed))
            }
        }
    }

    async fn exchange_image(
        &self,
        image: ImageAttachment,
        message: String,
        history: Vec<Turn>,
    ) -> SendOutcome {
        let prompt = if message.is_empty() {
            self.default_image_prompt.clone()
        } else {
            message
        };
        let request = VisionRequest {
            image,
            prompt,
            session_id: self.session_id.clone(),
            history,
        };

        match self.backend.analyze_image(request).await {
            Ok(reply) => {
                if let Some(url) = &reply.image_url {
                    self.observer.on_image_received(url);
                }
                SendOutcome::Replied(Turn::assistant(
                    reply.text.unwrap_or_else(|| DEFAULT_IMAGE_REPLY.to_string()),
                ))
            }
            Err(err) => {
                warn!(
                    session = %self.session_id,
                    error = %err,
                    transport = err.is_transport(),
                    "image analysis failed"
                );
                SendOutcome::Failed(Turn::failure(IMAGE_FAILURE_REPLY, TurnMarker::ImageFailed))
            }
        }
    }
}

/// Clears the awaiting flag if `send_turn` is dropped or unwinds mid-exchange
struct AwaitingGuard<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl<'a> AwaitingGuard<'a> {
    fn new(session: &'a ChatSession) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.session.state.lock().awaiting_reply = false;
        warn!(session = %self.session.session_id, "exchange abandoned before completion");
        if !std::thread::panicking() {
            self.session.observer.on_awaiting_reply_changed(false);
        }
    }
}

/// `session_<epoch ms>_<9 lowercase alphanumerics>`
pub fn generate_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}",
        SESSION_ID_PREFIX,
        Utc::now().timestamp_millis(),
        &suffix[..SESSION_ID_SUFFIX_LEN]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendReply, MockChatBackend};
    use crate::chat::observer::MockChatObserver;
    use crate::chat::{NoopObserver, Role};
    use async_trait::async_trait;
    use mockall::{predicate::eq, Sequence};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Turn(Role, String),
        Attachment(bool),
        Awaiting(bool),
        Visible(bool),
        Focus,
        Image(String),
        Notice(String),
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl ChatObserver for RecordingObserver {
        fn on_turn_appended(&self, turn: &Turn) {
            self.events
                .lock()
                .push(Event::Turn(turn.role(), turn.content().to_string()));
        }
        fn on_attachment_state_changed(&self, pending: bool) {
            self.events.lock().push(Event::Attachment(pending));
        }
        fn on_awaiting_reply_changed(&self, awaiting: bool) {
            self.events.lock().push(Event::Awaiting(awaiting));
        }
        fn on_visibility_changed(&self, open: bool) {
            self.events.lock().push(Event::Visible(open));
        }
        fn on_focus_requested(&self) {
            self.events.lock().push(Event::Focus);
        }
        fn on_image_received(&self, url: &str) {
            self.events.lock().push(Event::Image(url.to_string()));
        }
        fn on_notice(&self, message: &str) {
            self.events.lock().push(Event::Notice(message.to_string()));
        }
    }

    /// Backend whose replies wait until the test releases them
    #[derive(Default)]
    struct GatedBackend {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn converse(&self, _request: ConversationRequest) -> Result<BackendReply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(BackendReply::text("pronto"))
        }

        async fn analyze_image(&self, _request: VisionRequest) -> Result<BackendReply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(BackendReply::default())
        }
    }

    fn session_with(backend: impl ChatBackend + 'static) -> (ChatSession, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let session = ChatSession::new(Arc::new(backend), observer.clone(), &ChatConfig::default());
        (session, observer)
    }

    fn png(name: &str) -> ImageAttachment {
        ImageAttachment::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn contents(session: &ChatSession) -> Vec<(Role, String)> {
        session
            .history()
            .iter()
            .map(|t| (t.role(), t.content().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_text_turn_success() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_converse()
            .withf(|req| {
                req.message == "Qual o preço?"
                    && req.session_id.starts_with("session_")
                    && req.history.len() == 1
                    && req.history[0].content() == "Qual o preço?"
            })
            .times(1)
            .returning(|_| Ok(BackendReply::text("O plano custa R$ 99,00.")));

        let (session, observer) = session_with(backend);
        let outcome = session.send_turn("  Qual o preço?  ").await;

        assert!(matches!(outcome, SendOutcome::Replied(_)));
        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "Qual o preço?".to_string()),
                (Role::Assistant, "O plano custa R$ 99,00.".to_string()),
            ]
        );
        assert!(!session.is_awaiting_reply());
        assert_eq!(
            observer.events(),
            vec![
                Event::Turn(Role::User, "Qual o preço?".to_string()),
                Event::Awaiting(true),
                Event::Turn(Role::Assistant, "O plano custa R$ 99,00.".to_string()),
                Event::Awaiting(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_reply_text_defaults_to_ok() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_converse()
            .returning(|_| Ok(BackendReply::default()));

        let (session, _) = session_with(backend);
        let outcome = session.send_turn("oi").await;

        assert_eq!(outcome.turn().map(|t| t.content()), Some("OK."));
    }

    #[tokio::test]
    async fn test_network_failure_records_apology() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_converse()
            .times(1)
            .returning(|_| Err(ChatError::Network("connection refused".to_string())));

        let (session, _) = session_with(backend);
        let outcome = session.send_turn("Qual o preço?").await;

        assert!(matches!(outcome, SendOutcome::Failed(_)));
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content(), "Qual o preço?");
        let last = history.last().unwrap();
        assert_eq!(last.role(), Role::Assistant);
        assert_eq!(
            last.content(),
            "Desculpe, ocorreu um erro. Tente novamente em alguns instantes."
        );
        assert_eq!(last.marker(), Some(TurnMarker::ChatFailed));
        assert!(!session.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_http_status_failure_allows_resend() {
        let mut backend = MockChatBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_converse()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(ChatError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            });
        backend
            .expect_converse()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(BackendReply::text("Agora sim.")));

        let (session, _) = session_with(backend);
        assert!(matches!(session.send_turn("oi").await, SendOutcome::Failed(_)));
        assert!(matches!(session.send_turn("oi").await, SendOutcome::Replied(_)));
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_text_without_attachment_is_noop() {
        // no expectations: any backend call would panic
        let (session, observer) = session_with(MockChatBackend::new());

        assert_eq!(session.send_turn("   ").await, SendOutcome::Empty);
        assert!(session.history().is_empty());
        assert!(observer.events().is_empty());
        assert!(!session.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_send_while_awaiting_is_rejected() {
        let backend = Arc::new(GatedBackend::default());
        let observer = Arc::new(RecordingObserver::default());
        let session = Arc::new(ChatSession::new(
            backend.clone(),
            observer.clone(),
            &ChatConfig::default(),
        ));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.send_turn("primeira").await }
        });
        while !session.is_awaiting_reply() {
            tokio::task::yield_now().await;
        }

        let history_before = session.history();
        assert_eq!(session.send_turn("segunda").await, SendOutcome::Busy);
        assert_eq!(session.history(), history_before);

        backend.release.notify_one();
        let outcome = first.await.unwrap();

        assert!(matches!(outcome, SendOutcome::Replied(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "primeira".to_string()),
                (Role::Assistant, "pronto".to_string()),
            ]
        );
        assert!(!session.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_history_never_exceeds_cap() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_converse()
            .withf(|req| req.history.len() <= 20)
            .returning(|req| Ok(BackendReply::text(format!("eco {}", req.message))));

        let (session, _) = session_with(backend);
        for i in 0..15 {
            session.send_turn(&format!("pergunta {}", i)).await;
            assert!(session.history().len() <= 20);
        }

        let history = contents(&session);
        assert_eq!(history.len(), 20);
        // 30 turns produced, the first 10 (questions 0..4) are gone
        assert_eq!(history[0], (Role::User, "pergunta 5".to_string()));
        assert_eq!(history[19], (Role::Assistant, "eco pergunta 14".to_string()));
    }

    /// Backend whose first request never completes
    #[derive(Default)]
    struct StallFirstBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for StallFirstBackend {
        async fn converse(&self, request: ConversationRequest) -> Result<BackendReply, ChatError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(BackendReply::text(format!("eco {}", request.message)))
        }

        async fn analyze_image(&self, _request: VisionRequest) -> Result<BackendReply, ChatError> {
            Ok(BackendReply::default())
        }
    }

    #[tokio::test]
    async fn test_abandoned_send_releases_session() {
        let (session, observer) = session_with(StallFirstBackend::default());

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), session.send_turn("a")).await;
        assert!(timed_out.is_err());
        assert!(!session.is_awaiting_reply());
        assert_eq!(
            observer.events(),
            vec![
                Event::Turn(Role::User, "a".to_string()),
                Event::Awaiting(true),
                Event::Awaiting(false),
            ]
        );

        let outcome = session.send_turn("b").await;
        assert_eq!(outcome.turn().map(|t| t.content()), Some("eco b"));
        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "a".to_string()),
                (Role::User, "b".to_string()),
                (Role::Assistant, "eco b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_turn_goes_back_as_marker() {
        let mut backend = MockChatBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_converse()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ChatError::Network("reset".to_string())));
        backend
            .expect_converse()
            .withf(|req| {
                let body = serde_json::to_value(req).unwrap();
                body["history"][1]["content"] == "[erro]"
                    && body["history"][2]["content"] == "de novo"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(BackendReply::text("ok")));

        let (session, _) = session_with(backend);
        session.send_turn("oi").await;
        assert_eq!(
            session.history()[1].content(),
            "Desculpe, ocorreu um erro. Tente novamente em alguns instantes."
        );
        assert!(matches!(session.send_turn("de novo").await, SendOutcome::Replied(_)));
    }

    #[test]
    fn test_non_image_attachment_rejected() {
        let (session, observer) = session_with(MockChatBackend::new());

        let err = session
            .attach_image(ImageAttachment::new("planilha.csv", "text/csv", vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidAttachment(_)));
        assert!(!session.has_pending_attachment());

        session.attach_image(png("foto.png")).unwrap();
        assert!(session
            .attach_image(ImageAttachment::new("doc.pdf", "application/pdf", vec![1u8]))
            .is_err());
        assert!(session.has_pending_attachment());

        assert_eq!(
            observer.events(),
            vec![
                Event::Notice("Arquivo inválido. Selecione uma imagem.".to_string()),
                Event::Attachment(true),
                Event::Notice("Arquivo inválido. Selecione uma imagem.".to_string()),
            ]
        );
    }

    #[test]
    fn test_attach_replaces_and_clear_drops() {
        let (session, observer) = session_with(MockChatBackend::new());

        session.attach_image(png("a.png")).unwrap();
        session.attach_image(png("b.png")).unwrap();
        assert!(session.has_pending_attachment());

        assert!(session.clear_attachment());
        assert!(!session.clear_attachment());
        assert!(!session.has_pending_attachment());
        assert!(session.history().is_empty());
        assert_eq!(
            observer.events(),
            vec![
                Event::Attachment(true),
                Event::Attachment(true),
                Event::Attachment(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_replaced_attachment_is_the_one_sent() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_analyze_image()
            .withf(|req| req.image.file_name() == "b.png")
            .times(1)
            .returning(|_| Ok(BackendReply::text("Foto b")));

        let (session, _) = session_with(backend);
        session.attach_image(png("a.png")).unwrap();
        session.attach_image(png("b.png")).unwrap();

        assert!(session.send_turn("").await.is_accepted());
    }

    #[tokio::test]
    async fn test_attachment_cleared_before_upload() {
        let mut seq = Sequence::new();
        let mut observer = MockChatObserver::new();
        let mut backend = MockChatBackend::new();

        observer
            .expect_on_attachment_state_changed()
            .with(eq(true))
            .times(1)
            .return_const(());
        observer.expect_on_turn_appended().times(2).return_const(());
        observer.expect_on_awaiting_reply_changed().times(2).return_const(());
        observer
            .expect_on_attachment_state_changed()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_analyze_image()
            .withf(|req| {
                req.prompt == "O que é isso?"
                    && req.image.file_name() == "vitrine.png"
                    && req.history.last().map(|t| t.content()) == Some("O que é isso?")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(BackendReply {
                    text: Some("Uma vitrine de sapatos.".to_string()),
                    image_url: Some("https://cdn.example.com/anotada.png".to_string()),
                })
            });
        observer
            .expect_on_image_received()
            .withf(|url| url.to_string() == "https://cdn.example.com/anotada.png")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let session = ChatSession::new(
            Arc::new(backend),
            Arc::new(observer),
            &ChatConfig::default(),
        );
        session.attach_image(png("vitrine.png")).unwrap();
        let outcome = session.send_turn("O que é isso?").await;

        assert_eq!(
            outcome.turn().map(|t| t.content()),
            Some("Uma vitrine de sapatos.")
        );
        assert!(!session.has_pending_attachment());
    }

    #[tokio::test]
    async fn test_image_without_text_uses_default_prompt() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_analyze_image()
            .withf(|req| req.prompt == "Analise a imagem de forma objetiva." && req.history.is_empty())
            .times(1)
            .returning(|_| Ok(BackendReply::default()));

        let (session, observer) = session_with(backend);
        session.attach_image(png("foto.png")).unwrap();
        let outcome = session.send_turn("").await;

        assert_eq!(outcome.turn().map(|t| t.content()), Some("Imagem recebida."));
        assert_eq!(
            contents(&session),
            vec![(Role::Assistant, "Imagem recebida.".to_string())]
        );
        assert_eq!(
            observer.events(),
            vec![
                Event::Attachment(true),
                Event::Awaiting(true),
                Event::Attachment(false),
                Event::Turn(Role::Assistant, "Imagem recebida.".to_string()),
                Event::Awaiting(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_image_failure_records_marker() {
        let mut backend = MockChatBackend::new();
        backend.expect_analyze_image().times(1).returning(|_| {
            Err(ChatError::Http {
                status: 500,
                body: String::new(),
            })
        });

        let (session, _) = session_with(backend);
        session.attach_image(png("foto.png")).unwrap();
        let outcome = session.send_turn("Descreva").await;

        let turn = outcome.turn().unwrap();
        assert_eq!(turn.content(), "Erro ao analisar a imagem.");
        assert_eq!(turn.marker(), Some(TurnMarker::ImageFailed));
        assert!(!session.has_pending_attachment());
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.history()[0].content(), "Descreva");
    }

    #[tokio::test]
    async fn test_clear_history_keeps_visibility() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_converse()
            .returning(|_| Ok(BackendReply::text("ok")));

        let (session, observer) = session_with(backend);
        session.open();
        session.send_turn("um").await;
        session.send_turn("dois").await;

        session.clear_history();
        assert!(session.history().is_empty());
        assert!(session.is_open());

        session.clear_history();
        assert!(session.history().is_empty());
        assert_eq!(
            observer.events().last(),
            Some(&Event::Notice("Memória do chat limpa.".to_string()))
        );
    }

    #[test]
    fn test_visibility_transitions_are_idempotent() {
        let (session, observer) = session_with(NoopBackend);

        assert!(!session.is_open());
        session.close();
        session.open();
        session.open();
        assert!(session.is_open());
        session.toggle();
        assert!(!session.is_open());
        session.toggle();
        assert!(session.is_open());

        assert_eq!(
            observer.events(),
            vec![
                Event::Visible(true),
                Event::Focus,
                Event::Visible(false),
                Event::Visible(true),
                Event::Focus,
            ]
        );
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.splitn(3, '_').collect();

        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(generate_session_id(), id);
    }

    #[test]
    fn test_headless_observer() {
        let session = ChatSession::new(
            Arc::new(NoopBackend),
            Arc::new(NoopObserver),
            &ChatConfig {
                max_history: 4,
                ..Default::default()
            },
        );
        session.toggle();
        assert!(session.is_open());
        assert_eq!(session.session_id().len(), "session_".len() + 13 + 1 + 9);
    }

    struct NoopBackend;

    #[async_trait]
    impl ChatBackend for NoopBackend {
        async fn converse(&self, _request: ConversationRequest) -> Result<BackendReply, ChatError> {
            Ok(BackendReply::default())
        }

        async fn analyze_image(&self, _request: VisionRequest) -> Result<BackendReply, ChatError> {
            Ok(BackendReply::default())
        }
    }
}
