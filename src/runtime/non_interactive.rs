use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::{
    app::ChatConfig,
    backend::ChatBackend,
    chat::{ChatObserver, ChatSession, ImageAttachment, SendOutcome},
    cli::OutputFormat,
};

/// Result of a non-interactive run
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonInteractiveResult {
    pub session_id: String,
    /// The prompt that was sent
    pub prompt: String,
    /// Name of the attached image, if any
    pub image: Option<String>,
    /// The assistant's reply, or the apology shown on failure
    pub response: String,
    /// Images the backend sent back
    pub image_urls: Vec<String>,
    pub failed: bool,
    pub duration_ms: u128,
}

/// Keeps returned image URLs for the final report
#[derive(Default)]
struct CaptureObserver {
    image_urls: Mutex<Vec<String>>,
}

impl ChatObserver for CaptureObserver {
    fn on_image_received(&self, url: &str) {
        self.image_urls.lock().push(url.to_string());
    }
}

/// Sends a single turn and reports the outcome
pub struct NonInteractiveRunner {
    session: ChatSession,
    observer: Arc<CaptureObserver>,
}

impl NonInteractiveRunner {
    pub fn new(backend: Arc<dyn ChatBackend>, config: &ChatConfig) -> Self {
        let observer = Arc::new(CaptureObserver::default());
        let session = ChatSession::new(backend, observer.clone(), config);
        Self { session, observer }
    }

    /// Execute a single prompt, optionally with an image
    pub async fn execute(&self, prompt: String, image: Option<&Path>) -> Result<NonInteractiveResult> {
        let start_time = std::time::Instant::now();

        let image_name = match image {
            Some(path) => {
                let attachment = ImageAttachment::from_path(path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                let name = attachment.file_name().to_string();
                self.session.attach_image(attachment)?;
                Some(name)
            }
            None => None,
        };

        let (response, failed) = match self.session.send_turn(&prompt).await {
            SendOutcome::Replied(turn) => (turn.content().to_string(), false),
            SendOutcome::Failed(turn) => (turn.content().to_string(), true),
            SendOutcome::Empty => anyhow::bail!("Nothing to send: empty prompt and no image"),
            SendOutcome::Busy => anyhow::bail!("Session is still waiting for a reply"),
        };

        Ok(NonInteractiveResult {
            session_id: self.session.session_id().to_string(),
            prompt,
            image: image_name,
            response,
            image_urls: self.observer.image_urls.lock().clone(),
            failed,
            duration_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Format the result according to the output format
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_else(|e| {
                format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
            }),
            OutputFormat::Text => {
                let mut output = result.response.clone();
                for url in &result.image_urls {
                    output.push_str(&format!("\n[imagem] {}", url));
                }
                output
            }
        }
    }
}
