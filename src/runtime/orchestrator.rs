use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use super::console::{format_turn, ConsoleObserver};
use super::input::{parse_input, InputAction, HELP_TEXT};
use super::non_interactive::NonInteractiveRunner;
use crate::{
    app::{load_config, Config},
    backend::{ChatBackend, HttpChatBackend},
    chat::{ChatSession, ImageAttachment, SendOutcome},
    cli::{handle_command, Cli},
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = load_config(cli.config.as_deref())?;
        if let Some(url) = &cli.backend {
            config.backend.base_url = url.clone();
        }
        Ok(Self { cli, config })
    }

    /// Run the orchestrator. Returns false if a one-shot prompt failed.
    pub async fn run(self) -> Result<bool> {
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config)? {
                return Ok(true);
            }
        }

        let backend: Arc<dyn ChatBackend> = Arc::new(
            HttpChatBackend::new(&self.config.backend).context("Failed to create HTTP client")?,
        );
        info!(backend = %self.config.backend.normalized_base_url(), "using backend");

        if let Some(prompt) = self.cli.prompt.clone() {
            let runner = NonInteractiveRunner::new(backend, &self.config.chat);
            let result = runner.execute(prompt, self.cli.image.as_deref()).await?;
            println!("{}", runner.format_result(&result, self.cli.output_format));
            return Ok(!result.failed);
        }

        self.run_interactive(backend).await?;
        Ok(true)
    }

    async fn run_interactive(&self, backend: Arc<dyn ChatBackend>) -> Result<()> {
        let session = ChatSession::new(
            backend,
            Arc::new(ConsoleObserver::new(false)),
            &self.config.chat,
        );
        if let Some(path) = &self.cli.image {
            attach_from_path(&session, path);
        }
        session.open();

        println!(
            "{} {}",
            "Pac-Lead chat".bold(),
            format!("({})", self.config.backend.normalized_base_url()).dimmed()
        );
        println!("{}", "Digite /help para ver os comandos.".dimmed());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                InputAction::Send(text) => {
                    if session.send_turn(&text).await == SendOutcome::Busy {
                        println!("{}", "Aguarde a resposta anterior.".yellow());
                    }
                }
                InputAction::Attach(path) => attach_from_path(&session, &path),
                InputAction::Detach => {
                    if session.clear_attachment() {
                        println!("{}", "Anexo removido.".dimmed());
                    }
                }
                InputAction::Clear => session.clear_history(),
                InputAction::Open => session.open(),
                InputAction::Close => session.close(),
                InputAction::Toggle => session.toggle(),
                InputAction::History => {
                    for turn in session.history() {
                        println!("{}", format_turn(&turn));
                    }
                }
                InputAction::Help => println!("{}", HELP_TEXT),
                InputAction::Quit => break,
                InputAction::Unknown(cmd) => {
                    println!("{} {}", "Comando desconhecido:".yellow(), cmd)
                }
            }
        }

        session.close();
        Ok(())
    }
}

/// Read an image from disk into the session; problems are printed, not fatal
fn attach_from_path(session: &ChatSession, path: &std::path::Path) {
    match ImageAttachment::from_path(path) {
        // a rejected type is already reported through the observer notice
        Ok(image) => {
            let _ = session.attach_image(image);
        }
        Err(e) => eprintln!("{} {}: {}", "Não foi possível ler".red(), path.display(), e),
    }
}
