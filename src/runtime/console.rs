use chrono::Local;
use colored::Colorize;
use tracing::debug;

use crate::chat::{ChatObserver, Role, Turn};

/// Renders session events to the terminal
pub struct ConsoleObserver {
    /// Echo the user's own turns (off when they were just typed)
    echo_user: bool,
}

impl ConsoleObserver {
    pub fn new(echo_user: bool) -> Self {
        Self { echo_user }
    }
}

/// One transcript line: `[HH:MM] who: text`
pub fn format_turn(turn: &Turn) -> String {
    let time = turn.timestamp().with_timezone(&Local).format("%H:%M");
    let who = match turn.role() {
        Role::User => "você",
        Role::Assistant => "assistente",
    };
    format!("[{}] {}: {}", time, who, turn.content())
}

impl ChatObserver for ConsoleObserver {
    fn on_turn_appended(&self, turn: &Turn) {
        match turn.role() {
            Role::User if !self.echo_user => {}
            Role::User => println!("{}", format_turn(turn).cyan()),
            Role::Assistant if turn.is_error() => println!("{}", format_turn(turn).red()),
            Role::Assistant => println!("{}", format_turn(turn).green()),
        }
    }

    fn on_attachment_state_changed(&self, pending: bool) {
        if pending {
            println!("{}", "📎 Imagem anexada".dimmed());
        }
    }

    fn on_awaiting_reply_changed(&self, awaiting: bool) {
        if awaiting {
            println!("{}", "…".dimmed());
        }
    }

    fn on_visibility_changed(&self, open: bool) {
        debug!(open, "chat visibility changed");
    }

    fn on_image_received(&self, url: &str) {
        println!("🖼  {}", url.underline());
    }

    fn on_notice(&self, message: &str) {
        println!("{}", message.yellow());
    }
}
