use std::path::PathBuf;

/// What a line typed at the chat prompt asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Plain text, possibly empty (an empty line still sends a pending image)
    Send(String),
    Attach(PathBuf),
    Detach,
    Clear,
    Open,
    Close,
    Toggle,
    History,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line. Lines starting with `/` are commands.
pub fn parse_input(line: &str) -> InputAction {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return InputAction::Send(trimmed.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "attach" | "image" if !arg.is_empty() => InputAction::Attach(PathBuf::from(arg)),
        "detach" => InputAction::Detach,
        "clear" => InputAction::Clear,
        "open" => InputAction::Open,
        "close" => InputAction::Close,
        "toggle" => InputAction::Toggle,
        "history" => InputAction::History,
        "help" | "?" => InputAction::Help,
        "quit" | "exit" | "q" => InputAction::Quit,
        _ => InputAction::Unknown(trimmed.to_string()),
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  /attach <path>   queue an image for the next message
  /detach          drop the queued image
  /clear           clear the conversation memory
  /open /close /toggle
  /history         show the transcript
  /quit            leave";
