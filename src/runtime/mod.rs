/// Runtime orchestrator module - Gateway

mod console;
mod input;
mod non_interactive;
mod orchestrator;

pub use console::{format_turn, ConsoleObserver};
pub use input::{parse_input, InputAction};
pub use non_interactive::{NonInteractiveResult, NonInteractiveRunner};
pub use orchestrator::Orchestrator;
