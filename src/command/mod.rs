mod commands;
mod history;

pub use commands::Command;
pub use history::{HistoryEntry, HistoryStack};

/// Result type for command execution
pub type CommandResult = Result<(), crate::error::EngineError>;
