#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod command;
pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod file_handler;
pub mod input;
pub mod page;
pub mod panels;
pub mod state;
pub mod surface;
pub mod text;
pub mod texture_manager;
pub mod tools;

pub use app::{Mode, PageApp};
pub use command::{Command, HistoryStack};
pub use config::Settings;
pub use error::{ConfigError, EngineError, MarkupError, TextError};
pub use input::{CoordinateMapper, InputEvent};
pub use page::PageSize;
pub use state::DrawingEngine;
pub use surface::RasterSurface;
pub use text::TextComposer;
pub use tools::{ToolKind, ToolState};
