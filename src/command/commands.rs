use egui::Color32;
use serde::{Deserialize, Serialize};

use super::CommandResult;
use crate::state::DrawingEngine;
use crate::tools::ToolKind;

/// Commands the UI layer issues to the drawing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Change the active tool; takes effect at the next press
    SetTool(ToolKind),
    SetColor(Color32),
    SetStrokeWidth(f32),
    SetOpacity(f32),
    SetBackground(Color32),
    /// Erase the surface and commit the blank state
    Clear,
    Undo,
    Redo,
    /// Resize the surface, deferred while a gesture is active
    Resize {
        width: u32,
        height: u32,
        copy_forward: bool,
    },
}

impl Command {
    /// Execute the command against `engine`
    pub fn execute(&self, engine: &mut DrawingEngine) -> CommandResult {
        match self {
            Command::SetTool(tool) => engine.set_tool(*tool),
            Command::SetColor(color) => engine.set_color(*color),
            Command::SetStrokeWidth(width) => {
                engine.set_stroke_width(*width);
            }
            Command::SetOpacity(opacity) => engine.set_opacity(*opacity),
            Command::SetBackground(color) => engine.set_background(*color),
            Command::Clear => {
                engine.clear();
            }
            Command::Undo => {
                engine.undo();
            }
            Command::Redo => {
                engine.redo();
            }
            Command::Resize {
                width,
                height,
                copy_forward,
            } => engine.request_resize(*width, *height, *copy_forward)?,
        }
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::SetTool(_) => "Set Tool",
            Command::SetColor(_) => "Set Colour",
            Command::SetStrokeWidth(_) => "Set Width",
            Command::SetOpacity(_) => "Set Opacity",
            Command::SetBackground(_) => "Set Background",
            Command::Clear => "Clear",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::Resize { .. } => "Resize",
        }
    }
}
