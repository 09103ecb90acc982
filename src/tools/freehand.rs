use egui::Pos2;

use super::{Tool, ToolContext};
use crate::surface::CompositeMode;

/// Pen and eraser: stroke a segment from the previous point on every move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreehandTool {
    erase: bool,
}

impl FreehandTool {
    pub fn pen() -> Self {
        Self { erase: false }
    }

    pub fn eraser() -> Self {
        Self { erase: true }
    }
}

impl Tool for FreehandTool {
    fn name(&self) -> &'static str {
        if self.erase { "Eraser" } else { "Pen" }
    }

    fn composite_mode(&self) -> CompositeMode {
        if self.erase {
            CompositeMode::Erase
        } else {
            CompositeMode::Paint
        }
    }

    fn on_pointer_move(&self, ctx: &mut ToolContext<'_>, pos: Pos2) {
        // Connect the previous point to this one
        let style = ctx.gesture.tool;
        let ink = style.ink(self.composite_mode());
        ctx.surface
            .stroke_segments(&[(ctx.gesture.previous, pos)], style.stroke_width(), ink);
        ctx.gesture.previous = pos;
    }
}
