use egui::Pos2;
use std::f32::consts::PI;

use super::{Tool, ToolContext};
use crate::surface::CompositeMode;

/// Length of each arrow head segment in pixels
pub const ARROW_HEAD_LENGTH: f32 = 15.0;
/// Angle between the shaft and each head segment
pub const ARROW_HEAD_ANGLE: f32 = PI / 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
    Arrow,
}

/// Shape tools restore the press-time snapshot and render a fresh preview on
/// every move, so only the latest shape remains on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTool {
    shape: ShapeKind,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }
}

/// The four edges of the axis-aligned rectangle spanned by two corners
pub fn rectangle_segments(a: Pos2, b: Pos2) -> [(Pos2, Pos2); 4] {
    let top_right = Pos2::new(b.x, a.y);
    let bottom_left = Pos2::new(a.x, b.y);
    [(a, top_right), (top_right, b), (b, bottom_left), (bottom_left, a)]
}

/// Shaft plus two head segments at ±30° from the shaft direction
pub fn arrow_segments(start: Pos2, end: Pos2) -> [(Pos2, Pos2); 3] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let head = |theta: f32| {
        Pos2::new(
            end.x - ARROW_HEAD_LENGTH * theta.cos(),
            end.y - ARROW_HEAD_LENGTH * theta.sin(),
        )
    };
    [
        (start, end),
        (end, head(angle - ARROW_HEAD_ANGLE)),
        (end, head(angle + ARROW_HEAD_ANGLE)),
    ]
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        match self.shape {
            ShapeKind::Line => "Line",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Arrow => "Arrow",
        }
    }

    fn needs_snapshot(&self) -> bool {
        true
    }

    fn on_pointer_move(&self, ctx: &mut ToolContext<'_>, pos: Pos2) {
        // Wipe the previous preview
        if let Some(snapshot) = &ctx.gesture.snapshot {
            ctx.surface.restore(snapshot);
        }

        let style = ctx.gesture.tool;
        let ink = style.ink(CompositeMode::Paint);
        let width = style.stroke_width();
        let start = ctx.gesture.start;

        match self.shape {
            ShapeKind::Line => ctx.surface.stroke_segments(&[(start, pos)], width, ink),
            ShapeKind::Rectangle => ctx.surface.stroke_segments(&rectangle_segments(start, pos), width, ink),
            ShapeKind::Circle => ctx.surface.stroke_circle(start, start.distance(pos), width, ink),
            ShapeKind::Arrow => ctx.surface.stroke_segments(&arrow_segments(start, pos), width, ink),
        }
    }
}
