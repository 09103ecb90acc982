use egui::{Color32, Pos2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::state::Gesture;
use crate::surface::{CompositeMode, Ink, RasterSurface};

mod freehand;
mod shape;
mod spray;

pub use freehand::FreehandTool;
pub use shape::{ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH, ShapeKind, ShapeTool, arrow_segments, rectangle_segments};
pub use spray::{SPRAY_DENSITY, SPRAY_OPACITY_FACTOR, SPRAY_RADIUS_FACTOR, SprayTool, spray_dabs};

/// The tools offered by the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Freehand,
    Eraser,
    Spray,
    Line,
    Rectangle,
    Circle,
    Arrow,
}

impl ToolKind {
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Freehand,
            ToolKind::Eraser,
            ToolKind::Spray,
            ToolKind::Line,
            ToolKind::Rectangle,
            ToolKind::Circle,
            ToolKind::Arrow,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Freehand => "Pen",
            ToolKind::Eraser => "Eraser",
            ToolKind::Spray => "Spray",
            ToolKind::Line => "Line",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Circle => "Circle",
            ToolKind::Arrow => "Arrow",
        }
    }

    /// Shape tools redraw a preview from the press-time snapshot on every move
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            ToolKind::Line | ToolKind::Rectangle | ToolKind::Circle | ToolKind::Arrow
        )
    }

    /// Builds the strategy that turns a gesture with this tool into pixel operations
    pub fn strategy(self) -> ToolType {
        match self {
            ToolKind::Freehand => ToolType::Freehand(FreehandTool::pen()),
            ToolKind::Eraser => ToolType::Freehand(FreehandTool::eraser()),
            ToolKind::Spray => ToolType::Spray(SprayTool),
            ToolKind::Line => ToolType::Shape(ShapeTool::new(ShapeKind::Line)),
            ToolKind::Rectangle => ToolType::Shape(ShapeTool::new(ShapeKind::Rectangle)),
            ToolKind::Circle => ToolType::Shape(ShapeTool::new(ShapeKind::Circle)),
            ToolKind::Arrow => ToolType::Shape(ShapeTool::new(ShapeKind::Arrow)),
        }
    }
}

/// Current drawing tool and its style. A gesture copies this at press time so
/// that changes made mid-gesture only affect the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub tool: ToolKind,
    pub color: Color32,
    stroke_width: f32,
    opacity: f32,
}

impl ToolState {
    pub fn new(tool: ToolKind, color: Color32, stroke_width: f32, opacity: f32) -> Self {
        let mut state = Self {
            tool,
            color,
            stroke_width: 1.0,
            opacity: 1.0,
        };
        state.set_stroke_width(stroke_width);
        state.set_opacity(opacity);
        state
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Ignores widths that are not strictly positive
    pub fn set_stroke_width(&mut self, width: f32) -> bool {
        if width.is_finite() && width > 0.0 {
            self.stroke_width = width;
            true
        } else {
            log::warn!("ignoring invalid stroke width {width}");
            false
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clamps into [0, 1]
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
    }

    /// Ink for one render with the given composite mode
    pub fn ink(&self, mode: CompositeMode) -> Ink {
        Ink::new(self.color, self.opacity, mode)
    }
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new(ToolKind::Freehand, crate::text::DEFAULT_INK, 2.0, 1.0)
    }
}

/// Everything a tool may touch while handling one pointer move
pub struct ToolContext<'a> {
    pub surface: &'a mut RasterSurface,
    pub gesture: &'a mut Gesture,
    pub rng: &'a mut StdRng,
}

/// A tool strategy: given gesture progress, produces pixel operations
pub trait Tool {
    fn name(&self) -> &'static str;

    /// Composite mode set when the gesture begins
    fn composite_mode(&self) -> CompositeMode {
        CompositeMode::Paint
    }

    /// Whether the surface must be snapshotted at press time for previews
    fn needs_snapshot(&self) -> bool {
        false
    }

    /// Handle pointer movement to `pos` while the gesture is active
    fn on_pointer_move(&self, ctx: &mut ToolContext<'_>, pos: Pos2);
}

/// Enum over all tool strategies, dispatching without boxing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolType {
    Freehand(FreehandTool),
    Spray(SprayTool),
    Shape(ShapeTool),
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            Self::Freehand(tool) => tool.name(),
            Self::Spray(tool) => tool.name(),
            Self::Shape(tool) => tool.name(),
        }
    }

    fn composite_mode(&self) -> CompositeMode {
        match self {
            Self::Freehand(tool) => tool.composite_mode(),
            Self::Spray(tool) => tool.composite_mode(),
            Self::Shape(tool) => tool.composite_mode(),
        }
    }

    fn needs_snapshot(&self) -> bool {
        match self {
            Self::Freehand(tool) => tool.needs_snapshot(),
            Self::Spray(tool) => tool.needs_snapshot(),
            Self::Shape(tool) => tool.needs_snapshot(),
        }
    }

    fn on_pointer_move(&self, ctx: &mut ToolContext<'_>, pos: Pos2) {
        match self {
            Self::Freehand(tool) => tool.on_pointer_move(ctx, pos),
            Self::Spray(tool) => tool.on_pointer_move(ctx, pos),
            Self::Shape(tool) => tool.on_pointer_move(ctx, pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_tools_need_snapshots() {
        for kind in ToolKind::all() {
            assert_eq!(kind.strategy().needs_snapshot(), kind.is_shape(), "{kind:?}");
        }
    }

    #[test]
    fn test_only_eraser_erases() {
        for kind in ToolKind::all() {
            let expected = if *kind == ToolKind::Eraser {
                CompositeMode::Erase
            } else {
                CompositeMode::Paint
            };
            assert_eq!(kind.strategy().composite_mode(), expected);
        }
    }

    #[test]
    fn test_tool_state_validation() {
        let mut state = ToolState::default();
        assert!(!state.set_stroke_width(0.0));
        assert!(!state.set_stroke_width(-3.0));
        assert_eq!(state.stroke_width(), 2.0);
        state.set_opacity(1.5);
        assert_eq!(state.opacity(), 1.0);
        state.set_opacity(-0.2);
        assert_eq!(state.opacity(), 0.0);
    }
}
