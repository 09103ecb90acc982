//! Per-gesture state machine for the drawing engine.
//!
//! ```text
//! ┌──────────┐  press   ┌──────────┐
//! │   Idle   ├──────────►  Active  │
//! │          ◄──────────┤          │
//! └──────────┘ release  └──────────┘
//!              or leave
//! ```
//!
//! Only `Idle → Active` and `Active → Idle` are valid. A second press while
//! a gesture is active is ignored by the engine.
use egui::Pos2;
use image::RgbaImage;

use crate::tools::ToolState;

/// One press-move-release interaction with the surface
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub start: Pos2,
    pub current: Pos2,
    pub previous: Pos2,
    pub is_active: bool,
    /// Tool and style captured at press time
    pub tool: ToolState,
    /// Surface pixels at press time; only taken for shape tools
    pub snapshot: Option<RgbaImage>,
}

impl Gesture {
    pub fn begin(pos: Pos2, tool: ToolState, snapshot: Option<RgbaImage>) -> Self {
        Self {
            start: pos,
            current: pos,
            previous: pos,
            is_active: true,
            tool,
            snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Active(Gesture),
}

impl EngineState {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, new_state: &EngineState) -> bool {
        matches!(
            (self, new_state),
            (EngineState::Idle, EngineState::Active(_)) | (EngineState::Active(_), EngineState::Idle)
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EngineState::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EngineState::Active(_))
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        match self {
            EngineState::Active(gesture) => Some(gesture),
            EngineState::Idle => None,
        }
    }

    pub fn gesture_mut(&mut self) -> Option<&mut Gesture> {
        match self {
            EngineState::Active(gesture) => Some(gesture),
            EngineState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let active = EngineState::Active(Gesture::begin(Pos2::ZERO, ToolState::default(), None));
        assert!(EngineState::Idle.can_transition_to(&active));
        assert!(active.can_transition_to(&EngineState::Idle));
        assert!(!active.can_transition_to(&active));
        assert!(!EngineState::Idle.can_transition_to(&EngineState::Idle));
    }

    #[test]
    fn test_gesture_starts_at_press_point() {
        let pos = Pos2::new(3.0, 4.0);
        let gesture = Gesture::begin(pos, ToolState::default(), None);
        assert_eq!(gesture.start, pos);
        assert_eq!(gesture.previous, pos);
        assert!(gesture.is_active);
    }
}
