use egui::{Pos2, Rect, Vec2};

mod mapper;
pub use mapper::CoordinateMapper;

/// Pointer input delivered to the drawing engine, in surface pixel space.
///
/// Use [`CoordinateMapper`] to translate device coordinates before building
/// these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Button or touch pressed
    PointerDown { pos: Pos2 },
    /// Pointer moved, with or without a button held
    PointerMove { pos: Pos2 },
    /// Button or touch released
    PointerUp { pos: Pos2 },
    /// Pointer left the surface while possibly held
    PointerLeave,
    /// The platform cancelled the touch sequence
    TouchCancel,
}

impl InputEvent {
    /// Builds the event from a device position using `mapper`
    pub fn mapped(kind: PointerPhase, device: Pos2, mapper: &CoordinateMapper) -> Self {
        let pos = mapper.to_surface(device);
        match kind {
            PointerPhase::Down => InputEvent::PointerDown { pos },
            PointerPhase::Move => InputEvent::PointerMove { pos },
            PointerPhase::Up => InputEvent::PointerUp { pos },
        }
    }

    pub fn position(&self) -> Option<Pos2> {
        match self {
            InputEvent::PointerDown { pos }
            | InputEvent::PointerMove { pos }
            | InputEvent::PointerUp { pos } => Some(*pos),
            InputEvent::PointerLeave | InputEvent::TouchCancel => None,
        }
    }
}

/// Phase of a positioned pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// The pointer state of one frame that matters to the surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerFrame {
    /// Pointer position in device space
    pub hover: Option<Pos2>,
    pub pressed: bool,
    pub released: bool,
    pub moved: bool,
    /// The platform cancelled the touch sequence
    pub cancelled: bool,
}

impl PointerFrame {
    pub fn from_input(input: &egui::InputState) -> Self {
        Self {
            hover: input.pointer.hover_pos(),
            pressed: input.pointer.primary_pressed(),
            released: input.pointer.primary_released(),
            moved: input.pointer.delta() != Vec2::ZERO,
            cancelled: input.events.iter().any(|event| {
                matches!(
                    event,
                    egui::Event::Touch {
                        phase: egui::TouchPhase::Cancel,
                        ..
                    }
                )
            }),
        }
    }
}

/// Tracks the surface's on-screen placement and turns raw egui pointer state
/// into [`InputEvent`]s
#[derive(Debug, Default)]
pub struct InputHandler {
    displayed: Option<Rect>,
    pressed: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update where the surface is drawn this frame
    pub fn set_displayed_rect(&mut self, rect: Rect) {
        self.displayed = Some(rect);
    }

    /// Collects this frame's pointer events for a surface of `intrinsic` size
    pub fn process_input(&mut self, ctx: &egui::Context, intrinsic: Vec2) -> Vec<InputEvent> {
        let frame = ctx.input(PointerFrame::from_input);
        self.process_frame(frame, intrinsic)
    }

    /// Turns one frame of pointer state into surface events, in order
    pub fn process_frame(&mut self, frame: PointerFrame, intrinsic: Vec2) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let Some(displayed) = self.displayed else {
            return events;
        };
        let mapper = CoordinateMapper::new(displayed, intrinsic);
        let inside = frame.hover.is_some_and(|pos| displayed.contains(pos));

        if self.pressed && frame.cancelled {
            self.pressed = false;
            events.push(InputEvent::TouchCancel);
        } else if frame.pressed && inside {
            if let Some(pos) = frame.hover {
                events.push(InputEvent::mapped(PointerPhase::Down, pos, &mapper));
                // A quick click can press and release within one frame
                if frame.released {
                    events.push(InputEvent::mapped(PointerPhase::Up, pos, &mapper));
                } else {
                    self.pressed = true;
                }
            }
        } else if self.pressed && !inside {
            self.pressed = false;
            events.push(InputEvent::PointerLeave);
        } else if self.pressed && frame.released {
            self.pressed = false;
            if let Some(pos) = frame.hover {
                // Render up to the release point before committing
                if frame.moved {
                    events.push(InputEvent::mapped(PointerPhase::Move, pos, &mapper));
                }
                events.push(InputEvent::mapped(PointerPhase::Up, pos, &mapper));
            }
        } else if self.pressed && frame.moved {
            if let Some(pos) = frame.hover {
                events.push(InputEvent::mapped(PointerPhase::Move, pos, &mapper));
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> InputHandler {
        let mut handler = InputHandler::new();
        handler.set_displayed_rect(Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(50.0, 50.0)));
        handler
    }

    const INTRINSIC: Vec2 = Vec2::new(100.0, 100.0);

    fn at(x: f32, y: f32) -> PointerFrame {
        PointerFrame {
            hover: Some(Pos2::new(x, y)),
            ..PointerFrame::default()
        }
    }

    #[test]
    fn test_release_after_move_renders_final_point() {
        let mut handler = handler();
        let down = handler.process_frame(PointerFrame { pressed: true, ..at(20.0, 20.0) }, INTRINSIC);
        assert_eq!(down, vec![InputEvent::PointerDown { pos: Pos2::new(20.0, 20.0) }]);

        let release = PointerFrame {
            released: true,
            moved: true,
            ..at(30.0, 25.0)
        };
        assert_eq!(
            handler.process_frame(release, INTRINSIC),
            vec![
                InputEvent::PointerMove { pos: Pos2::new(40.0, 30.0) },
                InputEvent::PointerUp { pos: Pos2::new(40.0, 30.0) },
            ]
        );
    }

    #[test]
    fn test_still_release_sends_only_up() {
        let mut handler = handler();
        handler.process_frame(PointerFrame { pressed: true, ..at(20.0, 20.0) }, INTRINSIC);
        let events = handler.process_frame(PointerFrame { released: true, ..at(20.0, 20.0) }, INTRINSIC);
        assert_eq!(events, vec![InputEvent::PointerUp { pos: Pos2::new(20.0, 20.0) }]);
    }

    #[test]
    fn test_leaving_and_cancel_abandon() {
        let mut handler = handler();
        handler.process_frame(PointerFrame { pressed: true, ..at(20.0, 20.0) }, INTRINSIC);
        let events = handler.process_frame(PointerFrame { moved: true, ..at(80.0, 20.0) }, INTRINSIC);
        assert_eq!(events, vec![InputEvent::PointerLeave]);

        handler.process_frame(PointerFrame { pressed: true, ..at(20.0, 20.0) }, INTRINSIC);
        let events = handler.process_frame(PointerFrame { cancelled: true, ..at(20.0, 20.0) }, INTRINSIC);
        assert_eq!(events, vec![InputEvent::TouchCancel]);
    }

    #[test]
    fn test_click_within_one_frame() {
        let mut handler = handler();
        let click = PointerFrame {
            pressed: true,
            released: true,
            ..at(35.0, 35.0)
        };
        assert_eq!(
            handler.process_frame(click, INTRINSIC),
            vec![
                InputEvent::PointerDown { pos: Pos2::new(50.0, 50.0) },
                InputEvent::PointerUp { pos: Pos2::new(50.0, 50.0) },
            ]
        );
        // Not left holding the button
        assert!(handler.process_frame(PointerFrame { moved: true, ..at(36.0, 36.0) }, INTRINSIC).is_empty());
    }
}
