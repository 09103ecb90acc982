//! The drawing engine owns the raster surface, the current tool and its
//! style, and the snapshot history. Every mutation flows through it:
//!
//! ```text
//! InputEvent ─► DrawingEngine ─► Tool strategy ─► RasterSurface
//!                     │                                 │
//!                     └──────── HistoryStack ◄──────────┘ (on commit)
//! ```
//!
//! Calls take `&mut self`, so one event is handled to completion before the
//! next is accepted.
use egui::{Color32, Pos2};
use futures::channel::oneshot;
use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use super::{EngineState, Gesture, ImageLoad, SurfaceStatus, spawn_decode};
use crate::command::HistoryStack;
use crate::config::Settings;
use crate::error::EngineError;
use crate::event::{EditorEvent, EventBus, EventHandler, SubscriptionId};
use crate::input::InputEvent;
use crate::page::PageSize;
use crate::state::DecodeResult;
use crate::surface::RasterSurface;
use crate::tools::{Tool, ToolContext, ToolKind, ToolState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingResize {
    width: u32,
    height: u32,
    copy_forward: bool,
}

#[derive(Debug)]
pub struct DrawingEngine {
    id: Uuid,
    surface: RasterSurface,
    tool_state: ToolState,
    state: EngineState,
    history: HistoryStack<RgbaImage>,
    rng: StdRng,
    background: Color32,
    pending_resize: Option<PendingResize>,
    image_load: ImageLoad,
    event_bus: EventBus,
    revision: u64,
}

impl DrawingEngine {
    /// Creates an engine with default settings and a surface of the given size
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        Self::from_settings(&Settings {
            surface_width: width,
            surface_height: height,
            ..Settings::default()
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let surface = RasterSurface::new(settings.surface_width, settings.surface_height)?;
        let rng = match settings.spray_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut engine = Self {
            id: Uuid::new_v4(),
            surface,
            tool_state: ToolState::new(
                ToolKind::default(),
                settings.ink,
                settings.stroke_width,
                settings.opacity,
            ),
            state: EngineState::Idle,
            history: HistoryStack::new(settings.history_capacity),
            rng,
            background: settings.background,
            pending_resize: None,
            image_load: ImageLoad::None,
            event_bus: EventBus::new(),
            revision: 0,
        };
        // History starts from the blank surface
        engine.history.push(engine.surface.snapshot());
        log::info!(
            "drawing engine {} ready at {}x{}",
            engine.id,
            settings.surface_width,
            settings.surface_height
        );
        Ok(engine)
    }

    /// Reseeds the spray generator, for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn tool_state(&self) -> &ToolState {
        &self.tool_state
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStack<RgbaImage> {
        &self.history
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    /// Increases whenever surface pixels or dimensions change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        self.event_bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.event_bus.unsubscribe(id)
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        let old = self.tool_state.tool;
        if old == tool {
            return;
        }
        self.tool_state.tool = tool;
        log::debug!("engine {}: tool {old:?} -> {tool:?}", self.id);
        self.event_bus.emit(EditorEvent::ToolChanged { old, new: tool });
    }

    pub fn set_color(&mut self, color: Color32) {
        self.tool_state.color = color;
    }

    /// Returns false and keeps the old width when `width` is not positive
    pub fn set_stroke_width(&mut self, width: f32) -> bool {
        self.tool_state.set_stroke_width(width)
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.tool_state.set_opacity(opacity);
    }

    pub fn set_background(&mut self, color: Color32) {
        self.background = color;
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { pos } => self.pointer_down(pos),
            InputEvent::PointerMove { pos } => self.pointer_move(pos),
            InputEvent::PointerUp { pos } => {
                self.pointer_up(pos);
            }
            InputEvent::PointerLeave | InputEvent::TouchCancel => self.pointer_leave(),
        }
    }

    /// Handles `events` strictly in order
    pub fn handle_events(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            self.handle_event(event);
        }
    }

    pub fn pointer_down(&mut self, pos: Pos2) {
        if self.state.is_active() {
            log::debug!("engine {}: press ignored, gesture already active", self.id);
            return;
        }

        // Shape tools redraw over the surface as it was at press
        let tool = self.tool_state;
        let snapshot = tool
            .tool
            .strategy()
            .needs_snapshot()
            .then(|| self.surface.snapshot());
        let next = EngineState::Active(Gesture::begin(pos, tool, snapshot));
        debug_assert!(self.state.can_transition_to(&next));
        self.state = next;

        log::debug!("engine {}: {:?} gesture at {pos:?}", self.id, tool.tool);
        self.event_bus.emit(EditorEvent::GestureStarted { tool: tool.tool });
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        let EngineState::Active(gesture) = &mut self.state else {
            return;
        };
        gesture.current = pos;

        // Let the tool draw this segment
        let strategy = gesture.tool.tool.strategy();
        let mut ctx = ToolContext {
            surface: &mut self.surface,
            gesture,
            rng: &mut self.rng,
        };
        strategy.on_pointer_move(&mut ctx, pos);
        self.revision += 1;
    }

    /// Commits the active gesture. Returns the new history step, or `None`
    /// when no gesture was active.
    pub fn pointer_up(&mut self, pos: Pos2) -> Option<u64> {
        if !self.state.is_active() {
            return None;
        }
        // Release commits, then queued work runs
        self.state = EngineState::Idle;
        log::debug!("engine {}: gesture released at {pos:?}", self.id);
        let step = self.commit();
        self.apply_deferred();
        Some(step)
    }

    /// Ends the active gesture without committing. Pixels already drawn stay
    /// on the surface but are not part of history.
    pub fn pointer_leave(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.state = EngineState::Idle;
        log::debug!("engine {}: gesture abandoned", self.id);
        self.event_bus.emit(EditorEvent::GestureAbandoned);
        self.apply_deferred();
    }

    pub fn can_undo(&self) -> bool {
        self.state.is_idle() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.is_idle() && self.history.can_redo()
    }

    /// Restores the previous committed surface. No-op at the oldest entry or
    /// while a gesture is active.
    pub fn undo(&mut self) -> bool {
        if self.state.is_active() {
            log::debug!("engine {}: undo ignored during gesture", self.id);
            return false;
        }
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let step = entry.step();
        self.surface.restore(entry.snapshot());
        self.revision += 1;
        log::debug!("engine {}: undo to step {step}", self.id);
        self.event_bus.emit(EditorEvent::HistoryRestored { step });
        true
    }

    /// Restores the next committed surface. No-op at the newest entry or
    /// while a gesture is active.
    pub fn redo(&mut self) -> bool {
        if self.state.is_active() {
            log::debug!("engine {}: redo ignored during gesture", self.id);
            return false;
        }
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let step = entry.step();
        self.surface.restore(entry.snapshot());
        self.revision += 1;
        log::debug!("engine {}: redo to step {step}", self.id);
        self.event_bus.emit(EditorEvent::HistoryRestored { step });
        true
    }

    /// Erases the whole surface and commits the blank state
    pub fn clear(&mut self) -> bool {
        if self.state.is_active() {
            log::debug!("engine {}: clear ignored during gesture", self.id);
            return false;
        }
        self.surface.clear();
        self.revision += 1;
        self.commit();
        true
    }

    /// Resizes the surface, discarding content unless `copy_forward` is set.
    /// While a gesture is active the resize is deferred until it ends.
    pub fn request_resize(&mut self, width: u32, height: u32, copy_forward: bool) -> Result<(), EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        let resize = PendingResize {
            width,
            height,
            copy_forward,
        };
        // Never resize under an active gesture
        if self.state.is_active() {
            log::debug!("engine {}: resize to {width}x{height} deferred", self.id);
            self.pending_resize = Some(resize);
            return Ok(());
        }
        self.apply_resize(resize)
    }

    /// Starts decoding artwork. A load already in flight is replaced.
    pub fn load_image(&mut self, bytes: Vec<u8>) {
        if !self.image_load.is_none() {
            log::debug!("engine {}: replacing pending image load", self.id);
        }
        log::info!("engine {}: decoding {} bytes of artwork", self.id, bytes.len());
        self.image_load = ImageLoad::Pending(spawn_decode(bytes));
    }

    /// Checks the pending decode without blocking. Returns true when the
    /// decoded image was drawn onto the surface during this call.
    pub fn poll_image(&mut self) -> Result<bool, EngineError> {
        let ImageLoad::Pending(receiver) = &mut self.image_load else {
            return Ok(false);
        };
        match receiver.try_recv() {
            // Still decoding
            Ok(None) => Ok(false),
            Ok(Some(result)) => {
                self.image_load = ImageLoad::None;
                self.finish_decode(result)
            }
            // Decoder thread dropped its sender
            Err(oneshot::Canceled) => self.decode_cancelled(),
        }
    }

    /// Blocks until the pending decode completes, then behaves like
    /// [`Self::poll_image`]
    pub fn wait_for_image(&mut self) -> Result<bool, EngineError> {
        match std::mem::take(&mut self.image_load) {
            ImageLoad::Pending(receiver) => match futures::executor::block_on(receiver) {
                Ok(result) => self.finish_decode(result),
                Err(oneshot::Canceled) => self.decode_cancelled(),
            },
            other => {
                self.image_load = other;
                Ok(false)
            }
        }
    }

    pub fn surface_status(&self) -> SurfaceStatus {
        if self.image_load.is_none() {
            SurfaceStatus::Ready
        } else {
            SurfaceStatus::AwaitingImage
        }
    }

    /// PNG bytes of the surface, optionally composited over the background
    pub fn export_png(&self, with_background: bool) -> Result<Vec<u8>, EngineError> {
        self.surface
            .encode_png(with_background.then_some(self.background))
    }

    /// The surface scaled and centred on a page-sized canvas
    pub fn export_page(&self, page: PageSize, resolution: f32) -> RgbaImage {
        self.surface.place_on_page(page, resolution, self.background)
    }

    fn commit(&mut self) -> u64 {
        let step = self.history.push(self.surface.snapshot());
        log::debug!("engine {}: committed step {step}", self.id);
        self.event_bus.emit(EditorEvent::GestureCommitted { step });
        step
    }

    fn apply_resize(&mut self, resize: PendingResize) -> Result<(), EngineError> {
        self.surface
            .resize(resize.width, resize.height, resize.copy_forward)?;
        self.revision += 1;
        log::info!(
            "engine {}: surface resized to {}x{}",
            self.id,
            resize.width,
            resize.height
        );
        self.commit();
        self.event_bus.emit(EditorEvent::SurfaceResized {
            width: resize.width,
            height: resize.height,
        });
        Ok(())
    }

    /// Runs work that waited for the gesture to end
    fn apply_deferred(&mut self) {
        // Resize first, then place any image that arrived mid-gesture
        if let Some(resize) = self.pending_resize.take() {
            if let Err(err) = self.apply_resize(resize) {
                log::warn!("engine {}: deferred resize failed: {err}", self.id);
            }
        }
        match std::mem::take(&mut self.image_load) {
            ImageLoad::Ready(image) => {
                if let Err(err) = self.place_image(image) {
                    log::warn!("engine {}: deferred image failed: {err}", self.id);
                }
            }
            other => self.image_load = other,
        }
    }

    fn finish_decode(&mut self, result: DecodeResult) -> Result<bool, EngineError> {
        match result {
            Ok(image) if self.state.is_active() => {
                log::debug!("engine {}: image ready, waiting for gesture to end", self.id);
                self.image_load = ImageLoad::Ready(image);
                Ok(false)
            }
            Ok(image) => {
                self.place_image(image)?;
                Ok(true)
            }
            Err(err) => {
                log::warn!("engine {}: image decode failed: {err}", self.id);
                self.event_bus.emit(EditorEvent::ImageFailed {
                    reason: err.to_string(),
                });
                Err(EngineError::ImageDecode(err))
            }
        }
    }

    fn decode_cancelled(&mut self) -> Result<bool, EngineError> {
        self.image_load = ImageLoad::None;
        let err = EngineError::DecodeCancelled;
        self.event_bus.emit(EditorEvent::ImageFailed {
            reason: err.to_string(),
        });
        Err(err)
    }

    /// Resizes the surface to the artwork, draws it at the origin and commits
    fn place_image(&mut self, image: RgbaImage) -> Result<(), EngineError> {
        // Surface takes the artwork's size
        let (width, height) = image.dimensions();
        self.surface.resize(width, height, false)?;
        self.surface.draw_image(&image, 0, 0);
        self.revision += 1;
        log::info!("engine {}: artwork placed at {width}x{height}", self.id);
        self.commit();
        self.event_bus.emit(EditorEvent::ImageReady { width, height });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DrawingEngine {
        DrawingEngine::new(64, 48).unwrap().with_seed(1)
    }

    #[test]
    fn test_init_commits_blank_surface() {
        let engine = engine();
        assert_eq!(engine.history().len(), 1);
        assert!(!engine.can_undo());
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_second_press_is_ignored() {
        let mut engine = engine();
        engine.pointer_down(Pos2::new(1.0, 1.0));
        engine.pointer_down(Pos2::new(30.0, 30.0));
        assert_eq!(engine.state().gesture().unwrap().start, Pos2::new(1.0, 1.0));
    }

    #[test]
    fn test_tool_change_mid_gesture_applies_next_press() {
        let mut engine = engine();
        engine.pointer_down(Pos2::new(1.0, 1.0));
        engine.set_tool(ToolKind::Rectangle);
        assert_eq!(engine.state().gesture().unwrap().tool.tool, ToolKind::Freehand);
        engine.pointer_up(Pos2::new(1.0, 1.0));
        engine.pointer_down(Pos2::new(1.0, 1.0));
        assert_eq!(engine.state().gesture().unwrap().tool.tool, ToolKind::Rectangle);
    }

    #[test]
    fn test_resize_waits_for_idle() {
        let mut engine = engine();
        engine.pointer_down(Pos2::new(5.0, 5.0));
        engine.request_resize(20, 10, false).unwrap();
        assert_eq!(engine.surface().size(), [64, 48]);
        engine.pointer_up(Pos2::new(5.0, 5.0));
        assert_eq!(engine.surface().size(), [20, 10]);
    }

    #[test]
    fn test_zero_resize_is_rejected() {
        let mut engine = engine();
        assert!(matches!(
            engine.request_resize(0, 10, false),
            Err(EngineError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_undo_ignored_while_drawing() {
        let mut engine = engine();
        engine.pointer_down(Pos2::new(5.0, 5.0));
        engine.pointer_move(Pos2::new(20.0, 5.0));
        engine.pointer_up(Pos2::new(20.0, 5.0));
        engine.pointer_down(Pos2::new(5.0, 5.0));
        assert!(!engine.undo());
    }
}
