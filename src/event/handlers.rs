use std::cell::RefCell;
use std::rc::Rc;

use crate::event::{EditorEvent, EventHandler};

/// Requests an egui repaint whenever the engine reports a change
pub struct RepaintHandler {
    ctx: egui::Context,
}

impl RepaintHandler {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl EventHandler for RepaintHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        log::trace!("repaint after {event:?}");
        self.ctx.request_repaint();
    }
}

/// Shared, clonable record of emitted events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler feeding this log, for subscribing to a bus
    pub fn handler(&self) -> Box<dyn EventHandler> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    pub fn last(&self) -> Option<EditorEvent> {
        self.events.borrow().last().cloned()
    }

    /// Removes and returns everything recorded so far
    pub fn drain(&self) -> Vec<EditorEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EventHandler for EventLog {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
