use std::cell::{Cell, RefCell};

use crate::event::{EditorEvent, EventHandler};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Broadcasts editor events to subscribed handlers.
///
/// Delivery is synchronous and in subscription order. A handler subscribed
/// while an event is being delivered starts receiving from the next event.
/// One unsubscribed during delivery receives nothing further, not even the
/// rest of the current event.
pub struct EventBus {
    handlers: RefCell<Vec<(SubscriptionId, Box<dyn EventHandler>)>>,
    next_id: Cell<u64>,
    // Subscriptions taken out for the delivery in progress
    in_flight: RefCell<Vec<SubscriptionId>>,
    removed_in_flight: RefCell<Vec<SubscriptionId>>,
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        // Subscriptions belong to one owner; a clone starts empty
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            in_flight: RefCell::new(Vec::new()),
            removed_in_flight: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(subscription, _)| *subscription != id);
        if handlers.len() != before {
            return true;
        }

        // Called from a handler: the subscription is out for delivery
        let mut removed = self.removed_in_flight.borrow_mut();
        if self.in_flight.borrow().contains(&id) && !removed.contains(&id) {
            removed.push(id);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        let pending = self.in_flight.borrow().len() - self.removed_in_flight.borrow().len();
        self.handlers.borrow().len() + pending
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: EditorEvent) {
        log::trace!("emit {event:?}");
        // Handlers are moved out for delivery so they may subscribe through
        // a shared reference without a double borrow
        let mut delivering = std::mem::take(&mut *self.handlers.borrow_mut());
        let ids: Vec<SubscriptionId> = delivering.iter().map(|(id, _)| *id).collect();
        // A handler may emit again; keep the outer delivery's bookkeeping
        self.in_flight.borrow_mut().extend(ids.iter().copied());

        for (id, handler) in &mut delivering {
            if self.removed_in_flight.borrow().contains(id) {
                continue;
            }
            handler.handle_event(&event);
        }

        let mut removed = Vec::new();
        self.removed_in_flight.borrow_mut().retain(|id| {
            let ours = ids.contains(id);
            if ours {
                removed.push(*id);
            }
            !ours
        });
        self.in_flight.borrow_mut().retain(|id| !ids.contains(id));
        delivering.retain(|(id, _)| !removed.contains(id));

        let mut handlers = self.handlers.borrow_mut();
        let added = std::mem::replace(&mut *handlers, delivering);
        handlers.extend(added);
    }
}
