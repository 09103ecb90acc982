mod bus;
mod events;
mod handlers;

pub use bus::{EventBus, SubscriptionId};
pub use events::EditorEvent;
pub use handlers::{EventLog, RepaintHandler};

/// Receives every event emitted on the bus it is subscribed to.
///
/// Engines are single-threaded, so handlers need not be `Send`.
pub trait EventHandler {
    fn handle_event(&mut self, event: &EditorEvent);
}
