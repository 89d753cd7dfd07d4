#![forbid(unsafe_code)]

//! Resize notification bus.
//!
//! Components announce that their geometry may have changed with
//! [`ResizeBus::notify_resize`]; listeners decide from the source node
//! whether the change concerns them (typically: the source is the listener's
//! host or one of its ancestors).

use std::cell::Cell;
use std::rc::Rc;

use scrim_core::NodeId;

use crate::reactive::{Signal, Subscription};

/// Shared resize channel. Clones publish to the same listeners.
#[derive(Clone, Default)]
pub struct ResizeBus {
    signal: Signal<NodeId>,
    notifications: Rc<Cell<u64>>,
}

impl std::fmt::Debug for ResizeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeBus")
            .field("listeners", &self.signal.listener_count())
            .field("notifications", &self.notifications.get())
            .finish()
    }
}

impl ResizeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce that `source` may have changed size.
    pub fn notify_resize(&self, source: NodeId) {
        self.notifications.set(self.notifications.get() + 1);
        tracing::trace!(source = source.index(), "resize notified");
        let mut source = source;
        self.signal.emit(&mut source);
    }

    /// Call `listener` with the source of every notification.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(NodeId) + 'static) -> Subscription {
        self.signal.connect(move |source| listener(*source))
    }

    /// Number of notifications published so far.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.notifications.get()
    }
}
