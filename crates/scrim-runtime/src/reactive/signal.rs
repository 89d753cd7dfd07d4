#![forbid(unsafe_code)]

//! Notification channels with mutable payloads.
//!
//! Listeners receive `&mut E`, so an event can carry a flag listeners set
//! (for example, a cancelable notification whose default is prevented).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::Subscription;

type Listener<E> = dyn Fn(&mut E);

/// Broadcasts events to connected listeners in connection order.
///
/// Clones share the same listener list.
pub struct Signal<E> {
    listeners: Rc<RefCell<Vec<Weak<Listener<E>>>>>,
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<E: 'static> Signal<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It stays connected while the returned
    /// subscription lives.
    #[must_use = "dropping the subscription disconnects immediately"]
    pub fn connect(&self, listener: impl Fn(&mut E) + 'static) -> Subscription {
        let listener: Rc<Listener<E>> = Rc::new(listener);
        self.listeners.borrow_mut().push(Rc::downgrade(&listener));
        Subscription::new(listener)
    }

    /// Deliver `event` to every live listener. Listeners connected during
    /// delivery see the next event, not this one.
    pub fn emit(&self, event: &mut E) {
        let live: Vec<Rc<Listener<E>>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|weak| weak.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener(event);
        }
    }

    /// Number of connected listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Veto {
        prevented: bool,
        seen: u32,
    }

    #[test]
    fn listeners_can_mutate_event() {
        let signal = Signal::<Veto>::new();
        let _a = signal.connect(|e| e.seen += 1);
        let _b = signal.connect(|e| {
            e.seen += 1;
            e.prevented = true;
        });
        let mut event = Veto::default();
        signal.emit(&mut event);
        assert_eq!(event.seen, 2);
        assert!(event.prevented);
    }

    #[test]
    fn disconnect_on_drop() {
        let signal = Signal::<u32>::new();
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let sub = signal.connect(move |v| sink.set(sink.get() + *v));
        signal.emit(&mut 2);
        drop(sub);
        signal.emit(&mut 5);
        assert_eq!(hits.get(), 2);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn connect_during_emit_waits_for_next_event() {
        let signal = Signal::<u32>::new();
        let hits = Rc::new(Cell::new(0));
        let late: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let handle = signal.clone();
        let slot = Rc::clone(&late);
        let sink = Rc::clone(&hits);
        let _outer = signal.connect(move |_| {
            if slot.borrow().is_none() {
                let sink = Rc::clone(&sink);
                *slot.borrow_mut() = Some(handle.connect(move |_| sink.set(sink.get() + 1)));
            }
        });
        signal.emit(&mut 0);
        assert_eq!(hits.get(), 0);
        signal.emit(&mut 0);
        assert_eq!(hits.get(), 1);
    }
}
