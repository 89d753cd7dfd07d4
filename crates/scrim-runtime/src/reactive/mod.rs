#![forbid(unsafe_code)]

//! Change-tracking primitives for overlay state.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Signal`]: a notification channel whose listeners receive the event
//!   mutably, so they can veto it (cancelable notifications).
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`SubscriptionScope`]: holds the subscriptions of one component.
//!
//! # Architecture
//!
//! Both sources use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Callbacks are stored as `Weak` pointers; the strong reference lives in the
//! `Subscription`, and dead entries are cleaned up lazily during
//! notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. No borrow is held while callbacks run, so callbacks may read or write
//!    the source they observe.

pub mod observable;
pub mod scope;
pub mod signal;

pub use observable::{Observable, Subscription};
pub use scope::SubscriptionScope;
pub use signal::Signal;
