#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! ```ignore
//! use scrim_runtime::reactive::Observable;
//!
//! let opened = Observable::new(false);
//! let _sub = opened.subscribe(|v| println!("opened: {v}"));
//! opened.set(true); // prints "opened: true"
//! opened.set(true); // equal value: no notification
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Clones share the same value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };
        let snapshot = self.get();
        for callback in callbacks {
            callback(&snapshot);
        }
        true
    }

    /// Modify the value in place, notifying subscribers if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Number of changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Call `callback` with the new value after every change.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription::new(callback)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// RAII guard keeping a callback registered. Drop to unsubscribe.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn new(callback: impl Any) -> Self {
        Self {
            _callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_notifies_with_new_value() {
        let obs = Observable::new(1);
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| sink.set(*v));
        assert!(obs.set(5));
        assert_eq!(seen.get(), 5);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_value_is_noop() {
        let obs = Observable::new(false);
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| sink.set(sink.get() + 1));
        assert!(!obs.set(false));
        assert_eq!(calls.get(), 0);
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let obs = Observable::new(0);
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        let sub = obs.subscribe(move |_| sink.set(sink.get() + 1));
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(calls.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        let _a = obs.subscribe(move |_| first.borrow_mut().push("a"));
        let _b = obs.subscribe(move |_| second.borrow_mut().push("b"));
        obs.set(1);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn callback_may_write_back() {
        let obs = Observable::new(0);
        let handle = obs.clone();
        let _sub = obs.subscribe(move |v| {
            if *v == 1 {
                handle.set(2);
            }
        });
        obs.set(1);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn update_in_place() {
        let obs = Observable::new(vec![1]);
        assert!(obs.update(|v| v.push(2)));
        assert!(!obs.update(|_| {}));
        assert_eq!(obs.with(Vec::len), 2);
    }
}
