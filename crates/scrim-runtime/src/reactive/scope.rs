#![forbid(unsafe_code)]

//! Lifetime management for a component's subscriptions.

use super::{Observable, Signal, Subscription};

/// Collects the subscriptions of one logical owner (e.g., an overlay).
///
/// When the scope is dropped or cleared, every held subscription is
/// released and no callback registered through it fires again.
///
/// # Invariants
///
/// 1. Subscriptions are released in reverse registration order.
/// 2. `clear()` releases everything immediately; the scope stays usable.
#[derive(Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the scope is dropped or cleared.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to an observable within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(source.subscribe(callback));
        self
    }

    /// Connect to a signal within this scope.
    pub fn connect<E: 'static>(
        &mut self,
        signal: &Signal<E>,
        listener: impl Fn(&mut E) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(signal.connect(listener));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every subscription now.
    pub fn clear(&mut self) {
        while let Some(sub) = self.subscriptions.pop() {
            drop(sub);
        }
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}
