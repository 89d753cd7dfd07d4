#![forbid(unsafe_code)]

//! Input events dispatched through a [`Document`](crate::dom::Document).
//!
//! Events carry their composed path (target first, `body` last) and are
//! delivered to capture-phase listeners in registration order. A listener may
//! stop propagation, hiding the event from later listeners, and may prevent
//! the default action, which suppresses the document's built-in behavior
//! (focusing on click, sequential navigation on Tab).

use bitflags::bitflags;

use crate::dom::NodeId;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL = 0b0010;
        const ALT = 0b0100;
        const META = 0b1000;
    }
}

/// Keys the overlay layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Tab,
    Enter,
    Char(char),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key press without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Set the held modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether Shift was held.
    #[inline]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Event categories with document-level capture listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    FocusIn,
    KeyDown,
}

/// An event travelling through the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    kind: EventKind,
    path: Vec<NodeId>,
    key: Option<KeyEvent>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    fn new(kind: EventKind, path: Vec<NodeId>, key: Option<KeyEvent>) -> Self {
        Self {
            kind,
            path,
            key,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A click whose composed path starts at the clicked node.
    #[must_use]
    pub fn click(path: Vec<NodeId>) -> Self {
        Self::new(EventKind::Click, path, None)
    }

    /// A focus change whose composed path starts at the newly focused node.
    #[must_use]
    pub fn focus_in(path: Vec<NodeId>) -> Self {
        Self::new(EventKind::FocusIn, path, None)
    }

    /// A key press targeted at the first node of `path`.
    #[must_use]
    pub fn key_down(path: Vec<NodeId>, key: KeyEvent) -> Self {
        Self::new(EventKind::KeyDown, path, Some(key))
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The innermost node the event was dispatched to.
    #[inline]
    pub fn target(&self) -> Option<NodeId> {
        self.path.first().copied()
    }

    /// Composed path, target first.
    #[inline]
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    #[inline]
    pub fn key(&self) -> Option<KeyEvent> {
        self.key
    }

    pub fn is_escape(&self) -> bool {
        matches!(self.key, Some(KeyEvent { code: KeyCode::Escape, .. }))
    }

    pub fn is_tab(&self) -> bool {
        matches!(self.key, Some(KeyEvent { code: KeyCode::Tab, .. }))
    }

    /// Suppress the document's default action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Hide the event from listeners registered after the current one.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[inline]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_tab_is_tab_with_shift() {
        let key = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(key.shift());
        let event = DomEvent::key_down(Vec::new(), key);
        assert!(event.is_tab());
        assert!(!event.is_escape());
    }

    #[test]
    fn click_has_no_key() {
        let event = DomEvent::click(Vec::new());
        assert_eq!(event.kind(), EventKind::Click);
        assert!(event.key().is_none());
        assert!(event.target().is_none());
        assert!(!event.is_tab());
    }

    #[test]
    fn prevent_and_stop_are_independent() {
        let mut event = DomEvent::key_down(Vec::new(), KeyEvent::new(KeyCode::Escape));
        event.prevent_default();
        assert!(event.default_prevented());
        assert!(!event.propagation_stopped());
        event.stop_propagation();
        assert!(event.propagation_stopped());
    }
}
