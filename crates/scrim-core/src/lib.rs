#![forbid(unsafe_code)]

//! Document model for scrim overlays.
//!
//! This crate provides:
//! - [`Document`]: a shareable element tree with shadow roots, slots, a
//!   single focus owner, and capture-phase event dispatch
//! - [`DomEvent`] and key types for click, focus, and keyboard input
//! - [`focusables`]: tab-order resolution over the composed tree

pub mod dom;
pub mod event;
pub mod focusables;

pub use dom::{Display, Document, DomError, ListenerId, NodeId, Style};
pub use event::{DomEvent, EventKind, KeyCode, KeyEvent, Modifiers};
pub use focusables::{FocusResolver, TabOrderResolver};
