#![forbid(unsafe_code)]

//! Lifecycle notifications emitted by overlays.
//!
//! | Kind | Cancelable | Payload |
//! |------|------------|---------|
//! | [`OverlayEventKind::Canceled`] | yes | the triggering input event, if any |
//! | [`OverlayEventKind::Opened`] | no | none |
//! | [`OverlayEventKind::Closed`] | no | the [`ClosingReason`] |
//!
//! Listeners receive the event mutably; calling
//! [`OverlayEvent::prevent_default`] on a cancelable event vetoes it.

use scrim_core::DomEvent;

use crate::manager::OverlayId;
use crate::reason::ClosingReason;

/// What happened to the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEventKind {
    /// The overlay is about to be canceled.
    Canceled { trigger: Option<DomEvent> },
    /// The open transition finished.
    Opened,
    /// The close transition finished.
    Closed { reason: ClosingReason },
}

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEvent {
    overlay: OverlayId,
    kind: OverlayEventKind,
    default_prevented: bool,
}

impl OverlayEvent {
    pub(crate) fn new(overlay: OverlayId, kind: OverlayEventKind) -> Self {
        Self {
            overlay,
            kind,
            default_prevented: false,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> OverlayId {
        self.overlay
    }

    #[must_use]
    pub fn kind(&self) -> &OverlayEventKind {
        &self.kind
    }

    /// Only cancel notifications can be vetoed.
    #[must_use]
    pub fn cancelable(&self) -> bool {
        matches!(self.kind, OverlayEventKind::Canceled { .. })
    }

    /// Veto the notification. Ignored for non-cancelable events.
    pub fn prevent_default(&mut self) {
        if self.cancelable() {
            self.default_prevented = true;
        }
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.kind {
            OverlayEventKind::Canceled { .. } => "overlay-canceled",
            OverlayEventKind::Opened => "overlay-opened",
            OverlayEventKind::Closed { .. } => "overlay-closed",
        }
    }
}
