#![forbid(unsafe_code)]

//! Overlay stack with z-ordering, a shared backdrop, and input routing.
//!
//! The [`OverlayManager`] tracks every open overlay of a document in stacking
//! order. It installs one set of capture-phase listeners on the document and
//! routes click, focus, Escape, and Tab events to the topmost overlay only, so
//! stacked overlays never fight over outside clicks or Escape.
//!
//! # Invariants
//!
//! - Each overlay appears in the stack at most once.
//! - `always_on_top` overlays stay above overlays without the flag; among
//!   themselves, and among unpinned overlays, later additions are higher.
//! - Z-index is strictly increasing from the bottom of the stack to the top
//!   and never below the minimum (101 unless raised).
//! - One backdrop element exists per manager; it sits one z-index below the
//!   highest overlay that requested it and is hidden when none does.
//! - No stack borrow is held while an overlay handles an event, so handlers
//!   may open or close overlays.
//!
//! # Failure Modes
//!
//! - Capture events with an empty stack are ignored.
//! - `remove_overlay()` for an overlay that is not open returns `false`.
//! - Style writes on detached hosts are logged and skipped.
//!
//! # Example
//!
//! ```ignore
//! let manager = OverlayManager::new(Document::new());
//! let dialog = OverlayController::new(&manager, host);
//! dialog.open();
//! manager.frames().run_frame();
//! assert_eq!(manager.current_overlay().map(|o| o.id()), Some(dialog.id()));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use scrim_core::{Display, Document, DomEvent, EventKind, KeyCode, ListenerId, NodeId};
use scrim_runtime::{FrameScheduler, ResizeBus};

/// Lowest z-index handed to an overlay.
pub const MINIMUM_Z: i32 = 101;

/// Gap between consecutive overlays (leaves one slot for a backdrop).
const Z_STEP: i32 = 2;

/// Tag of the shared backdrop element.
pub const BACKDROP_TAG: &str = "scrim-backdrop";

static OVERLAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static GLOBAL_MANAGER: OverlayManager = OverlayManager::new(Document::global());
}

/// Unique identifier for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(OVERLAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// An overlay as seen by the stack.
///
/// Capture handlers are only called on the topmost overlay (and, for
/// outside clicks, on the overlays below it while each allows click-through).
pub trait StackOverlay {
    fn id(&self) -> OverlayId;

    /// Element whose subtree belongs to the overlay.
    fn host(&self) -> NodeId;

    fn with_backdrop(&self) -> bool;

    fn always_on_top(&self) -> bool;

    /// Whether an outside click should also reach the overlay below.
    fn allow_click_through(&self) -> bool {
        false
    }

    /// A click landed outside this overlay.
    fn on_capture_click(&self, event: &mut DomEvent);

    /// Focus moved somewhere in the document.
    fn on_capture_focus(&self, event: &mut DomEvent);

    fn on_capture_esc(&self, event: &mut DomEvent);

    fn on_capture_tab(&self, event: &mut DomEvent);

    /// Move focus to where this overlay wants it.
    fn apply_focus(&self);
}

struct ManagerInner {
    document: Document,
    frames: FrameScheduler<OverlayId>,
    resize: ResizeBus,
    stack: RefCell<Vec<Rc<dyn StackOverlay>>>,
    minimum_z: Cell<i32>,
    backdrop: Cell<Option<NodeId>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        for id in self.listeners.get_mut().drain(..) {
            self.document.remove_listener(id);
        }
    }
}

/// Shared handle to a document's overlay stack.
#[derive(Clone)]
pub struct OverlayManager {
    inner: Rc<ManagerInner>,
}

impl fmt::Debug for OverlayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayManager")
            .field("overlays", &self.overlay_ids())
            .field("minimum_z", &self.inner.minimum_z.get())
            .field("backdrop", &self.inner.backdrop.get())
            .finish()
    }
}

impl OverlayManager {
    /// Create a manager for `document` and install its capture listeners.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let manager = Self {
            inner: Rc::new(ManagerInner {
                document,
                frames: FrameScheduler::new(),
                resize: ResizeBus::new(),
                stack: RefCell::new(Vec::new()),
                minimum_z: Cell::new(MINIMUM_Z),
                backdrop: Cell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        };
        let listeners = vec![
            manager.listen(EventKind::Click, Self::on_capture_click),
            manager.listen(EventKind::FocusIn, Self::on_capture_focus),
            manager.listen(EventKind::KeyDown, Self::on_capture_key_down),
        ];
        *manager.inner.listeners.borrow_mut() = listeners;
        manager
    }

    /// The thread's manager, bound to [`Document::global`].
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_MANAGER.with(Clone::clone)
    }

    fn listen(&self, kind: EventKind, handler: fn(&Self, &mut DomEvent)) -> ListenerId {
        let weak = Rc::downgrade(&self.inner);
        self.inner
            .document
            .add_capture_listener(kind, move |event| {
                if let Some(inner) = weak.upgrade() {
                    handler(&Self { inner }, event);
                }
            })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Scheduler driving overlay transitions and refits, one pending
    /// callback per overlay.
    pub fn frames(&self) -> &FrameScheduler<OverlayId> {
        &self.inner.frames
    }

    /// Bus overlays publish resize notifications on.
    pub fn resize_bus(&self) -> &ResizeBus {
        &self.inner.resize
    }

    // --- Stack ---

    /// Register `overlay` as open, or bring it to the front if it already is.
    pub fn add_overlay(&self, overlay: Rc<dyn StackOverlay>) {
        let id = overlay.id();
        {
            let mut stack = self.inner.stack.borrow_mut();
            let from = stack.iter().position(|o| o.id() == id);
            if let Some(i) = from {
                stack.remove(i);
            }
            let index = insertion_index(&stack, overlay.always_on_top());
            stack.insert(index, overlay);
            if from != Some(index) {
                self.restack_from(&stack, index);
            }
            tracing::debug!(
                overlay = id.id(),
                index,
                depth = stack.len(),
                existing = from.is_some(),
                "overlay added"
            );
        }
        self.track_backdrop();
    }

    /// Unregister `id`. Returns whether it was open.
    pub fn remove_overlay(&self, id: OverlayId) -> bool {
        let removed = {
            let mut stack = self.inner.stack.borrow_mut();
            match stack.iter().position(|o| o.id() == id) {
                Some(i) => {
                    stack.remove(i);
                    tracing::debug!(overlay = id.id(), depth = stack.len(), "overlay removed");
                    true
                }
                None => false,
            }
        };
        if removed {
            self.track_backdrop();
        }
        removed
    }

    /// The topmost open overlay.
    pub fn current_overlay(&self) -> Option<Rc<dyn StackOverlay>> {
        self.inner.stack.borrow().last().cloned()
    }

    /// Z-index of the topmost overlay, or the minimum when none is open.
    pub fn current_overlay_z(&self) -> i32 {
        match self.current_overlay() {
            Some(overlay) => self.z_of(overlay.as_ref()),
            None => self.inner.minimum_z.get(),
        }
    }

    /// Raise the minimum z-index to at least `z`.
    pub fn ensure_minimum_z(&self, z: i32) {
        let minimum = self.inner.minimum_z.get().max(z);
        self.inner.minimum_z.set(minimum);
    }

    pub fn minimum_z(&self) -> i32 {
        self.inner.minimum_z.get()
    }

    /// Ids of open overlays, bottom to top.
    pub fn overlay_ids(&self) -> Vec<OverlayId> {
        self.inner.stack.borrow().iter().map(|o| o.id()).collect()
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.inner.stack.borrow().iter().any(|o| o.id() == id)
    }

    pub fn len(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.stack.borrow().is_empty()
    }

    /// Reapply focus to the topmost overlay.
    pub fn focus_overlay(&self) {
        if let Some(overlay) = self.current_overlay() {
            overlay.apply_focus();
        }
    }

    /// Forget every overlay and restore the minimum z-index.
    pub fn reset(&self) {
        self.inner.stack.borrow_mut().clear();
        self.inner.minimum_z.set(MINIMUM_Z);
        self.track_backdrop();
        tracing::debug!("overlay stack reset");
    }

    // --- Backdrop ---

    /// Open overlays that requested a backdrop, bottom to top.
    pub fn backdrops(&self) -> Vec<Rc<dyn StackOverlay>> {
        self.inner
            .stack
            .borrow()
            .iter()
            .filter(|o| o.with_backdrop())
            .cloned()
            .collect()
    }

    /// Z-index for the backdrop: one below the highest overlay requesting it.
    pub fn backdrop_z(&self) -> i32 {
        match self.overlay_with_backdrop() {
            Some(overlay) => self.z_of(overlay.as_ref()) - 1,
            None => self.inner.minimum_z.get() - 1,
        }
    }

    /// The shared backdrop element, created under `body` on first use.
    pub fn backdrop_element(&self) -> NodeId {
        if let Some(backdrop) = self.inner.backdrop.get() {
            return backdrop;
        }
        let doc = &self.inner.document;
        let backdrop = doc.create_element(BACKDROP_TAG);
        if let Err(err) = doc.update_style(backdrop, |s| s.display = Display::None) {
            tracing::warn!(%err, "backdrop style not applied");
        }
        if let Err(err) = doc.append_child(doc.body(), backdrop) {
            tracing::warn!(%err, "backdrop not attached");
        }
        self.inner.backdrop.set(Some(backdrop));
        backdrop
    }

    /// Whether the backdrop is currently shown.
    pub fn backdrop_opened(&self) -> bool {
        self.inner.backdrop.get().is_some_and(|backdrop| {
            self.inner
                .document
                .style(backdrop)
                .is_some_and(|s| s.display != Display::None)
        })
    }

    /// Show, hide, and reorder the backdrop for the current stack.
    pub fn track_backdrop(&self) {
        let overlay = self.overlay_with_backdrop();
        if overlay.is_none() && self.inner.backdrop.get().is_none() {
            return;
        }
        let doc = &self.inner.document;
        let backdrop = self.backdrop_element();
        let opened = overlay.is_some();
        let z = self.backdrop_z();
        if opened
            && !doc.is_connected(backdrop)
            && let Err(err) = doc.append_child(doc.body(), backdrop)
        {
            tracing::warn!(%err, "backdrop not reattached");
        }
        let applied = doc.update_style(backdrop, |s| {
            s.z_index = Some(z);
            s.display = if opened { Display::Default } else { Display::None };
        });
        if let Err(err) = applied {
            tracing::warn!(%err, "backdrop style not applied");
        }
        tracing::debug!(opened, z, "backdrop tracked");
    }

    fn overlay_with_backdrop(&self) -> Option<Rc<dyn StackOverlay>> {
        self.inner
            .stack
            .borrow()
            .iter()
            .rev()
            .find(|o| o.with_backdrop())
            .cloned()
    }

    // --- Focus ---

    /// The focused node, descending through shadow roots to the innermost
    /// focused element.
    pub fn deep_active_element(&self) -> NodeId {
        let doc = &self.inner.document;
        let mut active = doc.active_element();
        while let Some(inner) = doc.shadow_active_element(active)
            && inner != active
        {
            active = inner;
        }
        active
    }

    // --- Z-order ---

    fn z_of(&self, overlay: &dyn StackOverlay) -> i32 {
        self.inner
            .document
            .style(overlay.host())
            .and_then(|s| s.z_index)
            .unwrap_or_else(|| self.inner.minimum_z.get())
    }

    fn set_z(&self, overlay: &dyn StackOverlay, z: i32) {
        let applied = self
            .inner
            .document
            .update_style(overlay.host(), |s| s.z_index = Some(z));
        if let Err(err) = applied {
            tracing::warn!(overlay = overlay.id().id(), %err, "z-index not applied");
        }
    }

    /// Lift overlays from `index` up so each sits above the one below it.
    fn restack_from(&self, stack: &[Rc<dyn StackOverlay>], index: usize) {
        let minimum = self.inner.minimum_z.get();
        for i in index..stack.len() {
            let below = match i.checked_sub(1) {
                Some(j) => self.z_of(stack[j].as_ref()).max(minimum),
                None => minimum,
            };
            if self.z_of(stack[i].as_ref()) <= below {
                self.set_z(stack[i].as_ref(), below + Z_STEP);
            }
        }
    }

    // --- Capture dispatch ---

    fn snapshot(&self) -> Vec<Rc<dyn StackOverlay>> {
        self.inner.stack.borrow().clone()
    }

    fn on_capture_click(&self, event: &mut DomEvent) {
        let stack = self.snapshot();
        if stack.is_empty() {
            return;
        }
        let inside = overlay_in_path(&stack, event.path());
        for overlay in stack.iter().rev() {
            if inside == Some(overlay.id()) {
                break;
            }
            tracing::trace!(overlay = overlay.id().id(), "outside click");
            overlay.on_capture_click(event);
            if !overlay.allow_click_through() {
                break;
            }
        }
    }

    fn on_capture_focus(&self, event: &mut DomEvent) {
        if let Some(overlay) = self.current_overlay() {
            tracing::trace!(overlay = overlay.id().id(), "capture focus");
            overlay.on_capture_focus(event);
        }
    }

    fn on_capture_key_down(&self, event: &mut DomEvent) {
        let Some(overlay) = self.current_overlay() else {
            return;
        };
        match event.key().map(|k| k.code) {
            Some(KeyCode::Escape) => {
                tracing::trace!(overlay = overlay.id().id(), "capture escape");
                overlay.on_capture_esc(event);
            }
            Some(KeyCode::Tab) => {
                tracing::trace!(overlay = overlay.id().id(), "capture tab");
                overlay.on_capture_tab(event);
            }
            _ => {}
        }
    }
}

/// Where a new overlay goes: pinned overlays on top of everything, others
/// below the run of pinned overlays at the top.
fn insertion_index(stack: &[Rc<dyn StackOverlay>], always_on_top: bool) -> usize {
    if always_on_top {
        stack.len()
    } else {
        stack
            .iter()
            .rposition(|o| !o.always_on_top())
            .map_or(0, |i| i + 1)
    }
}

/// The first open overlay whose host lies on `path`.
fn overlay_in_path(stack: &[Rc<dyn StackOverlay>], path: &[NodeId]) -> Option<OverlayId> {
    let hosts: AHashMap<NodeId, OverlayId> = stack.iter().map(|o| (o.host(), o.id())).collect();
    path.iter().find_map(|node| hosts.get(node).copied())
}
