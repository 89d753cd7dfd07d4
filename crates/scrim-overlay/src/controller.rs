#![forbid(unsafe_code)]

//! Per-overlay open/close state machine.
//!
//! An [`OverlayController`] owns one overlay's `opened`/`canceled` state and
//! drives its transitions on animation frames:
//!
//! ```text
//! Closed --open()--> Opening --frame--> Open --close()/cancel()--> Closing --frame--> Closed
//! ```
//!
//! Opening, on the frame after `opened` became true:
//! 1. remember the deep active element for focus restoration
//! 2. make the host visible with transitions suppressed, [`Fit::refit`],
//!    re-enable transitions
//! 3. register with the [`OverlayManager`]
//! 4. focus the focus node (unless `no_auto_focus`)
//! 5. [`RenderHooks::render_opened`], then on completion notify resize,
//!    clear the animating flag, emit `Opened`
//!
//! Closing mirrors it: unregister, restore focus, render, hide, emit `Closed`
//! with the [`ClosingReason`].
//!
//! # Invariants
//!
//! 1. `canceled` becomes true only through [`OverlayController::cancel`] and
//!    is reset by `open()`, `close()` and `toggle()`.
//! 2. `closing_reason().canceled()` equals `canceled()` after every change.
//! 3. At most one frame callback (transition or refit) is pending per
//!    overlay; a later request replaces an earlier one that has not run, so
//!    closing drops a queued refit.
//! 4. Resize and content notifications are ignored while closed or
//!    animating.
//! 5. No internal borrow is held while focus moves or notifications are
//!    emitted.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Cancel vetoed | A listener prevented `Canceled` | State unchanged, `cancel()` returns `false` |
//! | Focus refused | Target hidden, disabled, or not focusable | Transition continues without retry |
//! | Opened while detached | `open()` before `attach()` | Only `aria-hidden` changes; `attach()` runs the transition |
//! | Host missing | Style or attribute writes fail | Logged at `warn`, transition continues |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use scrim_core::{Display, Document, DomEvent, FocusResolver, ListenerId, NodeId, TabOrderResolver};
use scrim_runtime::{FrameHandle, Observable, Signal, Subscription, SubscriptionScope};

use crate::config::OverlayConfig;
use crate::manager::{OverlayId, OverlayManager, StackOverlay};
use crate::notify::{OverlayEvent, OverlayEventKind};
use crate::reason::ClosingReason;

/// Layout collaborator: positions and sizes the overlay.
pub trait Fit {
    fn refit(&self, document: &Document, host: NodeId);
}

/// Leaves layout untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFit;

impl Fit for NoFit {
    fn refit(&self, _document: &Document, _host: NodeId) {}
}

impl<F> Fit for F
where
    F: Fn(&Document, NodeId),
{
    fn refit(&self, document: &Document, host: NodeId) {
        self(document, host)
    }
}

/// Rendering hooks run at the end of each transition.
///
/// Implementations that animate keep the [`FinishRender`] token and call
/// [`FinishRender::complete`] when the animation ends. The defaults complete
/// immediately.
pub trait RenderHooks {
    fn render_opened(&self, finish: FinishRender) {
        finish.complete();
    }

    fn render_closed(&self, finish: FinishRender) {
        finish.complete();
    }
}

/// Completes transitions synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateRender;

impl RenderHooks for ImmediateRender {}

/// Completion token for one render.
///
/// Completing after the overlay moved on (closed again, detached, dropped)
/// is a no-op.
#[must_use = "the transition only finishes when the token is completed"]
pub struct FinishRender {
    overlay: Weak<OverlayInner>,
    opened: bool,
}

impl FinishRender {
    /// Whether this token finishes an open (rather than a close).
    pub fn opened(&self) -> bool {
        self.opened
    }

    pub fn complete(self) {
        let Some(inner) = self.overlay.upgrade() else {
            return;
        };
        if self.opened {
            inner.finish_render_opened();
        } else {
            inner.finish_render_closed();
        }
    }
}

impl fmt::Debug for FinishRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishRender")
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct TransitionState {
    attached: bool,
    animating: bool,
    /// First and last tabbable nodes, until invalidated.
    boundaries: Option<(NodeId, NodeId)>,
    restore_focus: Option<NodeId>,
    focused_child: Option<NodeId>,
    /// `tabindex` was added for the backdrop and must be removed with it.
    added_tabindex: bool,
    observer: Option<ListenerId>,
}

struct OverlayInner {
    id: OverlayId,
    host: NodeId,
    manager: OverlayManager,
    config: Cell<OverlayConfig>,
    opened: Observable<bool>,
    canceled: Observable<bool>,
    closing_reason: RefCell<ClosingReason>,
    notifications: Signal<OverlayEvent>,
    state: RefCell<TransitionState>,
    fit: RefCell<Rc<dyn Fit>>,
    hooks: RefCell<Rc<dyn RenderHooks>>,
    resolver: RefCell<Rc<dyn FocusResolver>>,
    subscriptions: RefCell<SubscriptionScope>,
    this: Weak<OverlayInner>,
}

/// Handle to one overlay. Clones share the overlay.
#[derive(Clone)]
pub struct OverlayController {
    inner: Rc<OverlayInner>,
}

impl fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("OverlayController")
            .field("id", &self.inner.id)
            .field("host", &self.inner.host)
            .field("opened", &self.inner.opened.get())
            .field("canceled", &self.inner.canceled.get())
            .field("attached", &state.attached)
            .field("animating", &state.animating)
            .field("config", &self.inner.config.get())
            .finish()
    }
}

impl OverlayController {
    /// Create a detached, closed overlay for `host`.
    ///
    /// The host is hidden and loses its outline; nothing else happens until
    /// [`attach`](Self::attach).
    #[must_use]
    pub fn new(manager: &OverlayManager, host: NodeId) -> Self {
        let inner = Rc::new_cyclic(|this| OverlayInner {
            id: OverlayId::next(),
            host,
            manager: manager.clone(),
            config: Cell::new(OverlayConfig::default()),
            opened: Observable::new(false),
            canceled: Observable::new(false),
            closing_reason: RefCell::new(ClosingReason::new()),
            notifications: Signal::new(),
            state: RefCell::new(TransitionState::default()),
            fit: RefCell::new(Rc::new(NoFit)),
            hooks: RefCell::new(Rc::new(ImmediateRender)),
            resolver: RefCell::new(Rc::new(TabOrderResolver)),
            subscriptions: RefCell::new(SubscriptionScope::new()),
            this: this.clone(),
        });
        inner.setup();
        Self { inner }
    }

    /// Apply every switch of `config`; `config.opened` opens the overlay.
    #[must_use]
    pub fn with_config(self, config: OverlayConfig) -> Self {
        self.set_with_backdrop(config.with_backdrop);
        self.update_config(|c| {
            c.no_auto_focus = config.no_auto_focus;
            c.no_cancel_on_esc_key = config.no_cancel_on_esc_key;
            c.no_cancel_on_outside_click = config.no_cancel_on_outside_click;
            c.restore_focus_on_close = config.restore_focus_on_close;
            c.always_on_top = config.always_on_top;
            c.allow_click_through = config.allow_click_through;
        });
        if config.opened {
            self.open();
        }
        self
    }

    #[must_use]
    pub fn with_fit(self, fit: impl Fit + 'static) -> Self {
        *self.inner.fit.borrow_mut() = Rc::new(fit);
        self
    }

    #[must_use]
    pub fn with_render_hooks(self, hooks: impl RenderHooks + 'static) -> Self {
        *self.inner.hooks.borrow_mut() = Rc::new(hooks);
        self
    }

    /// Replace tab-order resolution used for Tab wrapping.
    #[must_use]
    pub fn with_focus_resolver(self, resolver: impl FocusResolver + 'static) -> Self {
        *self.inner.resolver.borrow_mut() = Rc::new(resolver);
        self.invalidate_tabbables();
        self
    }

    pub fn id(&self) -> OverlayId {
        self.inner.id
    }

    pub fn host(&self) -> NodeId {
        self.inner.host
    }

    pub fn manager(&self) -> &OverlayManager {
        &self.inner.manager
    }

    /// Current switches, with `opened` reflecting the live state.
    pub fn config(&self) -> OverlayConfig {
        self.inner.config.get().opened(self.opened())
    }

    fn update_config(&self, f: impl FnOnce(&mut OverlayConfig)) {
        let mut config = self.inner.config.get();
        f(&mut config);
        self.inner.config.set(config);
    }

    // --- State ---

    pub fn opened(&self) -> bool {
        self.inner.opened.get()
    }

    pub fn canceled(&self) -> bool {
        self.inner.canceled.get()
    }

    /// Whether an open/close transition is in progress.
    pub fn is_animating(&self) -> bool {
        self.inner.state.borrow().animating
    }

    pub fn is_attached(&self) -> bool {
        self.inner.state.borrow().attached
    }

    /// Handle of the pending frame callback (transition or refit), if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.inner
            .manager
            .frames()
            .pending_handle(self.inner.id)
    }

    pub fn closing_reason(&self) -> ClosingReason {
        self.inner.closing_reason.borrow().clone()
    }

    /// Replace the closing reason. The `canceled` key is resynchronized on
    /// the next change of `canceled`.
    pub fn set_closing_reason(&self, reason: ClosingReason) {
        *self.inner.closing_reason.borrow_mut() = reason;
    }

    pub fn update_closing_reason(&self, f: impl FnOnce(&mut ClosingReason)) {
        f(&mut self.inner.closing_reason.borrow_mut());
    }

    /// Child that last held focus inside the overlay.
    pub fn focused_child(&self) -> Option<NodeId> {
        self.inner.state.borrow().focused_child
    }

    /// Node focused when the overlay last opened.
    pub fn restore_focus_target(&self) -> Option<NodeId> {
        self.inner.state.borrow().restore_focus
    }

    // --- Switches ---

    pub fn with_backdrop(&self) -> bool {
        self.inner.config.get().with_backdrop
    }

    /// Toggle the backdrop. Adds `tabindex="-1"` to a host without one so it
    /// can hold trapped focus.
    pub fn set_with_backdrop(&self, enabled: bool) {
        if self.with_backdrop() == enabled {
            return;
        }
        self.update_config(|c| c.with_backdrop = enabled);
        self.inner.with_backdrop_changed();
    }

    pub fn set_no_auto_focus(&self, enabled: bool) {
        self.update_config(|c| c.no_auto_focus = enabled);
    }

    pub fn set_no_cancel_on_esc_key(&self, enabled: bool) {
        self.update_config(|c| c.no_cancel_on_esc_key = enabled);
    }

    pub fn set_no_cancel_on_outside_click(&self, enabled: bool) {
        self.update_config(|c| c.no_cancel_on_outside_click = enabled);
    }

    pub fn set_restore_focus_on_close(&self, enabled: bool) {
        self.update_config(|c| c.restore_focus_on_close = enabled);
    }

    pub fn set_always_on_top(&self, enabled: bool) {
        self.update_config(|c| c.always_on_top = enabled);
    }

    pub fn set_allow_click_through(&self, enabled: bool) {
        self.update_config(|c| c.allow_click_through = enabled);
    }

    // --- Transitions ---

    pub fn toggle(&self) {
        self.inner.canceled.set(false);
        self.inner.opened.set(!self.opened());
    }

    pub fn open(&self) {
        self.inner.canceled.set(false);
        self.inner.opened.set(true);
    }

    pub fn close(&self) {
        self.inner.canceled.set(false);
        self.inner.opened.set(false);
    }

    /// Cancel the overlay unless a listener vetoes the `Canceled`
    /// notification. Returns whether the cancel went through.
    pub fn cancel(&self, trigger: Option<DomEvent>) -> bool {
        self.inner.cancel(trigger)
    }

    /// Write `opened` directly, keeping `canceled` as it is.
    pub fn set_opened(&self, opened: bool) {
        self.inner.opened.set(opened);
    }

    /// Connect the overlay: observe content changes and run a pending open.
    pub fn attach(&self) {
        self.inner.attach();
    }

    /// Disconnect the overlay: drop pending frames, stop observing content,
    /// and unregister. A transition in flight finishes immediately.
    pub fn detach(&self) {
        self.inner.detach();
    }

    // --- Focus ---

    /// Where focus goes when the overlay opens: the last focused child, else
    /// the first `[autofocus]` descendant, else the host.
    pub fn focus_node(&self) -> NodeId {
        self.inner.focus_node()
    }

    /// Tabbable nodes inside the overlay, in tab order.
    pub fn focusable_nodes(&self) -> Vec<NodeId> {
        let resolver = Rc::clone(&*self.inner.resolver.borrow());
        resolver.resolve(self.inner.manager.document(), self.inner.host)
    }

    /// Forget the cached Tab-wrap boundaries.
    pub fn invalidate_tabbables(&self) {
        self.inner.state.borrow_mut().boundaries = None;
    }

    /// Reapply focus for the current state.
    pub fn apply_focus(&self) {
        StackOverlay::apply_focus(self.inner.as_ref());
    }

    pub fn backdrop_element(&self) -> NodeId {
        self.inner.manager.backdrop_element()
    }

    // --- Notifications ---

    /// Announce that the overlay may have changed size.
    pub fn notify_resize(&self) {
        self.inner.notify_resize();
    }

    /// Listen to `Canceled`, `Opened` and `Closed` notifications.
    #[must_use = "dropping the subscription disconnects immediately"]
    pub fn on_event(&self, listener: impl Fn(&mut OverlayEvent) + 'static) -> Subscription {
        self.inner.notifications.connect(listener)
    }

    /// Observe every change of `opened`.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_opened(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.opened.subscribe(callback)
    }
}

impl OverlayInner {
    fn document(&self) -> &Document {
        self.manager.document()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TransitionState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    fn setup(&self) {
        let doc = self.document();
        let styled = doc.update_style(self.host, |s| {
            s.outline_none = true;
            s.display = Display::None;
        });
        if let Err(err) = styled {
            tracing::warn!(overlay = self.id.id(), %err, "overlay host not styled");
        }
        self.set_aria_hidden(true);
        self.closing_reason.borrow_mut().set_canceled(false);

        let mut scope = self.subscriptions.borrow_mut();
        let this = self.this.clone();
        scope.subscribe(&self.opened, move |opened| {
            if let Some(inner) = this.upgrade() {
                inner.opened_changed(*opened);
            }
        });
        let this = self.this.clone();
        scope.subscribe(&self.canceled, move |canceled| {
            if let Some(inner) = this.upgrade() {
                inner.closing_reason.borrow_mut().set_canceled(*canceled);
            }
        });
        let this = self.this.clone();
        scope.hold(self.manager.resize_bus().subscribe(move |source| {
            if let Some(inner) = this.upgrade() {
                inner.on_resize(source);
            }
        }));
    }

    fn set_aria_hidden(&self, hidden: bool) {
        let doc = self.document();
        if !hidden {
            doc.remove_attribute(self.host, "aria-hidden");
        } else if let Err(err) = doc.set_attribute(self.host, "aria-hidden", "true") {
            tracing::warn!(overlay = self.id.id(), %err, "aria-hidden not set");
        }
    }

    fn opened_changed(&self, opened: bool) {
        self.set_aria_hidden(!opened);
        if !self.state.borrow().attached {
            tracing::debug!(overlay = self.id.id(), opened, "opened changed while detached");
            return;
        }
        self.with_state(|s| s.animating = true);
        let this = self.this.clone();
        let handle = self
            .manager
            .frames()
            .schedule_once(self.id, move || {
                if let Some(inner) = this.upgrade() {
                    inner.run_transition();
                }
            });
        tracing::debug!(overlay = self.id.id(), opened, frame = handle.id(), "transition scheduled");
    }

    fn run_transition(&self) {
        let opened = self.opened.get();
        let _span = tracing::debug_span!("overlay.transition", overlay = self.id.id(), opened).entered();
        if opened {
            self.prepare_render_opened();
            if let Some(this) = self.this.upgrade() {
                self.manager.add_overlay(this);
            }
            self.apply_focus();
        } else {
            self.manager.remove_overlay(self.id);
            self.apply_focus();
        }
        let hooks = Rc::clone(&*self.hooks.borrow());
        let finish = FinishRender {
            overlay: self.this.clone(),
            opened,
        };
        if opened {
            hooks.render_opened(finish);
        } else {
            hooks.render_closed(finish);
        }
    }

    fn prepare_render_opened(&self) {
        let doc = self.document();
        let restore = self.manager.deep_active_element();
        self.with_state(|s| s.restore_focus = Some(restore));

        let positioned = doc.update_style(self.host, |s| {
            s.transitions_suppressed = true;
            s.display = Display::Default;
        });
        if let Err(err) = positioned {
            tracing::warn!(overlay = self.id.id(), %err, "overlay not shown for positioning");
        }
        self.refit();
        let restored = doc.update_style(self.host, |s| {
            s.transitions_suppressed = false;
            s.display = Display::Default;
        });
        if let Err(err) = restored {
            tracing::warn!(overlay = self.id.id(), %err, "overlay transitions not restored");
        }

        if self.config.get().no_auto_focus {
            let focus_node = self.focus_node();
            if self.manager.deep_active_element() == focus_node {
                doc.blur(focus_node);
                doc.focus(restore);
            }
        }
    }

    fn finish_render_opened(&self) {
        let live = self.with_state(|s| s.animating) && self.opened.get();
        if !live {
            return;
        }
        self.notify_resize();
        self.with_state(|s| s.animating = false);
        tracing::debug!(overlay = self.id.id(), "overlay opened");
        self.emit(OverlayEventKind::Opened);
    }

    fn finish_render_closed(&self) {
        let live = self.with_state(|s| s.animating) && !self.opened.get();
        if !live {
            return;
        }
        let hidden = self.document().update_style(self.host, |s| {
            s.display = Display::None;
            s.z_index = None;
        });
        if let Err(err) = hidden {
            tracing::warn!(overlay = self.id.id(), %err, "overlay host not hidden");
        }
        self.notify_resize();
        self.with_state(|s| s.animating = false);
        let reason = self.closing_reason.borrow().clone();
        tracing::debug!(overlay = self.id.id(), %reason, "overlay closed");
        self.emit(OverlayEventKind::Closed { reason });
    }

    fn emit(&self, kind: OverlayEventKind) -> OverlayEvent {
        let mut event = OverlayEvent::new(self.id, kind);
        self.notifications.emit(&mut event);
        event
    }

    fn cancel(&self, trigger: Option<DomEvent>) -> bool {
        let event = self.emit(OverlayEventKind::Canceled { trigger });
        if event.default_prevented() {
            tracing::debug!(overlay = self.id.id(), "cancel vetoed");
            return false;
        }
        tracing::debug!(overlay = self.id.id(), "overlay canceled");
        self.canceled.set(true);
        self.opened.set(false);
        true
    }

    fn attach(&self) {
        if self.state.borrow().attached {
            return;
        }
        let this = self.this.clone();
        let observer = self.document().observe_nodes(self.host, move |_| {
            if let Some(inner) = this.upgrade() {
                inner.on_nodes_changed();
            }
        });
        self.with_state(|s| {
            s.attached = true;
            s.observer = Some(observer);
        });
        tracing::debug!(overlay = self.id.id(), "overlay attached");
        if self.opened.get() {
            self.opened_changed(true);
        }
    }

    fn detach(&self) {
        let observer = {
            let mut state = self.state.borrow_mut();
            if !state.attached {
                return;
            }
            state.attached = false;
            state.observer.take()
        };
        if let Some(observer) = observer {
            self.document().remove_listener(observer);
        }
        self.manager.frames().cancel(self.id);
        self.manager.remove_overlay(self.id);
        tracing::debug!(overlay = self.id.id(), "overlay detached");

        if self.state.borrow().animating {
            if self.opened.get() {
                self.finish_render_opened();
            } else {
                self.apply_focus();
                self.finish_render_closed();
            }
        }
    }

    fn focus_node(&self) -> NodeId {
        self.state
            .borrow()
            .focused_child
            .or_else(|| self.document().query_attribute(self.host, "autofocus"))
            .unwrap_or(self.host)
    }

    fn tab_boundaries(&self) -> Option<(NodeId, NodeId)> {
        if let Some(boundaries) = self.state.borrow().boundaries {
            return Some(boundaries);
        }
        let resolver = Rc::clone(&*self.resolver.borrow());
        let nodes = resolver.resolve(self.document(), self.host);
        let boundaries = nodes.first().copied().zip(nodes.last().copied());
        self.with_state(|s| s.boundaries = boundaries);
        boundaries
    }

    fn with_backdrop_changed(&self) {
        let doc = self.document();
        let enabled = self.config.get().with_backdrop;
        let added = self.state.borrow().added_tabindex;
        if enabled && !doc.has_attribute(self.host, "tabindex") {
            match doc.set_attribute(self.host, "tabindex", "-1") {
                Ok(()) => self.with_state(|s| s.added_tabindex = true),
                Err(err) => tracing::warn!(overlay = self.id.id(), %err, "tabindex not set"),
            }
        } else if added {
            doc.remove_attribute(self.host, "tabindex");
            self.with_state(|s| s.added_tabindex = false);
        }
        if self.opened.get() && self.state.borrow().attached {
            self.manager.track_backdrop();
        }
    }

    fn refit(&self) {
        let fit = Rc::clone(&*self.fit.borrow());
        fit.refit(self.document(), self.host);
    }

    fn notify_resize(&self) {
        self.manager.resize_bus().notify_resize(self.host);
    }

    fn settled_open(&self) -> bool {
        self.opened.get() && !self.state.borrow().animating
    }

    fn on_resize(&self, source: NodeId) {
        if !self.document().contains(source, self.host) || !self.settled_open() {
            return;
        }
        let this = self.this.clone();
        self.manager
            .frames()
            .schedule_once(self.id, move || {
                if let Some(inner) = this.upgrade() {
                    inner.refit();
                }
            });
    }

    fn on_nodes_changed(&self) {
        if !self.settled_open() {
            return;
        }
        self.with_state(|s| s.boundaries = None);
        self.notify_resize();
    }
}

impl StackOverlay for OverlayInner {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn host(&self) -> NodeId {
        self.host
    }

    fn with_backdrop(&self) -> bool {
        self.config.get().with_backdrop
    }

    fn always_on_top(&self) -> bool {
        self.config.get().always_on_top
    }

    fn allow_click_through(&self) -> bool {
        self.config.get().allow_click_through
    }

    fn on_capture_click(&self, event: &mut DomEvent) {
        if !self.config.get().no_cancel_on_outside_click {
            self.cancel(Some(event.clone()));
        }
    }

    fn on_capture_focus(&self, event: &mut DomEvent) {
        if !self.config.get().with_backdrop {
            return;
        }
        if event.path().contains(&self.host) {
            let target = event.target();
            self.with_state(|s| s.focused_child = target);
        } else {
            event.stop_propagation();
            self.apply_focus();
        }
    }

    fn on_capture_esc(&self, event: &mut DomEvent) {
        if !self.config.get().no_cancel_on_esc_key {
            self.cancel(Some(event.clone()));
        }
    }

    fn on_capture_tab(&self, event: &mut DomEvent) {
        if !self.config.get().with_backdrop {
            return;
        }
        let boundaries = self.tab_boundaries();
        let backward = event.key().is_some_and(|k| k.shift());
        let (leaving, entering) = match boundaries {
            Some((first, last)) if backward => (Some(first), Some(last)),
            Some((first, last)) => (Some(last), Some(first)),
            None => (None, None),
        };
        let wrap = leaving == entering || {
            let focused = self.manager.deep_active_element();
            Some(focused) == leaving || focused == self.host
        };
        if wrap {
            event.prevent_default();
            self.with_state(|s| s.focused_child = entering);
            self.apply_focus();
        }
    }

    fn apply_focus(&self) {
        let doc = self.document();
        if self.opened.get() {
            if !self.config.get().no_auto_focus {
                doc.focus(self.focus_node());
            }
            return;
        }
        let focus_node = self.focus_node();
        doc.blur(focus_node);
        let restore = self.with_state(|s| {
            s.focused_child = None;
            s.restore_focus.take()
        });
        if self.config.get().restore_focus_on_close
            && let Some(node) = restore
        {
            doc.focus(node);
        }
        if let Some(current) = self.manager.current_overlay()
            && current.id() != self.id
        {
            current.apply_focus();
        }
    }
}

impl Drop for OverlayInner {
    fn drop(&mut self) {
        if let Some(observer) = self.state.get_mut().observer.take() {
            self.manager.document().remove_listener(observer);
        }
    }
}
