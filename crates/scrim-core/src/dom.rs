#![forbid(unsafe_code)]

//! Shareable document tree with shadow roots, slots, and a single focus owner.
//!
//! A [`Document`] is a cheap-to-clone handle (`Rc<RefCell<..>>`) so overlays,
//! the overlay manager, and test code can all hold it at once. Nodes are
//! addressed by [`NodeId`] and never freed; removing a node only detaches it.
//!
//! # Composed tree
//!
//! Each element may host one shadow root. A `<slot>` inside a shadow tree
//! receives the host's light children whose `slot` attribute matches the
//! slot's `name` (unnamed slots take children without a `slot` attribute).
//! [`Document::composed_parent`] walks from a slotted child to its slot and
//! from a shadow root to its host, which is the path events travel.
//!
//! # Invariants
//!
//! 1. At most one node is focused; [`Document::active_element`] retargets it
//!    to the light tree and falls back to `body`.
//! 2. No internal borrow is held while listeners or observers run, so they
//!    may freely re-enter the document (including focusing nodes).
//! 3. Capture listeners run in registration order until one stops
//!    propagation.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown node | Id from another document | `DomError::UnknownNode` / `None` |
//! | Cycle | Appending an ancestor under its descendant | `DomError::HierarchyCycle` |
//! | Focus refused | Hidden, disabled, detached, or not focusable | `focus()` returns `false` |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::event::{DomEvent, EventKind, KeyCode, KeyEvent};
use crate::focusables;

thread_local! {
    static GLOBAL_DOCUMENT: Document = Document::new();
}

/// Identifier of a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw index of the node.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Handle for a registered listener or observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Structural errors from tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node does not belong to this document.
    UnknownNode(NodeId),
    /// The operation needs an element but got a shadow root.
    NotAnElement(NodeId),
    /// Appending would make a node its own ancestor.
    HierarchyCycle { parent: NodeId, child: NodeId },
    /// The host already has a shadow root.
    ShadowRootExists(NodeId),
    /// `child` is not a child of `parent`.
    NotAChild { parent: NodeId, child: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "unknown node #{}", node.0),
            Self::NotAnElement(node) => write!(f, "node #{} is not an element", node.0),
            Self::HierarchyCycle { parent, child } => write!(
                f,
                "cannot append node #{} under its descendant #{}",
                child.0, parent.0
            ),
            Self::ShadowRootExists(node) => {
                write!(f, "node #{} already hosts a shadow root", node.0)
            }
            Self::NotAChild { parent, child } => {
                write!(f, "node #{} is not a child of #{}", child.0, parent.0)
            }
        }
    }
}

impl std::error::Error for DomError {}

/// `display` values the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Default,
    None,
}

/// Inline style of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub display: Display,
    pub visibility_hidden: bool,
    pub z_index: Option<i32>,
    pub outline_none: bool,
    /// Transitions and transforms disabled (used while positioning).
    pub transitions_suppressed: bool,
}

impl Style {
    /// Whether the element itself is displayed and visible.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.display != Display::None && !self.visibility_hidden
    }
}

#[derive(Debug)]
enum NodeKind {
    Element { tag: String },
    ShadowRoot { host: NodeId },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: AHashMap<String, String>,
    style: Style,
    shadow_root: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: AHashMap::new(),
            style: Style::default(),
            shadow_root: None,
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::ShadowRoot { .. } => None,
        }
    }
}

type CaptureListener = Rc<dyn Fn(&mut DomEvent)>;
type MutationObserver = Rc<dyn Fn(NodeId)>;

struct DocumentInner {
    nodes: Vec<NodeData>,
    body: NodeId,
    focused: Option<NodeId>,
    next_listener: u64,
    capture_listeners: Vec<(ListenerId, EventKind, CaptureListener)>,
    observers: Vec<(ListenerId, NodeId, MutationObserver)>,
}

impl DocumentInner {
    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn check(&self, node: NodeId) -> Result<&NodeData, DomError> {
        self.get(node).ok_or(DomError::UnknownNode(node))
    }

    fn check_element(&self, node: NodeId) -> Result<&NodeData, DomError> {
        let data = self.check(node)?;
        match data.kind {
            NodeKind::Element { .. } => Ok(data),
            NodeKind::ShadowRoot { .. } => Err(DomError::NotAnElement(node)),
        }
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Root of the light tree containing `node`.
    fn tree_root(&self, mut node: NodeId) -> NodeId {
        while let Some(parent) = self.get(node).and_then(|d| d.parent) {
            node = parent;
        }
        node
    }

    fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        match self.get(node)?.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            NodeKind::Element { .. } => None,
        }
    }

    /// Light descendants of `root` in preorder, `root` excluded.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(root) {
            Some(data) => data.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(data) = self.get(node) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    fn slot_name<'a>(&'a self, node: NodeId, attribute: &str) -> &'a str {
        self.get(node)
            .and_then(|d| d.attributes.get(attribute))
            .map_or("", String::as_str)
    }

    /// The slot a light child of a shadow host is distributed into.
    fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.get(node)?.parent?;
        let root = self.get(parent)?.shadow_root?;
        let wanted = self.slot_name(node, "slot");
        self.descendants(root).into_iter().find(|&candidate| {
            self.get(candidate).and_then(NodeData::tag) == Some("slot")
                && self.slot_name(candidate, "name") == wanted
        })
    }

    fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        if self.get(slot).and_then(NodeData::tag) != Some("slot") {
            return Vec::new();
        }
        let Some(host) = self.shadow_host(self.tree_root(slot)) else {
            return Vec::new();
        };
        let Some(host_data) = self.get(host) else {
            return Vec::new();
        };
        host_data
            .children
            .iter()
            .copied()
            .filter(|&child| self.assigned_slot(child) == Some(slot))
            .collect()
    }

    fn composed_parent(&self, node: NodeId) -> Option<NodeId> {
        let data = self.get(node)?;
        match data.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            NodeKind::Element { .. } => {
                let parent = data.parent?;
                if self.get(parent)?.shadow_root.is_some()
                    && let Some(slot) = self.assigned_slot(node)
                {
                    return Some(slot);
                }
                Some(parent)
            }
        }
    }

    fn composed_path(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        if self.get(node).is_none() {
            return path;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            path.push(n);
            current = self.composed_parent(n);
        }
        path
    }

    fn is_rendered(&self, node: NodeId) -> bool {
        self.composed_path(node).into_iter().all(|n| {
            self.get(n).is_some_and(|d| {
                d.style.is_visible() && !d.attributes.contains_key("hidden")
            })
        })
    }

    /// Retarget `node` until it lives in the tree rooted at `scope`.
    fn retarget(&self, mut node: NodeId, scope: NodeId) -> Option<NodeId> {
        loop {
            let root = self.tree_root(node);
            if root == scope {
                return Some(node);
            }
            node = self.shadow_host(root)?;
        }
    }
}

/// Shared handle to a document tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("focused", &inner.focused)
            .finish()
    }
}

impl Document {
    /// Create a document containing only `body`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                nodes: vec![NodeData::new(NodeKind::Element {
                    tag: "body".to_string(),
                })],
                body: NodeId(0),
                focused: None,
                next_listener: 1,
                capture_listeners: Vec::new(),
                observers: Vec::new(),
            })),
        }
    }

    /// Access the global document (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_DOCUMENT.with(Clone::clone)
    }

    /// Whether both handles refer to the same document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    // --- Tree structure ---

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len() as u32);
        inner.nodes.push(NodeData::new(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        }));
        id
    }

    /// Create an element and append it under `parent`.
    pub fn create_child(&self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let old_parent = {
            let mut inner = self.inner.borrow_mut();
            inner.check(parent)?;
            inner.check_element(child)?;
            if inner.composed_path(parent).contains(&child) {
                return Err(DomError::HierarchyCycle { parent, child });
            }
            let old_parent = inner.get(child).and_then(|d| d.parent);
            if let Some(old) = old_parent
                && let Some(data) = inner.get_mut(old)
            {
                data.children.retain(|&c| c != child);
            }
            if let Some(data) = inner.get_mut(child) {
                data.parent = Some(parent);
            }
            if let Some(data) = inner.get_mut(parent) {
                data.children.push(child);
            }
            old_parent
        };
        if let Some(old) = old_parent
            && old != parent
        {
            self.notify_mutation(old);
        }
        self.notify_mutation(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Focus inside the removed subtree is lost.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.check(parent)?;
            if inner.check(child)?.parent != Some(parent) {
                return Err(DomError::NotAChild { parent, child });
            }
            if let Some(data) = inner.get_mut(parent) {
                data.children.retain(|&c| c != child);
            }
            if let Some(data) = inner.get_mut(child) {
                data.parent = None;
            }
            if let Some(focused) = inner.focused
                && inner.composed_path(focused).contains(&child)
            {
                inner.focused = None;
            }
        }
        self.notify_mutation(parent);
        Ok(())
    }

    /// Attach a shadow root to `host`, returning the root.
    pub fn attach_shadow(&self, host: NodeId) -> Result<NodeId, DomError> {
        let mut inner = self.inner.borrow_mut();
        if inner.check_element(host)?.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let root = NodeId(inner.nodes.len() as u32);
        inner.nodes.push(NodeData::new(NodeKind::ShadowRoot { host }));
        if let Some(data) = inner.get_mut(host) {
            data.shadow_root = Some(root);
        }
        Ok(root)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.inner.borrow().get(host)?.shadow_root
    }

    /// Host of a shadow root, `None` for elements.
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        self.inner.borrow().shadow_host(root)
    }

    /// Lowercase tag name; `None` for shadow roots and unknown nodes.
    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().get(node)?.tag().map(str::to_string)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.inner.borrow().get(node).is_some_and(|d| d.tag().is_some())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().get(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .get(node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    /// Nodes distributed into a `<slot>`.
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        self.inner.borrow().assigned_nodes(slot)
    }

    /// Parent in the composed tree (slot for slotted nodes, host for roots).
    pub fn composed_parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().composed_parent(node)
    }

    /// Event path from `node` outward through slots and shadow hosts.
    pub fn composed_path(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.borrow().composed_path(node)
    }

    /// Whether `node` is `ancestor` or lies beneath it in the composed tree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().composed_path(node).contains(&ancestor)
    }

    /// Whether `node` is reachable from `body`.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let inner = self.inner.borrow();
        inner.composed_path(node).last() == Some(&inner.body)
    }

    /// Whether `node` and all of its composed ancestors are displayed.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.inner.borrow().is_rendered(node)
    }

    /// First light descendant of `root` carrying `attribute`.
    ///
    /// Does not descend into shadow roots.
    pub fn query_attribute(&self, root: NodeId, attribute: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .descendants(root)
            .into_iter()
            .find(|&n| inner.get(n).is_some_and(|d| d.attributes.contains_key(attribute)))
    }

    // --- Attributes and style ---

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_element(node)?;
        if let Some(data) = inner.get_mut(node) {
            data.attributes.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .borrow_mut()
            .get_mut(node)
            .is_some_and(|d| d.attributes.remove(name).is_some())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.borrow().get(node)?.attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .borrow()
            .get(node)
            .is_some_and(|d| d.attributes.contains_key(name))
    }

    pub fn style(&self, node: NodeId) -> Option<Style> {
        Some(self.inner.borrow().get(node)?.style)
    }

    pub fn update_style(&self, node: NodeId, f: impl FnOnce(&mut Style)) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.get_mut(node).ok_or(DomError::UnknownNode(node))?;
        f(&mut data.style);
        Ok(())
    }

    // --- Focus ---

    /// The innermost focused node, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().focused
    }

    /// The focused node retargeted to the document's light tree, or `body`.
    pub fn active_element(&self) -> NodeId {
        let inner = self.inner.borrow();
        inner
            .focused
            .and_then(|f| inner.retarget(f, inner.body))
            .unwrap_or(inner.body)
    }

    /// The focused node as seen from inside `host`'s shadow root.
    pub fn shadow_active_element(&self, host: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let root = inner.get(host)?.shadow_root?;
        inner.retarget(inner.focused?, root)
    }

    /// Move focus to `node`. Best-effort: returns `false` when refused.
    ///
    /// Dispatches a `FocusIn` event when focus actually changes.
    pub fn focus(&self, node: NodeId) -> bool {
        if !self.is_element(node)
            || !self.is_connected(node)
            || !self.is_rendered(node)
            || !focusables::is_focusable(self, node)
        {
            #[cfg(feature = "tracing")]
            tracing::trace!(node = node.0, "focus refused");
            return false;
        }
        let path = {
            let mut inner = self.inner.borrow_mut();
            if inner.focused == Some(node) {
                return true;
            }
            inner.focused = Some(node);
            inner.composed_path(node)
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(node = node.0, "focus moved");
        self.dispatch(DomEvent::focus_in(path));
        true
    }

    /// Remove focus from `node` if it is the focused node.
    pub fn blur(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if inner.focused == Some(node) {
            inner.focused = None;
        }
    }

    // --- Events ---

    /// Register a capture-phase listener for `kind`.
    pub fn add_capture_listener(
        &self,
        kind: EventKind,
        listener: impl Fn(&mut DomEvent) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id();
        inner.capture_listeners.push((id, kind, Rc::new(listener)));
        id
    }

    /// Observe child-list mutations at or beneath `node`.
    pub fn observe_nodes(&self, node: NodeId, observer: impl Fn(NodeId) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id();
        inner.observers.push((id, node, Rc::new(observer)));
        id
    }

    /// Remove a listener or observer, returning whether it existed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.capture_listeners.len() + inner.observers.len();
        inner.capture_listeners.retain(|(l, _, _)| *l != id);
        inner.observers.retain(|(l, _, _)| *l != id);
        before != inner.capture_listeners.len() + inner.observers.len()
    }

    /// Run capture listeners for `event`, returning it after dispatch.
    pub fn dispatch(&self, mut event: DomEvent) -> DomEvent {
        let listeners: Vec<CaptureListener> = self
            .inner
            .borrow()
            .capture_listeners
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind())
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&mut event);
            if event.propagation_stopped() {
                break;
            }
        }
        event
    }

    /// Click `target`; unless prevented, focus the nearest focusable node in
    /// its path (or drop focus when there is none).
    pub fn click(&self, target: NodeId) -> DomEvent {
        let path = self.composed_path(target);
        let event = self.dispatch(DomEvent::click(path));
        if !event.default_prevented() {
            let focusable = event
                .path()
                .iter()
                .copied()
                .find(|&n| focusables::is_focusable(self, n));
            match focusable {
                Some(node) => {
                    self.focus(node);
                }
                None => self.inner.borrow_mut().focused = None,
            }
        }
        event
    }

    /// Press a key at the focused node; unless prevented, Tab performs
    /// sequential focus navigation.
    pub fn key_down(&self, key: KeyEvent) -> DomEvent {
        let target = self.focused().unwrap_or_else(|| self.body());
        let path = self.composed_path(target);
        let event = self.dispatch(DomEvent::key_down(path, key));
        if !event.default_prevented() && key.code == KeyCode::Tab {
            self.navigate_sequential(key.shift());
        }
        event
    }

    /// Move focus to the next (or previous) tabbable node in the document.
    /// Past either end focus leaves the document.
    fn navigate_sequential(&self, backward: bool) {
        let order = focusables::tabbable_nodes(self, self.body());
        let position = self
            .focused()
            .and_then(|f| order.iter().position(|&n| n == f));
        let next = match (position, backward) {
            (None, false) => order.first().copied(),
            (None, true) => order.last().copied(),
            (Some(i), false) => order.get(i + 1).copied(),
            (Some(i), true) => i.checked_sub(1).and_then(|i| order.get(i).copied()),
        };
        match next {
            Some(node) => {
                self.focus(node);
            }
            None => self.inner.borrow_mut().focused = None,
        }
    }

    fn notify_mutation(&self, changed: NodeId) {
        let observers: Vec<MutationObserver> = {
            let inner = self.inner.borrow();
            let path = inner.composed_path(changed);
            inner
                .observers
                .iter()
                .filter(|(_, observed, _)| path.contains(observed))
                .map(|(_, _, observer)| Rc::clone(observer))
                .collect()
        };
        for observer in observers {
            observer(changed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Modifiers;
    use std::cell::Cell;

    fn button(doc: &Document, parent: NodeId) -> NodeId {
        doc.create_child(parent, "button").unwrap()
    }

    #[test]
    fn new_document_has_body_focused_by_default() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.body()).as_deref(), Some("body"));
        assert_eq!(doc.active_element(), doc.body());
        assert!(doc.focused().is_none());
    }

    #[test]
    fn append_moves_between_parents() {
        let doc = Document::new();
        let a = doc.create_child(doc.body(), "div").unwrap();
        let b = doc.create_child(doc.body(), "div").unwrap();
        let c = doc.create_child(a, "span").unwrap();
        doc.append_child(b, c).unwrap();
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), vec![c]);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn append_rejects_cycles() {
        let doc = Document::new();
        let a = doc.create_child(doc.body(), "div").unwrap();
        let b = doc.create_child(a, "div").unwrap();
        assert_eq!(
            doc.append_child(b, a),
            Err(DomError::HierarchyCycle { parent: b, child: a })
        );
        assert!(doc.append_child(a, a).is_err());
    }

    #[test]
    fn remove_child_requires_parentage() {
        let doc = Document::new();
        let a = doc.create_child(doc.body(), "div").unwrap();
        let b = doc.create_element("div");
        assert_eq!(
            doc.remove_child(a, b),
            Err(DomError::NotAChild { parent: a, child: b })
        );
    }

    #[test]
    fn unknown_node_errors() {
        let doc = Document::new();
        let other = Document::new();
        let _ = other.create_element("div");
        let missing = other.create_element("div");
        assert_eq!(
            doc.set_attribute(missing, "x", "y"),
            Err(DomError::UnknownNode(missing))
        );
        assert!(doc.tag(missing).is_none());
        assert!(!doc.focus(missing));
    }

    #[test]
    fn shadow_root_cannot_be_attached_twice() {
        let doc = Document::new();
        let host = doc.create_child(doc.body(), "x-host").unwrap();
        let root = doc.attach_shadow(host).unwrap();
        assert_eq!(doc.shadow_host(root), Some(host));
        assert_eq!(doc.attach_shadow(host), Err(DomError::ShadowRootExists(host)));
        assert!(doc.append_child(host, root).is_err());
    }

    #[test]
    fn slotted_children_route_through_slot() {
        let doc = Document::new();
        let host = doc.create_child(doc.body(), "x-host").unwrap();
        let root = doc.attach_shadow(host).unwrap();
        let wrapper = doc.create_child(root, "div").unwrap();
        let slot = doc.create_child(wrapper, "slot").unwrap();
        let named = doc.create_child(root, "slot").unwrap();
        doc.set_attribute(named, "name", "footer").unwrap();

        let light = button(&doc, host);
        let footer = button(&doc, host);
        doc.set_attribute(footer, "slot", "footer").unwrap();

        assert_eq!(doc.assigned_nodes(slot), vec![light]);
        assert_eq!(doc.assigned_nodes(named), vec![footer]);
        assert_eq!(
            doc.composed_path(light),
            vec![light, slot, wrapper, root, host, doc.body()]
        );
        assert!(doc.contains(host, light));
        assert!(doc.contains(wrapper, light));
    }

    #[test]
    fn focus_refuses_hidden_disabled_and_detached() {
        let doc = Document::new();
        let hidden = button(&doc, doc.body());
        doc.update_style(hidden, |s| s.display = Display::None).unwrap();
        let disabled = button(&doc, doc.body());
        doc.set_attribute(disabled, "disabled", "").unwrap();
        let detached = doc.create_element("button");
        let plain = doc.create_child(doc.body(), "div").unwrap();

        assert!(!doc.focus(hidden));
        assert!(!doc.focus(disabled));
        assert!(!doc.focus(detached));
        assert!(!doc.focus(plain));
        assert!(doc.focused().is_none());
    }

    #[test]
    fn hidden_ancestor_blocks_focus() {
        let doc = Document::new();
        let wrapper = doc.create_child(doc.body(), "div").unwrap();
        let inner = button(&doc, wrapper);
        doc.set_attribute(wrapper, "hidden", "").unwrap();
        assert!(!doc.focus(inner));
        doc.remove_attribute(wrapper, "hidden");
        assert!(doc.focus(inner));
    }

    #[test]
    fn active_element_retargets_through_shadow_roots() {
        let doc = Document::new();
        let outer = doc.create_child(doc.body(), "x-outer").unwrap();
        let outer_root = doc.attach_shadow(outer).unwrap();
        let inner_host = doc.create_child(outer_root, "x-inner").unwrap();
        let inner_root = doc.attach_shadow(inner_host).unwrap();
        let target = button(&doc, inner_root);

        assert!(doc.focus(target));
        assert_eq!(doc.active_element(), outer);
        assert_eq!(doc.shadow_active_element(outer), Some(inner_host));
        assert_eq!(doc.shadow_active_element(inner_host), Some(target));
        assert_eq!(doc.focused(), Some(target));
    }

    #[test]
    fn focus_dispatches_focus_in_once() {
        let doc = Document::new();
        let target = button(&doc, doc.body());
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        doc.add_capture_listener(EventKind::FocusIn, move |event| {
            assert_eq!(event.target(), Some(target));
            seen.set(seen.get() + 1);
        });
        assert!(doc.focus(target));
        assert!(doc.focus(target));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn stop_propagation_skips_later_listeners() {
        let doc = Document::new();
        let calls = Rc::new(Cell::new(0));
        doc.add_capture_listener(EventKind::Click, |event| event.stop_propagation());
        let seen = Rc::clone(&calls);
        doc.add_capture_listener(EventKind::Click, move |_| seen.set(seen.get() + 1));
        doc.click(doc.body());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn listener_may_refocus_during_dispatch() {
        let doc = Document::new();
        let a = button(&doc, doc.body());
        let b = button(&doc, doc.body());
        let handle = doc.clone();
        doc.add_capture_listener(EventKind::FocusIn, move |event| {
            if event.target() == Some(b) {
                handle.focus(a);
            }
        });
        doc.focus(b);
        assert_eq!(doc.focused(), Some(a));
    }

    #[test]
    fn remove_listener_stops_delivery() {
        let doc = Document::new();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let id = doc.add_capture_listener(EventKind::Click, move |_| seen.set(seen.get() + 1));
        doc.click(doc.body());
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        doc.click(doc.body());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn click_focuses_nearest_focusable() {
        let doc = Document::new();
        let b = button(&doc, doc.body());
        let label = doc.create_child(b, "span").unwrap();
        doc.click(label);
        assert_eq!(doc.focused(), Some(b));
        doc.click(doc.body());
        assert!(doc.focused().is_none());
    }

    #[test]
    fn tab_walks_document_and_leaves_at_end() {
        let doc = Document::new();
        let a = button(&doc, doc.body());
        let b = button(&doc, doc.body());
        let tab = KeyEvent::new(KeyCode::Tab);
        let shift_tab = tab.with_modifiers(Modifiers::SHIFT);

        doc.key_down(tab);
        assert_eq!(doc.focused(), Some(a));
        doc.key_down(tab);
        assert_eq!(doc.focused(), Some(b));
        doc.key_down(tab);
        assert!(doc.focused().is_none());
        doc.key_down(shift_tab);
        assert_eq!(doc.focused(), Some(b));
    }

    #[test]
    fn prevented_tab_keeps_focus() {
        let doc = Document::new();
        let a = button(&doc, doc.body());
        let _b = button(&doc, doc.body());
        doc.add_capture_listener(EventKind::KeyDown, |event| event.prevent_default());
        doc.focus(a);
        let event = doc.key_down(KeyEvent::new(KeyCode::Tab));
        assert!(event.default_prevented());
        assert_eq!(doc.focused(), Some(a));
    }

    #[test]
    fn removing_focused_subtree_drops_focus() {
        let doc = Document::new();
        let wrapper = doc.create_child(doc.body(), "div").unwrap();
        let b = button(&doc, wrapper);
        doc.focus(b);
        doc.remove_child(doc.body(), wrapper).unwrap();
        assert!(doc.focused().is_none());
        assert!(!doc.is_connected(b));
    }

    #[test]
    fn observers_see_mutations_beneath_node() {
        let doc = Document::new();
        let container = doc.create_child(doc.body(), "div").unwrap();
        let nested = doc.create_child(container, "div").unwrap();
        let sibling = doc.create_child(doc.body(), "div").unwrap();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        doc.observe_nodes(container, move |_| seen.set(seen.get() + 1));

        doc.create_child(nested, "span").unwrap();
        doc.create_child(sibling, "span").unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn query_attribute_skips_shadow_content() {
        let doc = Document::new();
        let host = doc.create_child(doc.body(), "x-host").unwrap();
        let root = doc.attach_shadow(host).unwrap();
        let shadow_input = doc.create_child(root, "input").unwrap();
        doc.set_attribute(shadow_input, "autofocus", "").unwrap();
        assert_eq!(doc.query_attribute(host, "autofocus"), None);

        let light = doc.create_child(host, "input").unwrap();
        doc.set_attribute(light, "autofocus", "").unwrap();
        assert_eq!(doc.query_attribute(host, "autofocus"), Some(light));
    }

    #[test]
    fn global_document_is_shared() {
        assert!(Document::global().ptr_eq(&Document::global()));
        assert!(!Document::global().ptr_eq(&Document::new()));
    }

    #[test]
    fn dom_error_display() {
        let err = DomError::NotAChild {
            parent: NodeId(1),
            child: NodeId(2),
        };
        assert_eq!(err.to_string(), "node #2 is not a child of #1");
    }
}
