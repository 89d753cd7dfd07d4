#![forbid(unsafe_code)]

//! Tab-order resolution over the composed tree.
//!
//! [`tabbable_nodes`] returns every node under a container (the container
//! included) that the Tab key can reach, in the order the Tab key reaches
//! them.
//!
//! # Ordering
//!
//! Nodes with a positive `tabindex` come first, ascending; nodes with
//! `tabindex="0"` or no `tabindex` follow. Within each group document order
//! is kept (the sort is stable and only runs when a positive index exists).
//!
//! # Traversal
//!
//! - Invisible elements (`display: none`, `visibility: hidden`, `hidden`)
//!   are skipped together with their subtree.
//! - `tabindex="-1"` removes a node from the result but its descendants are
//!   still visited.
//! - A `<slot>` contributes the nodes assigned to it; a shadow host
//!   contributes its shadow root's children instead of its light children.
//!   Callers only ever see the flattened sequence.
//!
//! The resolver has no side effects. Results are meant to be cached by the
//! caller and invalidated explicitly when content changes.

use crate::dom::{Document, NodeId};

const FORM_CONTROLS: [&str; 5] = ["input", "select", "textarea", "button", "object"];

/// Whether `node` can receive focus at all (ignores visibility).
pub fn is_focusable(doc: &Document, node: NodeId) -> bool {
    let Some(tag) = doc.tag(node) else {
        return false;
    };
    if FORM_CONTROLS.contains(&tag.as_str()) {
        return !doc.has_attribute(node, "disabled");
    }
    match tag.as_str() {
        "a" | "area" if doc.has_attribute(node, "href") => true,
        "iframe" => true,
        _ => doc.has_attribute(node, "tabindex") || doc.has_attribute(node, "contenteditable"),
    }
}

/// Whether `node` is reachable with the Tab key.
pub fn is_tabbable(doc: &Document, node: NodeId) -> bool {
    is_focusable(doc, node) && tab_index(doc, node) != Some(-1) && doc.is_rendered(node)
}

/// Parsed `tabindex` attribute. Unparsable values count as `0`.
fn tab_index(doc: &Document, node: NodeId) -> Option<i32> {
    doc.attribute(node, "tabindex")
        .map(|value| value.trim().parse().unwrap_or(0))
}

/// Effective tab index: `-1` for nodes that cannot take focus.
pub fn normalized_tab_index(doc: &Document, node: NodeId) -> i32 {
    if is_focusable(doc, node) {
        tab_index(doc, node).unwrap_or(0)
    } else {
        -1
    }
}

fn is_visible(doc: &Document, node: NodeId) -> bool {
    doc.style(node).is_some_and(|style| style.is_visible()) && !doc.has_attribute(node, "hidden")
}

/// Ordered tabbable nodes under `container`, `container` included.
pub fn tabbable_nodes(doc: &Document, container: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let needs_sort = collect(doc, container, &mut found);
    if needs_sort {
        found.sort_by_key(|&(_, index)| (index == 0, index));
    }
    found.into_iter().map(|(node, _)| node).collect()
}

/// Push tabbable nodes in composed-tree order; returns whether any had a
/// positive index.
fn collect(doc: &Document, node: NodeId, out: &mut Vec<(NodeId, i32)>) -> bool {
    if !doc.is_element(node) || !is_visible(doc, node) {
        return false;
    }
    let index = normalized_tab_index(doc, node);
    let mut needs_sort = index > 0;
    if index >= 0 {
        out.push((node, index));
    }

    let children = if doc.tag(node).as_deref() == Some("slot") {
        doc.assigned_nodes(node)
    } else if let Some(root) = doc.shadow_root(node) {
        doc.children(root)
    } else {
        doc.children(node)
    };
    for child in children {
        needs_sort |= collect(doc, child, out);
    }
    needs_sort
}

/// Strategy for finding the focus-wrap targets of a container.
pub trait FocusResolver {
    /// Ordered tabbable nodes under `container`.
    fn resolve(&self, doc: &Document, container: NodeId) -> Vec<NodeId>;
}

/// The default resolver: full tab-order resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabOrderResolver;

impl FocusResolver for TabOrderResolver {
    fn resolve(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        tabbable_nodes(doc, container)
    }
}

impl<F> FocusResolver for F
where
    F: Fn(&Document, NodeId) -> Vec<NodeId>,
{
    fn resolve(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        self(doc, container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Display;
    use proptest::prelude::*;

    fn child(doc: &Document, parent: NodeId, tag: &str) -> NodeId {
        doc.create_child(parent, tag).unwrap()
    }

    #[test]
    fn focusable_rules() {
        let doc = Document::new();
        let body = doc.body();
        let input = child(&doc, body, "input");
        let disabled = child(&doc, body, "button");
        doc.set_attribute(disabled, "disabled", "").unwrap();
        let link = child(&doc, body, "a");
        let anchor = child(&doc, body, "a");
        doc.set_attribute(link, "href", "#").unwrap();
        let div = child(&doc, body, "div");
        let tab_div = child(&doc, body, "div");
        doc.set_attribute(tab_div, "tabindex", "0").unwrap();
        let editable = child(&doc, body, "p");
        doc.set_attribute(editable, "contenteditable", "true").unwrap();
        let frame = child(&doc, body, "iframe");

        assert!(is_focusable(&doc, input));
        assert!(!is_focusable(&doc, disabled));
        assert!(is_focusable(&doc, link));
        assert!(!is_focusable(&doc, anchor));
        assert!(!is_focusable(&doc, div));
        assert!(is_focusable(&doc, tab_div));
        assert!(is_focusable(&doc, editable));
        assert!(is_focusable(&doc, frame));
    }

    #[test]
    fn disabled_button_with_tabindex_is_not_focusable() {
        let doc = Document::new();
        let b = child(&doc, doc.body(), "button");
        doc.set_attribute(b, "tabindex", "3").unwrap();
        doc.set_attribute(b, "disabled", "").unwrap();
        assert!(!is_focusable(&doc, b));
        assert_eq!(normalized_tab_index(&doc, b), -1);
    }

    #[test]
    fn document_order_without_positive_indices() {
        let doc = Document::new();
        let container = child(&doc, doc.body(), "div");
        let a = child(&doc, container, "button");
        let wrapper = child(&doc, container, "div");
        let b = child(&doc, wrapper, "input");
        let c = child(&doc, container, "textarea");
        assert_eq!(tabbable_nodes(&doc, container), vec![a, b, c]);
    }

    #[test]
    fn positive_indices_first_then_document_order() {
        let doc = Document::new();
        let container = child(&doc, doc.body(), "div");
        let zero = child(&doc, container, "button");
        let three = child(&doc, container, "button");
        doc.set_attribute(three, "tabindex", "3").unwrap();
        let one = child(&doc, container, "button");
        doc.set_attribute(one, "tabindex", "1").unwrap();
        let explicit_zero = child(&doc, container, "div");
        doc.set_attribute(explicit_zero, "tabindex", "0").unwrap();
        let also_one = child(&doc, container, "input");
        doc.set_attribute(also_one, "tabindex", "1").unwrap();

        assert_eq!(
            tabbable_nodes(&doc, container),
            vec![one, also_one, three, zero, explicit_zero]
        );
    }

    #[test]
    fn container_included_when_tabbable() {
        let doc = Document::new();
        let container = child(&doc, doc.body(), "div");
        doc.set_attribute(container, "tabindex", "0").unwrap();
        let inner = child(&doc, container, "button");
        assert_eq!(tabbable_nodes(&doc, container), vec![container, inner]);
    }

    #[test]
    fn negative_tabindex_skips_node_but_not_children() {
        let doc = Document::new();
        let container = child(&doc, doc.body(), "div");
        doc.set_attribute(container, "tabindex", "-1").unwrap();
        let inner = child(&doc, container, "button");
        let excluded = child(&doc, container, "button");
        doc.set_attribute(excluded, "tabindex", "-1").unwrap();
        assert_eq!(tabbable_nodes(&doc, container), vec![inner]);
        assert!(!is_tabbable(&doc, container));
        assert!(is_focusable(&doc, container));
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let doc = Document::new();
        let container = child(&doc, doc.body(), "div");
        let shown = child(&doc, container, "button");
        let none = child(&doc, container, "div");
        doc.update_style(none, |s| s.display = Display::None).unwrap();
        let _inside_none = child(&doc, none, "button");
        let invisible = child(&doc, container, "button");
        doc.update_style(invisible, |s| s.visibility_hidden = true).unwrap();
        let attr_hidden = child(&doc, container, "div");
        doc.set_attribute(attr_hidden, "hidden", "").unwrap();
        let _inside_hidden = child(&doc, attr_hidden, "input");

        assert_eq!(tabbable_nodes(&doc, container), vec![shown]);
    }

    #[test]
    fn shadow_content_replaces_light_children() {
        // <test-buttons>: button0, button1, <slot>, button2 in the shadow tree,
        // with one light child slotted between button1 and button2.
        let doc = Document::new();
        let host = child(&doc, doc.body(), "test-buttons");
        let root = doc.attach_shadow(host).unwrap();
        let b0 = child(&doc, root, "button");
        let b1 = child(&doc, root, "button");
        let _slot = child(&doc, root, "slot");
        let b2 = child(&doc, root, "button");
        let slotted = child(&doc, host, "input");

        assert_eq!(tabbable_nodes(&doc, host), vec![b0, b1, slotted, b2]);
    }

    #[test]
    fn nested_shadow_hosts_are_flattened() {
        let doc = Document::new();
        let wrapper = child(&doc, doc.body(), "test-buttons-wrapper");
        let wrapper_root = doc.attach_shadow(wrapper).unwrap();
        let select = child(&doc, wrapper_root, "select");
        let inner = child(&doc, wrapper_root, "test-buttons");
        let _wrapper_slot = child(&doc, inner, "slot");
        let focusable_div = child(&doc, wrapper_root, "div");
        doc.set_attribute(focusable_div, "tabindex", "0").unwrap();

        let inner_root = doc.attach_shadow(inner).unwrap();
        let b0 = child(&doc, inner_root, "button");
        let _inner_slot = child(&doc, inner_root, "slot");
        let b1 = child(&doc, inner_root, "button");

        let light = child(&doc, wrapper, "button");

        assert_eq!(
            tabbable_nodes(&doc, wrapper),
            vec![select, b0, light, b1, focusable_div]
        );
    }

    #[test]
    fn unparsable_tabindex_counts_as_zero() {
        let doc = Document::new();
        let div = child(&doc, doc.body(), "div");
        doc.set_attribute(div, "tabindex", "soon").unwrap();
        assert_eq!(normalized_tab_index(&doc, div), 0);
        assert!(is_tabbable(&doc, div));
    }

    #[test]
    fn closure_resolver() {
        let doc = Document::new();
        let a = child(&doc, doc.body(), "button");
        let first_only = |d: &Document, c: NodeId| -> Vec<NodeId> {
            tabbable_nodes(d, c).into_iter().take(1).collect()
        };
        let _b = child(&doc, doc.body(), "button");
        assert_eq!(first_only.resolve(&doc, doc.body()), vec![a]);
        assert_eq!(TabOrderResolver.resolve(&doc, doc.body()).len(), 2);
    }

    proptest! {
        #[test]
        fn prop_order_is_positive_ascending_then_zero(
            indices in prop::collection::vec(prop::option::of(-1i32..4), 0..12)
        ) {
            let doc = Document::new();
            let container = child(&doc, doc.body(), "div");
            for index in &indices {
                let b = child(&doc, container, "button");
                if let Some(i) = index {
                    doc.set_attribute(b, "tabindex", &i.to_string()).unwrap();
                }
            }
            let order: Vec<i32> = tabbable_nodes(&doc, container)
                .into_iter()
                .map(|n| normalized_tab_index(&doc, n))
                .collect();

            let expected_len = indices.iter().filter(|i| **i != Some(-1)).count();
            prop_assert_eq!(order.len(), expected_len);
            for pair in order.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let in_order = match (a, b) {
                    (0, 0) => true,
                    (0, _) => false,
                    (_, 0) => true,
                    (a, b) => a <= b,
                };
                prop_assert!(in_order, "{:?} out of order", order);
            }
        }
    }
}
