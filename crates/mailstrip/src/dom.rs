//! Node-level helpers over the parsed document tree.
//!
//! The cascade and the boundary mapper both navigate via parent/sibling links
//! but always delete through the owning tree (`detach`), never through a
//! back-reference.

use ego_tree::{NodeId, NodeRef};
use html_scraper::{ElementRef, Html, Node, Selector};

/// First element matching `selector`, if the selector parses and matches.
pub fn select_first(doc: &Html, selector: &str) -> Option<NodeId> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next().map(|el| el.id())
}

/// All elements matching `selector`, in document order.
pub fn select_all(doc: &Html, selector: &str) -> Vec<NodeId> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    doc.select(&sel).map(|el| el.id()).collect()
}

/// Detach a node (and its subtree) from the owning tree.
pub fn detach(doc: &mut Html, id: NodeId) {
    if let Some(mut node) = doc.tree.get_mut(id) {
        node.detach();
    }
}

/// Outer HTML of an element node. `None` for non-element nodes.
pub fn outer_html(doc: &Html, id: NodeId) -> Option<String> {
    let node = doc.tree.get(id)?;
    ElementRef::wrap(node).map(|el| el.html())
}

pub fn element_name(doc: &Html, id: NodeId) -> Option<String> {
    let node = doc.tree.get(id)?;
    node.value().as_element().map(|el| el.name().to_string())
}

pub fn element_attr(doc: &Html, id: NodeId, name: &str) -> Option<String> {
    let node = doc.tree.get(id)?;
    node.value()
        .as_element()
        .and_then(|el| el.attr(name))
        .map(|v| v.to_string())
}

/// Parent node id, whatever its kind (the document root is a non-element).
pub fn parent(doc: &Html, id: NodeId) -> Option<NodeId> {
    doc.tree.get(id)?.parent().map(|n| n.id())
}

/// Parent, only when it is an element.
pub fn parent_element(doc: &Html, id: NodeId) -> Option<NodeId> {
    let p = doc.tree.get(id)?.parent()?;
    p.value().is_element().then(|| p.id())
}

/// Nearest following sibling that is an element.
pub fn next_element_sibling(doc: &Html, id: NodeId) -> Option<NodeId> {
    let node = doc.tree.get(id)?;
    node.next_siblings()
        .find(|n| n.value().is_element())
        .map(|n| n.id())
}

/// Nearest preceding sibling that is an element.
pub fn prev_element_sibling(doc: &Html, id: NodeId) -> Option<NodeId> {
    let node = doc.tree.get(id)?;
    node.prev_siblings()
        .find(|n| n.value().is_element())
        .map(|n| n.id())
}

/// All following element siblings, in document order. Stops at the end of the
/// current parent; never crosses into ancestor siblings.
pub fn following_element_siblings(doc: &Html, id: NodeId) -> Vec<NodeId> {
    let Some(node) = doc.tree.get(id) else {
        return Vec::new();
    };
    node.next_siblings()
        .filter(|n| n.value().is_element())
        .map(|n| n.id())
        .collect()
}

/// All preceding element siblings, nearest first.
pub fn preceding_element_siblings(doc: &Html, id: NodeId) -> Vec<NodeId> {
    let Some(node) = doc.tree.get(id) else {
        return Vec::new();
    };
    node.prev_siblings()
        .filter(|n| n.value().is_element())
        .map(|n| n.id())
        .collect()
}

/// Element children only.
pub fn element_children(doc: &Html, id: NodeId) -> Vec<NodeId> {
    let Some(node) = doc.tree.get(id) else {
        return Vec::new();
    };
    node.children()
        .filter(|n| n.value().is_element())
        .map(|n| n.id())
        .collect()
}

/// Nearest ancestor (excluding `id` itself) satisfying `pred`.
pub fn closest_ancestor(
    doc: &Html,
    id: NodeId,
    pred: impl Fn(&NodeRef<'_, Node>) -> bool,
) -> Option<NodeId> {
    let node = doc.tree.get(id)?;
    node.ancestors().find(|n| pred(n)).map(|n| n.id())
}

/// Concatenated text content of a node's subtree (its own payload for text
/// nodes).
pub fn node_text(doc: &Html, id: NodeId) -> String {
    let Some(node) = doc.tree.get(id) else {
        return String::new();
    };
    if let Some(t) = node.value().as_text() {
        return t.to_string();
    }
    let mut out = String::new();
    for n in node.descendants() {
        if let Some(t) = n.value().as_text() {
            out.push_str(t);
        }
    }
    out
}

/// Whether the subtree rooted at `id` contains an element matching `selector`.
pub fn has_descendant(doc: &Html, id: NodeId, selector: &str) -> bool {
    let Ok(sel) = Selector::parse(selector) else {
        return false;
    };
    let Some(node) = doc.tree.get(id) else {
        return false;
    };
    let Some(el) = ElementRef::wrap(node) else {
        return false;
    };
    el.select(&sel).next().is_some()
}

/// Whether the element's `class` attribute contains `needle` as a substring.
pub fn class_contains(doc: &Html, id: NodeId, needle: &str) -> bool {
    element_attr(doc, id, "class")
        .map(|c| c.contains(needle))
        .unwrap_or(false)
}

/// Whether the element carries `class` as a whole class token.
pub fn has_class(doc: &Html, id: NodeId, class: &str) -> bool {
    element_attr(doc, id, "class")
        .map(|c| c.split_whitespace().any(|t| t == class))
        .unwrap_or(false)
}
