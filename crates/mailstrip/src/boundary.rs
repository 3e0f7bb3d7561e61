//! The boundary mapper: locate a matched quote header inside the document
//! tree and prune everything from that point onward.
//!
//! Offsets are unreliable across markup-normalized text, so the mapper never
//! tracks character positions through parsing. Both the matched substring and
//! the document's text are reduced to a "cleared" form (angle brackets, quote
//! markers and whitespace deleted) and compared by containment.

use ego_tree::NodeId;
use html_scraper::Html;

use crate::dom;

/// Delete quote markers, angle brackets and whitespace so two renderings of
/// the same words compare equal despite markup and line-wrap noise.
pub fn cleared_text(s: &str) -> String {
    let cleared: String = s
        .chars()
        .filter(|c| !matches!(c, '>' | '<' | ' ' | '\n' | '\r' | '\t' | '\u{a0}'))
        .collect();
    cleared.trim().to_string()
}

/// First text leaf, in document order, whose accumulated cleared content
/// contains `lookup`. This tie-break (first containment wins) is part of the
/// algorithm's contract.
fn find_anchor(doc: &Html, lookup: &str) -> Option<NodeId> {
    let mut content = String::new();
    for node in doc.tree.root().descendants() {
        if let Some(t) = node.value().as_text() {
            let text: &str = t;
            if text.is_empty() {
                continue;
            }
            content.push_str(&cleared_text(text));
            if content.contains(lookup) {
                return Some(node.id());
            }
        }
    }
    None
}

fn record_and_detach(doc: &mut Html, removed: &mut Vec<String>, id: NodeId) {
    if let Some(html) = dom::outer_html(doc, id) {
        removed.push(html);
    }
    dom::detach(doc, id);
}

fn is_root_container(doc: &Html, id: NodeId) -> bool {
    matches!(
        dom::element_name(doc, id).as_deref(),
        Some("html") | Some("body")
    )
}

/// Map `matched` (a quote-header substring of the flattened text) back onto
/// the tree and prune the quote. Returns false when no anchor exists, in
/// which case the document is untouched and the caller falls back to
/// rebuilding HTML from the truncated text.
pub fn prune_at_match(doc: &mut Html, matched: &str, removed: &mut Vec<String>) -> bool {
    let lookup = cleared_text(matched);
    if lookup.is_empty() {
        return false;
    }
    let Some(anchor) = find_anchor(doc, &lookup) else {
        return false;
    };

    // Everything after the anchor's parent belongs to the quote, as does a
    // directly following blockquote (header paragraph + blockquote is the
    // common client shape).
    if let Some(parent) = dom::parent_element(doc, anchor) {
        for sib in dom::following_element_siblings(doc, parent) {
            record_and_detach(doc, removed, sib);
        }
        if let Some(next) = dom::next_element_sibling(doc, parent) {
            if dom::element_name(doc, next).as_deref() == Some("blockquote") {
                record_and_detach(doc, removed, next);
            }
        }
    }

    // Walk upward to the highest ancestor whose content starts with the
    // quote. An ancestor whose cleared text holds the lookup at an offset
    // greater than zero still has its own content before the quote and must
    // survive; the walk also stops defensively when the lookup disappears.
    let mut current = Some(anchor);
    let mut candidate: Option<NodeId> = None;
    while let Some(id) = current {
        let cleared = cleared_text(&dom::node_text(doc, id));
        match cleared.find(&lookup) {
            Some(0) => {
                candidate = Some(id);
                current = dom::parent(doc, id);
            }
            _ => break,
        }
    }

    let Some(target) = candidate else {
        return true;
    };
    if dom::element_name(doc, target).is_none() || is_root_container(doc, target) {
        return true;
    }

    let parent_of_removed = dom::parent(doc, target);
    record_and_detach(doc, removed, target);

    // Deleting the quote can leave a chain of now-empty wrappers; remove
    // them up to (but never including) the root containers. Embedded images
    // count as content.
    let mut cursor = parent_of_removed;
    while let Some(id) = cursor {
        if dom::element_name(doc, id).is_none() || is_root_container(doc, id) {
            break;
        }
        if dom::node_text(doc, id).trim().is_empty() && !dom::has_descendant(doc, id, "img") {
            let next = dom::parent(doc, id);
            dom::detach(doc, id);
            cursor = next;
        } else {
            break;
        }
    }

    true
}
