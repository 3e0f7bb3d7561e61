//! The signature cascade: structural recognizers for known email clients.
//!
//! Each rule is a (client, apply) pair evaluated in fixed priority order. A
//! rule locates its distinguishing markup, validates any auxiliary structural
//! conditions, and on success excises the minimal subtree that constitutes
//! the quote. The first conclusive rule wins; a rule whose auxiliary
//! condition fails must not stop the cascade.

use ego_tree::NodeId;
use html_scraper::Html;

use crate::dom;

pub struct SignatureRule {
    pub client: &'static str,
    pub apply: fn(&mut Html, &mut Vec<String>) -> bool,
}

/// Serialize each subtree, then detach it. Callers pass ids in document order
/// so the recorded quote fragments read top to bottom.
fn record_and_detach(doc: &mut Html, removed: &mut Vec<String>, ids: &[NodeId]) {
    for &id in ids {
        if let Some(html) = dom::outer_html(doc, id) {
            removed.push(html);
        }
        dom::detach(doc, id);
    }
}

/// Remove every element matching `selector`. False when nothing matched.
fn remove_all(doc: &mut Html, removed: &mut Vec<String>, selector: &str) -> bool {
    let ids = dom::select_all(doc, selector);
    if ids.is_empty() {
        return false;
    }
    record_and_detach(doc, removed, &ids);
    true
}

/// Remove a marker element together with its following element siblings.
/// Forward removal stops at the end of the marker's parent.
fn remove_marker_and_following(
    doc: &mut Html,
    removed: &mut Vec<String>,
    marker: NodeId,
    keep_script_style: bool,
) {
    let mut ids = vec![marker];
    for sib in dom::following_element_siblings(doc, marker) {
        if keep_script_style {
            if let Some(name) = dom::element_name(doc, sib) {
                if name == "script" || name == "style" {
                    continue;
                }
            }
        }
        ids.push(sib);
    }
    record_and_detach(doc, removed, &ids);
}

// Thunderbird: citation prefix line followed by the cited blockquote.
fn moz(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let mut pairs = Vec::new();
    for id in dom::select_all(doc, "div.moz-cite-prefix") {
        let Some(next) = dom::next_element_sibling(doc, id) else {
            continue;
        };
        if dom::element_name(doc, next).as_deref() == Some("blockquote")
            && dom::element_attr(doc, next, "type").as_deref() == Some("cite")
        {
            pairs.push((id, next));
        }
    }
    if pairs.is_empty() {
        return false;
    }
    for (prefix, quote) in pairs {
        record_and_detach(doc, removed, &[prefix, quote]);
    }
    true
}

fn freshdesk(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.freshdesk_quote")
}

fn front(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, ".front-blockquote")
}

fn missive(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.missive_quote")
}

fn outreach(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.outreach-quote")
}

fn hubspot(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.hs_reply")
}

fn spark(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "[name=\"messageReplySection\"]")
}

// Gmail: attribution line inside a quote container.
fn gmail_attr(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(attr) = dom::select_first(doc, ".gmail_attr") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, attr) else {
        return false;
    };
    if dom::class_contains(doc, parent, "gmail_quote_container")
        || dom::class_contains(doc, parent, "gmail_quote")
    {
        record_and_detach(doc, removed, &[parent]);
        return true;
    }
    false
}

// Gmail: quote div wrapped in a gmail_extra container.
fn gmail_extra(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(quote) = dom::select_first(doc, "div.gmail_quote") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, quote) else {
        return false;
    };
    if dom::class_contains(doc, parent, "gmail_extra") {
        record_and_detach(doc, removed, &[parent]);
        return true;
    }
    false
}

// Gmail fallback: a gmail_quote blockquote, removed together with its
// gmail_quote div ancestor when one exists.
fn gmail_blockquote(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(bq) = dom::select_first(doc, "blockquote.gmail_quote") else {
        return false;
    };
    let container = dom::closest_ancestor(doc, bq, |n| {
        n.value().as_element().is_some_and(|el| {
            el.name() == "div"
                && el
                    .attr("class")
                    .is_some_and(|c| c.split_whitespace().any(|t| t == "gmail_quote"))
        })
    });
    record_and_detach(doc, removed, &[container.unwrap_or(bq)]);
    true
}

// Gmail cleanup: quote divs left empty by upstream processing.
fn gmail_empty(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let ids = dom::select_all(doc, "div.gmail_quote");
    if ids.is_empty() {
        return false;
    }
    let text: String = ids.iter().map(|&id| dom::node_text(doc, id)).collect();
    let children: usize = ids
        .iter()
        .map(|&id| dom::element_children(doc, id).len())
        .sum();
    if text.trim().is_empty() || children == 0 {
        record_and_detach(doc, removed, &ids);
        return true;
    }
    false
}

fn yahoo(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.yahoo_quoted")
}

fn ymail_signature(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(marker) = dom::select_first(doc, "div#ymail_android_signature") else {
        return false;
    };
    remove_marker_and_following(doc, removed, marker, true);
    true
}

fn yahoo_quoted_begin(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(marker) = dom::select_first(doc, "p.yahoo-quoted-begin") else {
        return false;
    };
    remove_marker_and_following(doc, removed, marker, true);
    true
}

fn fernand(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.fernand_quote")
}

fn intercom(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.history")
}

fn reply_intro(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(intro) = dom::select_first(doc, "p#reply-intro") else {
        return false;
    };
    let Some(next) = dom::next_element_sibling(doc, intro) else {
        return false;
    };
    if dom::element_name(doc, next).as_deref() == Some("blockquote")
        && dom::element_attr(doc, next, "type").as_deref() == Some("cite")
    {
        record_and_detach(doc, removed, &[intro, next]);
        return true;
    }
    false
}

fn office365(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div#mail-editor-reference-message-container")
}

/// Delete whitespace around `:`/`;` and collapse internal runs of
/// spaces/tabs, so style-attribute comparisons tolerate client formatting.
fn normalize_style(style: &str) -> String {
    let mut out = String::with_capacity(style.len());
    let mut pending = false;
    for ch in style.chars() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => pending = true,
            ':' | ';' => {
                out.push(ch);
                pending = false;
            }
            _ => {
                if pending && !out.is_empty() && !out.ends_with([':', ';']) {
                    out.push(' ');
                }
                pending = false;
                out.push(ch);
            }
        }
    }
    out
}

// Outlook desktop: the reply divider is a border-top styled div holding the
// bold "From:" header. Unit suffixes are folded to a single unit before the
// suffix comparison.
fn outlook_desktop(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(bold) = dom::select_first(doc, "div[style] > p.MsoNormal > b") else {
        return false;
    };
    let Some(p) = dom::parent_element(doc, bold) else {
        return false;
    };
    let Some(divider) = dom::parent_element(doc, p) else {
        return false;
    };
    let style = normalize_style(&dom::element_attr(doc, divider, "style").unwrap_or_default());
    if !style.starts_with("border:none;border-top:solid") {
        return false;
    }
    let folded = style.replace("cm", "in").replace("pt", "in").replace("mm", "in");
    if !folded.ends_with(" 1.0in;padding:3.0in 0in 0in 0in") {
        return false;
    }

    let mut root = divider;
    if let Some(container) = dom::parent_element(doc, divider) {
        if dom::element_children(doc, container).len() == 1 {
            root = container;
        }
    }
    let mut ids = vec![root];
    ids.extend(dom::following_element_siblings(doc, root));
    record_and_detach(doc, removed, &ids);
    true
}

// Outlook web: reply/forward header div preceded by an hr divider.
fn outlook_web(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(header) = dom::select_first(doc, "div#divRplyFwdMsg") else {
        return false;
    };
    let Some(hr) = dom::preceding_element_siblings(doc, header)
        .into_iter()
        .find(|&id| dom::element_name(doc, id).as_deref() == Some("hr"))
    else {
        return false;
    };
    let mut ids = vec![hr, header];
    ids.extend(dom::following_element_siblings(doc, header));
    record_and_detach(doc, removed, &ids);
    true
}

fn protonmail(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, ".protonmail_quote")
}

fn trix(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.trix-content > blockquote")
}

fn zoho_zmail(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(extra) = dom::select_first(doc, "div.zmail_extra") else {
        return false;
    };
    let mut ids = Vec::new();
    if let Some(prev) = dom::prev_element_sibling(doc, extra) {
        if dom::has_class(doc, prev, "zmail_extra_hr") {
            ids.push(prev);
        }
    }
    ids.push(extra);
    record_and_detach(doc, removed, &ids);
    true
}

fn zendesk(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(bq) = dom::select_first(doc, "div.quotedReply > blockquote") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, bq) else {
        return false;
    };
    record_and_detach(doc, removed, &[parent]);
    true
}

fn zoho_beforequote(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(marker) = dom::select_first(doc, "div[title=\"beforequote:::\"]") else {
        return false;
    };
    let mut ids = Vec::new();
    if let Some(prev) = dom::prev_element_sibling(doc, marker) {
        if dom::node_text(doc, prev).trim().starts_with("---") {
            ids.push(prev);
        }
    }
    ids.push(marker);
    ids.extend(dom::following_element_siblings(doc, marker));
    record_and_detach(doc, removed, &ids);
    true
}

fn notion(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "blockquote.notion-mail-quote")
}

fn tutanota(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(bq) = dom::select_first(doc, "blockquote.tutanota_quote") else {
        return false;
    };
    let mut ids = Vec::new();
    if let Some(prev) = dom::prev_element_sibling(doc, bq) {
        if dom::element_name(doc, prev).as_deref() == Some("div") {
            ids.push(prev);
        }
    }
    ids.push(bq);
    record_and_detach(doc, removed, &ids);
    true
}

fn yahoo_ydp(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(div) = dom::select_first(doc, "div[class$=\"yahoo_quoted\"]") else {
        return false;
    };
    if dom::element_attr(doc, div, "id")
        .unwrap_or_default()
        .contains("yahoo_quoted")
    {
        record_and_detach(doc, removed, &[div]);
        return true;
    }
    false
}

fn qt(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "blockquote[type=\"cite\"]#qt")
}

fn alimail(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(div) = dom::select_first(doc, "div.alimail-quote") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, div) else {
        return false;
    };
    if dom::element_name(doc, parent).as_deref() == Some("blockquote") {
        record_and_detach(doc, removed, &[parent]);
        return true;
    }
    false
}

// Apple Mail: cited blockquote under an apple-mail html root; a preceding
// dir-attributed sibling holding a nested blockquote belongs to the quote.
fn apple_dir(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(div) =
        dom::select_first(doc, "html[class*=\"apple-mail\"] blockquote[type=\"cite\"] > div[dir]")
    else {
        return false;
    };
    let Some(bq) = dom::parent_element(doc, div) else {
        return false;
    };
    let mut ids = Vec::new();
    if let Some(prev) = dom::prev_element_sibling(doc, bq) {
        if dom::element_attr(doc, prev, "dir").is_some() && dom::has_descendant(doc, prev, "blockquote")
        {
            ids.push(prev);
        }
    }
    ids.push(bq);
    record_and_detach(doc, removed, &ids);
    true
}

fn apple_interchange(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(br) = dom::select_first(doc, "br.Apple-interchange-newline") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, br) else {
        return false;
    };
    if dom::element_name(doc, parent).as_deref() == Some("blockquote") {
        record_and_detach(doc, removed, &[parent]);
        return true;
    }
    false
}

fn apple_meta(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(meta) = dom::select_first(doc, "meta[name=\"x-apple-disable-message-reformatting\"]")
    else {
        return false;
    };
    let Some(bq) = dom::closest_ancestor(doc, meta, |n| {
        n.value().as_element().is_some_and(|el| el.name() == "blockquote")
    }) else {
        return false;
    };
    let mut ids = Vec::new();
    if let Some(prev) = dom::prev_element_sibling(doc, bq) {
        if dom::element_name(doc, prev).as_deref() == Some("div")
            && dom::has_descendant(doc, prev, "blockquote[type=\"cite\"]")
        {
            ids.push(prev);
        }
    }
    ids.push(bq);
    record_and_detach(doc, removed, &ids);
    true
}

// Removal without short-circuit: later rules may still claim the quote. When
// none does, the engine re-parses the original HTML and this mutation is
// discarded.
fn onecom(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    if let Some(div) = dom::select_first(doc, "div.oneComWebmail-html") {
        if let Some(parent) = dom::parent_element(doc, div) {
            if dom::element_name(doc, parent).as_deref() == Some("blockquote") {
                record_and_detach(doc, removed, &[parent]);
            }
        }
    }
    false
}

// Same non-concluding behavior as `onecom`.
fn nh(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    remove_all(doc, removed, "div.nh_extra");
    false
}

fn gwp(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    let Some(div) = dom::select_first(doc, "div[id^=\"gwp\"]") else {
        return false;
    };
    let Some(parent) = dom::parent_element(doc, div) else {
        return false;
    };
    if dom::element_name(doc, parent).unwrap_or_default().contains('@') {
        record_and_detach(doc, removed, &[parent]);
        return true;
    }
    false
}

/// The cascade, in priority order. Static and read-only: safe to share
/// across concurrently running engine instances.
pub static RULES: &[SignatureRule] = &[
    SignatureRule { client: "thunderbird", apply: moz },
    SignatureRule { client: "freshdesk", apply: freshdesk },
    SignatureRule { client: "front", apply: front },
    SignatureRule { client: "missive", apply: missive },
    SignatureRule { client: "outreach", apply: outreach },
    SignatureRule { client: "hubspot", apply: hubspot },
    SignatureRule { client: "spark", apply: spark },
    SignatureRule { client: "gmail-attr", apply: gmail_attr },
    SignatureRule { client: "gmail-extra", apply: gmail_extra },
    SignatureRule { client: "gmail-blockquote", apply: gmail_blockquote },
    SignatureRule { client: "gmail-empty", apply: gmail_empty },
    SignatureRule { client: "yahoo", apply: yahoo },
    SignatureRule { client: "ymail-signature", apply: ymail_signature },
    SignatureRule { client: "yahoo-quoted-begin", apply: yahoo_quoted_begin },
    SignatureRule { client: "fernand", apply: fernand },
    SignatureRule { client: "intercom", apply: intercom },
    SignatureRule { client: "reply-intro", apply: reply_intro },
    SignatureRule { client: "office365", apply: office365 },
    SignatureRule { client: "outlook-desktop", apply: outlook_desktop },
    SignatureRule { client: "outlook-web", apply: outlook_web },
    SignatureRule { client: "protonmail", apply: protonmail },
    SignatureRule { client: "trix", apply: trix },
    SignatureRule { client: "zoho-zmail", apply: zoho_zmail },
    SignatureRule { client: "zendesk", apply: zendesk },
    SignatureRule { client: "zoho-beforequote", apply: zoho_beforequote },
    SignatureRule { client: "notion", apply: notion },
    SignatureRule { client: "tutanota", apply: tutanota },
    SignatureRule { client: "yahoo-ydp", apply: yahoo_ydp },
    SignatureRule { client: "qt", apply: qt },
    SignatureRule { client: "alimail", apply: alimail },
    SignatureRule { client: "apple-dir", apply: apple_dir },
    SignatureRule { client: "apple-interchange", apply: apple_interchange },
    SignatureRule { client: "apple-meta", apply: apple_meta },
    SignatureRule { client: "onecom", apply: onecom },
    SignatureRule { client: "nh", apply: nh },
    SignatureRule { client: "gwp", apply: gwp },
];

/// Run the cascade. Returns true as soon as one rule concludes; `removed`
/// accumulates the serialized HTML of every pruned subtree.
pub fn try_remove_known_quote(doc: &mut Html, removed: &mut Vec<String>) -> bool {
    for rule in RULES {
        if (rule.apply)(doc, removed) {
            return true;
        }
    }
    false
}
