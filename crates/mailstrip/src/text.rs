//! Text flattener: render an HTML tree to normalized plain text.
//!
//! Block elements become line breaks, list items become `* ` bullets,
//! blockquotes become `> `-prefixed lines (recursively for nesting), and
//! anchors keep their target as `text (href)`. Leading `#`/`---` runs are
//! escaped per line so flattened output cannot later be misread as headers
//! or dash-delimited dividers.

use std::sync::OnceLock;

use ego_tree::NodeRef;
use html_scraper::{Html, Node, Selector};
use regex::Regex;

fn walk(out: &mut String, node: NodeRef<'_, Node>) {
    match node.value() {
        Node::Text(t) => out.push_str(&t),
        Node::Element(el) => match el.name() {
            "script" | "style" | "head" | "title" => {}
            "br" => out.push('\n'),
            "p" | "div" => {
                out.push('\n');
                walk_children(out, node);
                out.push('\n');
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                out.push_str("\n\n");
                walk_children(out, node);
                out.push_str("\n\n");
            }
            "li" => {
                out.push_str("* ");
                walk_children(out, node);
                out.push('\n');
            }
            "ul" | "ol" => {
                out.push('\n');
                walk_children(out, node);
                out.push('\n');
            }
            "blockquote" => {
                let mut inner = String::new();
                walk_children(&mut inner, node);
                out.push('\n');
                for line in inner.trim_matches('\n').split('\n') {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
            "a" => {
                let mut inner = String::new();
                walk_children(&mut inner, node);
                match el.attr("href") {
                    Some(href) if !inner.is_empty() && href != inner => {
                        out.push_str(&format!("{inner} ({href})"));
                    }
                    _ => out.push_str(&inner),
                }
            }
            _ => walk_children(out, node),
        },
        _ => {}
    }
}

fn walk_children(out: &mut String, node: NodeRef<'_, Node>) {
    for child in node.children() {
        walk(out, child);
    }
}

fn space_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("valid space run pattern"))
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank run pattern"))
}

fn leading_dashes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(-{3,})").expect("valid dash escape pattern"))
}

fn leading_hashes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#+)").expect("valid hash escape pattern"))
}

/// Flatten HTML to plain text.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("body") else {
        return String::new();
    };
    let mut raw = String::new();
    if let Some(body) = doc.select(&sel).next() {
        walk_children(&mut raw, *body);
    }

    let collapsed = space_run_re().replace_all(&raw, " ");
    let collapsed = blank_run_re().replace_all(&collapsed, "\n\n");
    let trimmed = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = trimmed.trim().to_string();

    let escaped = leading_dashes_re().replace_all(&trimmed, "\\$1");
    let escaped = leading_hashes_re().replace_all(&escaped, "\\$1");
    escaped.to_string()
}
