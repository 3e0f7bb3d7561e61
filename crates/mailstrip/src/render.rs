//! Re-render a (possibly pruned) document to HTML, keeping output close to
//! the source: original tag-name casing, fragment inputs stay fragments, and
//! void elements come out self-closed.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use html_scraper::{Html, Selector};
use regex::Regex;

fn tag_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)").expect("valid tag token pattern"))
}

/// First-seen casing per tag name in the raw input. The parser lowercases
/// names; this map lets the output restore what the sender's client wrote.
fn extract_tag_casing(html: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for caps in tag_token_re().captures_iter(html) {
        let original = &caps[1];
        let lower = original.to_ascii_lowercase();
        map.entry(lower).or_insert_with(|| original.to_string());
    }
    map
}

fn restore_tag_casing(html: String, casing: &BTreeMap<String, String>) -> String {
    let mut out = html;
    for (lower, original) in casing {
        if lower == original {
            continue;
        }
        let open = Regex::new(&format!(r"(?i)<{lower}([\s>/])")).expect("tag names are alphanumeric");
        out = open.replace_all(&out, format!("<{original}${{1}}")).to_string();
        let close = Regex::new(&format!(r"(?i)</{lower}>")).expect("tag names are alphanumeric");
        out = close.replace_all(&out, format!("</{original}>")).to_string();
    }
    out
}

fn capture_group(pattern: &str, haystack: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(haystack)
        .map(|c| c[1].to_string())
}

fn newline_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{5,}").expect("valid newline run pattern"))
}

fn shell_tag_re(tag: &'static str) -> Regex {
    Regex::new(&format!(r"(?i)<{tag}[\s>]")).expect("tag names are alphanumeric")
}

fn html_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<html([^>]*)><body").expect("valid shell pattern"))
}

fn body_inner_html(doc: &Html) -> String {
    let Ok(sel) = Selector::parse("body") else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_default()
}

/// Serialize `doc` for output. Inputs that carried `<html>`/`<body>` keep
/// their document shell (minus a parser-invented `<head>`); fragments come
/// back as fragments.
pub fn document_to_html(doc: &Html, original_html: &str) -> String {
    let casing = extract_tag_casing(original_html);
    let had_html = shell_tag_re("html").is_match(original_html);
    let had_body = shell_tag_re("body").is_match(original_html);
    let had_head = shell_tag_re("head").is_match(original_html);

    let mut html = if had_html || had_body {
        let mut s = doc.html();
        if !had_head {
            s = s.replace("<head></head>", "");
        }
        // The serializer butts the structural tags together; reinstate the
        // whitespace the source had between them.
        if let Some(ws) = capture_group(r"(?is)<html[^>]*>(\s*)<body", original_html) {
            if !ws.is_empty() {
                s = html_open_re()
                    .replace(&s, |caps: &regex::Captures<'_>| {
                        format!("<html{}>{}<body", &caps[1], ws)
                    })
                    .to_string();
            }
        }
        if let Some(ws) = capture_group(r"(?is)</body>(\s*)</html>", original_html) {
            if !ws.is_empty() {
                s = s.replace("</body></html>", &format!("</body>{ws}</html>"));
            }
        }
        s
    } else {
        body_inner_html(doc)
    };

    html = html.replace("<br>", "<br/>").replace("<hr>", "<hr/>");
    html = newline_run_re().replace_all(&html, "\n\n\n\n").to_string();
    html = restore_tag_casing(html, &casing);
    html.trim().to_string()
}
