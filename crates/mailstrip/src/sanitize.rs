//! Sanitizer: strip non-content markup and hostile style properties from
//! messy email HTML while preserving the content itself.
//!
//! Contract (consumed by the engine's `Clean` mode):
//! - `head`/`style`/`script`/`title`/`link`/`xml`/`meta` and any tag with a
//!   namespace colon disappear with their entire subtree
//! - `class`, `lang`, `xmlns*`, `o:*`, `v:*`, `data-*` attributes are dropped
//! - within `style`, properties prefixed `mso-`/`font-`, `line-height`, and
//!   anything containing `autospace` are dropped
//! - void elements are self-closed; comments (conditional blocks included)
//!   vanish; only `<body>` contents survive; output is trimmed

use ego_tree::NodeRef;
use html_scraper::{Html, Node, Selector};

const SKIP_TAGS: &[&str] = &["head", "meta", "style", "script", "xml", "title", "link"];
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Keep only style properties that carry real presentation. Property text is
/// passed through verbatim; only whole declarations are dropped.
fn clean_style(style: &str) -> String {
    style
        .split(';')
        .filter(|prop| {
            let name = prop.split(':').next().unwrap_or("").trim().to_ascii_lowercase();
            if name.is_empty() {
                return false;
            }
            if name.starts_with("mso-") || name.starts_with("font-") {
                return false;
            }
            if name == "line-height" || name.contains("autospace") {
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join(";")
        .trim()
        .to_string()
}

fn keep_attr(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower == "class" || lower == "lang" {
        return false;
    }
    if lower.starts_with("xmlns") || lower.starts_with("o:") || lower.starts_with("v:") {
        return false;
    }
    if lower.starts_with("data-") {
        return false;
    }
    true
}

fn write_node(out: &mut String, node: NodeRef<'_, Node>) {
    match node.value() {
        Node::Text(t) => out.push_str(&escape_text(&t)),
        Node::Element(el) => {
            let name = el.name();
            if SKIP_TAGS.contains(&name) || name.contains(':') {
                return;
            }

            out.push('<');
            out.push_str(name);
            for (attr, value) in el.attrs() {
                if !keep_attr(attr) {
                    continue;
                }
                if attr.eq_ignore_ascii_case("style") {
                    let cleaned = clean_style(value);
                    if !cleaned.is_empty() {
                        out.push_str(&format!(" style=\"{}\"", escape_attr(&cleaned)));
                    }
                    continue;
                }
                out.push_str(&format!(" {}=\"{}\"", attr, escape_attr(value)));
            }

            if VOID_TAGS.contains(&name) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in node.children() {
                write_node(out, child);
            }
            out.push_str(&format!("</{name}>"));
        }
        // Comments (MSO conditionals included), doctypes, processing
        // instructions: dropped.
        _ => {}
    }
}

/// Sanitize an HTML fragment or document. When a `<body>` is present only its
/// contents are emitted; fragments pass through whole.
pub fn clean_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("body") else {
        return String::new();
    };
    let mut out = String::new();
    if let Some(body) = doc.select(&sel).next() {
        for child in body.children() {
            write_node(&mut out, child);
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_mso_style_properties_but_keeps_real_ones() {
        let out = clean_html(r#"<p style="mso-line-height-rule:exactly;color:red;">Hello</p>"#);
        assert_eq!(out, r#"<p style="color:red">Hello</p>"#);
    }

    #[test]
    fn drops_font_line_height_and_autospace_properties() {
        let out = clean_html(
            r#"<p style="font-family:Arial;line-height:1.5;mso-char-autospace:none;margin:0">x</p>"#,
        );
        assert_eq!(out, r#"<p style="margin:0">x</p>"#);
    }

    #[test]
    fn style_attribute_disappears_when_nothing_survives() {
        let out = clean_html(r#"<p style="mso-bidi:x;font-size:10pt">x</p>"#);
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn strips_class_lang_xmlns_office_and_data_attributes() {
        let out = clean_html(
            r#"<div class="MsoNormal" lang="en" xmlns:o="urn:x" o:gfx="1" v:shape="1" data-id="7" id="keep">x</div>"#,
        );
        assert_eq!(out, r#"<div id="keep">x</div>"#);
    }

    #[test]
    fn removes_non_content_elements_with_their_subtrees() {
        let out = clean_html(
            "<style>.a{}</style><script>alert(1)</script><title>t</title><p>body text</p>",
        );
        assert_eq!(out, "<p>body text</p>");
    }

    #[test]
    fn removes_namespaced_elements_entirely() {
        let out = clean_html("<p>keep</p><o:p>office only</o:p>");
        assert!(out.contains("keep"));
        assert!(!out.contains("office only"));
    }

    #[test]
    fn extracts_body_contents_from_full_documents() {
        let out = clean_html("<html><head><title>t</title></head><body><p>x</p></body></html>");
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn drops_comments_including_mso_conditionals() {
        let out = clean_html("<!--[if mso]><table><tr><td>MSO</td></tr></table><![endif]--><p>x</p>");
        assert!(!out.contains("MSO"));
        assert!(out.contains("<p>x</p>"));
    }

    #[test]
    fn void_elements_are_self_closed() {
        let out = clean_html(r#"<p>a<br>b</p><img src="i.png">"#);
        assert!(out.contains("<br />"));
        assert!(out.contains(r#"<img src="i.png" />"#));
    }

    #[test]
    fn keeps_href_src_and_id(){
        let out = clean_html(r#"<a href="https://example.com" id="l">go</a>"#);
        assert_eq!(out, r#"<a href="https://example.com" id="l">go</a>"#);
    }

    #[test]
    fn output_is_trimmed() {
        let out = clean_html("   <p>x</p>   ");
        assert_eq!(out, "<p>x</p>");
    }
}
