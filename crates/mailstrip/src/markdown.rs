//! Markdown rendering tuned for email HTML.
//!
//! Email layouts abuse tables for positioning, so this renderer never emits a
//! Markdown table grid: a single-cell row flows as plain text and a
//! multi-cell row joins its cells with `" | "` (no leading/trailing pipe, no
//! separator line). Also hosts the text-to-HTML fallback used when a message
//! arrives without an HTML part.

use std::sync::OnceLock;

use ego_tree::NodeRef;
use html_scraper::{Html, Node, Selector};
use regex::Regex;

/// Markdown-to-HTML expansion for plain-text inputs.
pub fn text_to_html(text: &str) -> String {
    let parser = pulldown_cmark::Parser::new(text);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html.trim().to_string()
}

fn inline_text(t: &str) -> String {
    let core = t.split_whitespace().collect::<Vec<_>>().join(" ");
    if core.is_empty() {
        return if t.is_empty() { String::new() } else { " ".to_string() };
    }
    let mut out = String::new();
    if t.chars().next().is_some_and(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&core);
    if t.chars().last().is_some_and(char::is_whitespace) {
        out.push(' ');
    }
    out
}

fn raw_text(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for n in node.descendants() {
        if let Some(t) = n.value().as_text() {
            out.push_str(t);
        }
    }
    out
}

fn wrap(inner: String, marker: &str) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{marker}{trimmed}{marker}")
    }
}

fn block(inner: String) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n\n{trimmed}\n\n")
    }
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank run pattern"))
}

fn trailing_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)[ \t]+$").expect("valid trailing space pattern"))
}

fn squeeze(s: &str) -> String {
    blank_run_re().replace_all(s, "\n\n").trim().to_string()
}

/// Flatten multi-line cell content onto one line so a pipe-joined row never
/// spans lines.
fn single_line(s: &str) -> String {
    s.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_children(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for child in node.children() {
        out.push_str(&render_node(child));
    }
    out
}

fn render_list(node: NodeRef<'_, Node>, ordered: bool) -> String {
    let mut items = Vec::new();
    let mut index = 1usize;
    for child in node.children() {
        let Some(el) = child.value().as_element() else {
            continue;
        };
        if el.name() != "li" {
            continue;
        }
        let inner = single_line(render_children(child).trim());
        if inner.is_empty() {
            continue;
        }
        if ordered {
            items.push(format!("{index}. {inner}"));
            index += 1;
        } else {
            items.push(format!("* {inner}"));
        }
    }
    if items.is_empty() {
        String::new()
    } else {
        format!("\n\n{}\n\n", items.join("\n"))
    }
}

fn render_blockquote(node: NodeRef<'_, Node>) -> String {
    let inner = squeeze(&render_children(node));
    if inner.is_empty() {
        return String::new();
    }
    let quoted = inner
        .split('\n')
        .map(|line| {
            if line.starts_with('>') {
                format!(">{line}")
            } else if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

fn collect_rows<'a>(node: NodeRef<'a, Node>, rows: &mut Vec<NodeRef<'a, Node>>) {
    for child in node.children() {
        let Some(el) = child.value().as_element() else {
            continue;
        };
        match el.name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            // A nested table inside a cell renders through that cell's own
            // content, not through this table's row list.
            _ => {}
        }
    }
}

fn render_table(node: NodeRef<'_, Node>) -> String {
    let mut rows = Vec::new();
    collect_rows(node, &mut rows);

    let mut lines = Vec::new();
    for row in rows {
        let mut cells: Vec<String> = Vec::new();
        for cell in row.children() {
            let Some(el) = cell.value().as_element() else {
                continue;
            };
            if el.name() != "td" && el.name() != "th" {
                continue;
            }
            let content = squeeze(&render_children(cell));
            // Empty and whitespace-only cells do not produce pipes.
            if content.is_empty() {
                continue;
            }
            cells.push(content);
        }
        match cells.len() {
            0 => {}
            1 => lines.push(cells.remove(0)),
            _ => lines.push(
                cells
                    .iter()
                    .map(|c| single_line(c))
                    .collect::<Vec<_>>()
                    .join(" | "),
            ),
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("\n\n{}\n\n", lines.join("\n\n"))
    }
}

fn render_node(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(t) => inline_text(&t),
        Node::Element(el) => match el.name() {
            "head" | "script" | "style" | "meta" | "link" | "title" => String::new(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.name()[1..].parse::<usize>().unwrap_or(1);
                let inner = render_children(node).trim().to_string();
                if inner.is_empty() {
                    String::new()
                } else {
                    format!("\n\n{} {inner}\n\n", "#".repeat(level))
                }
            }
            "p" | "div" | "section" | "article" | "form" | "center" => {
                block(render_children(node))
            }
            "br" => "\n".to_string(),
            "hr" => "\n\n---\n\n".to_string(),
            "strong" | "b" => wrap(render_children(node), "**"),
            "em" | "i" => wrap(render_children(node), "_"),
            "del" | "s" | "strike" => wrap(render_children(node), "~~"),
            "code" => {
                let inner = raw_text(node);
                let inner = inner.trim();
                if inner.is_empty() {
                    String::new()
                } else {
                    format!("`{inner}`")
                }
            }
            "pre" => {
                let inner = raw_text(node);
                format!("\n\n```\n{}\n```\n\n", inner.trim_matches('\n'))
            }
            "a" => {
                let inner = render_children(node).trim().to_string();
                match el.attr("href") {
                    Some(href) if !inner.is_empty() => format!("[{inner}]({href})"),
                    _ => inner,
                }
            }
            "img" => {
                let src = el.attr("src").unwrap_or("");
                if src.is_empty() || src.starts_with("data:") {
                    return String::new();
                }
                let alt = el.attr("alt").unwrap_or("");
                match el.attr("title") {
                    Some(title) if !title.is_empty() => format!("![{alt}]({src} \"{title}\")"),
                    _ => format!("![{alt}]({src})"),
                }
            }
            "ul" => render_list(node, false),
            "ol" => render_list(node, true),
            "blockquote" => render_blockquote(node),
            "table" => render_table(node),
            _ => render_children(node),
        },
        _ => String::new(),
    }
}

/// Render HTML to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("body") else {
        return String::new();
    };
    let mut out = String::new();
    if let Some(body) = doc.select(&sel).next() {
        out = render_children(*body);
    }
    let out = trailing_space_re().replace_all(&out, "");
    squeeze(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_simple_inline_formatting() {
        let out = html_to_markdown("<p>Hello <strong>world</strong></p>");
        assert!(out.contains("Hello"));
        assert!(out.contains("**world**"));
    }

    #[test]
    fn converts_headers() {
        let out = html_to_markdown("<h1>Title</h1><h2>Subtitle</h2><p>Content</p>");
        assert!(out.contains("# Title"));
        assert!(out.contains("## Subtitle"));
        assert!(out.contains("Content"));
    }

    #[test]
    fn converts_links_and_preserves_query_strings() {
        let out = html_to_markdown(r#"<a href="https://example.com/path?q=1&b=2#hash">Link</a>"#);
        assert!(out.contains("[Link](https://example.com/path?q=1&b=2#hash)"));
    }

    #[test]
    fn converts_emphasis_strike_and_combinations() {
        let out = html_to_markdown("<p><em>italic</em> and <strong>bold</strong> and <del>gone</del></p>");
        assert!(out.contains("_italic_"));
        assert!(out.contains("**bold**"));
        assert!(out.contains("~~gone~~"));

        let nested = html_to_markdown("<p><strong><em>Bold and italic</em></strong></p>");
        assert!(nested.contains("**_Bold and italic_**"));

        let link = html_to_markdown(r#"<a href="https://example.com"><strong>Bold link</strong></a>"#);
        assert!(link.contains("[**Bold link**](https://example.com)"));
    }

    #[test]
    fn single_column_layout_tables_flatten_without_pipes() {
        let out = html_to_markdown(
            "<table><tr><td><p>Hello there,</p><p>This is my text inside a layout table.</p></td></tr></table>",
        );
        assert!(!out.contains('|'));
        assert!(out.contains("Hello there,"));
        assert!(out.contains("This is my text inside a layout table."));
    }

    #[test]
    fn deeply_nested_single_column_tables_flatten() {
        let out = html_to_markdown(
            "<table><tr><td><table><tr><td><table><tr><td>Deep content</td></tr></table></td></tr></table></td></tr></table>",
        );
        assert!(out.contains("Deep content"));
        assert!(!out.contains('|'));
    }

    #[test]
    fn multi_cell_rows_join_with_pipes_and_never_emit_grid_syntax() {
        let out = html_to_markdown("<table><tr><th>Name</th><th>Value</th></tr><tr><td>Key</td><td>123</td></tr></table>");
        assert!(out.contains("Name | Value"));
        assert!(out.contains("Key | 123"));
        let separator = Regex::new(r"\|\s*-+\s*\|").unwrap();
        assert!(!separator.is_match(&out), "grid separator in {out:?}");
        let leading = Regex::new(r"(?m)^\s*\|").unwrap();
        assert!(!leading.is_match(&out), "leading pipe in {out:?}");
        let trailing = Regex::new(r"(?m)\|\s*$").unwrap();
        assert!(!trailing.is_match(&out), "trailing pipe in {out:?}");
    }

    #[test]
    fn three_cell_rows_use_two_pipes() {
        let out = html_to_markdown("<table><tr><td>A</td><td>B</td><td>C</td></tr></table>");
        assert!(out.contains("A | B | C"));
    }

    #[test]
    fn mixed_single_and_multi_cell_rows() {
        let out = html_to_markdown(
            "<table><tr><td>Full width header</td></tr><tr><td>Left</td><td>Right</td></tr><tr><td>Full width footer</td></tr></table>",
        );
        assert!(out.contains("Left | Right"));
        assert!(out.contains("Full width header"));
        assert!(!Regex::new(r"Full width header\s*\|").unwrap().is_match(&out));
        assert!(!Regex::new(r"\|\s*Full width footer").unwrap().is_match(&out));
    }

    #[test]
    fn empty_cells_never_produce_stray_pipes() {
        let trailing = Regex::new(r"(?m)\|\s*$").unwrap();
        for html in [
            "<table><tr><td>Content</td><td></td></tr></table>",
            "<table><tr><td>Content</td><td>   </td></tr></table>",
            "<table><tr><td>Content</td><td>&nbsp;</td></tr></table>",
            "<table><tr><td>Content</td><td><br></td></tr></table>",
        ] {
            let out = html_to_markdown(html);
            assert!(out.contains("Content"), "lost content in {html}");
            assert!(!trailing.is_match(&out), "trailing pipe for {html}: {out:?}");
        }

        let leading = html_to_markdown("<table><tr><td></td><td>Content</td></tr></table>");
        assert!(!Regex::new(r"(?m)^\s*\|").unwrap().is_match(&leading));

        let all_empty = html_to_markdown("<table><tr><td></td><td></td></tr></table>");
        assert!(!all_empty.contains('|'));

        let middle = html_to_markdown("<table><tr><td>Left</td><td></td><td>Right</td></tr></table>");
        assert!(middle.contains("Left | Right"));
        assert!(!Regex::new(r"\| *\|").unwrap().is_match(&middle));
    }

    #[test]
    fn nested_multi_column_table_keeps_inner_pipes() {
        let out = html_to_markdown(
            "<table><tr><td><table><tr><td>Inner Left</td><td>Inner Right</td></tr></table></td></tr></table>",
        );
        assert!(out.contains("Inner Left | Inner Right"));
    }

    #[test]
    fn multi_column_rows_with_formatted_cells() {
        let out = html_to_markdown(
            "<table><tr><td><strong>Bold</strong></td><td><em>Italic</em></td></tr></table>",
        );
        assert!(out.contains("**Bold** | _Italic_"));

        let links = html_to_markdown(
            r#"<table><tr><td><a href="https://example.com">Link A</a></td><td><a href="https://other.com">Link B</a></td></tr></table>"#,
        );
        assert!(links.contains("[Link A](https://example.com) | [Link B](https://other.com)"));
    }

    #[test]
    fn cells_with_block_elements_join_on_one_line() {
        let out = html_to_markdown(
            "<table><tr><td><p>Paragraph in cell 1</p></td><td><p>Paragraph in cell 2</p></td></tr></table>",
        );
        assert!(
            Regex::new(r"Paragraph in cell 1.*\|.*Paragraph in cell 2")
                .unwrap()
                .is_match(&out),
            "got {out:?}"
        );
    }

    #[test]
    fn tables_inside_blockquotes_keep_pipe_separators() {
        let out = html_to_markdown(
            "<blockquote><table><tr><td>Quoted Left</td><td>Quoted Right</td></tr></table></blockquote>",
        );
        assert!(out.contains("Quoted Left | Quoted Right"));
    }

    #[test]
    fn ignores_scripts_styles_and_head() {
        let out = html_to_markdown(
            r#"<p>Content</p><script>alert("x")</script><style>.foo{}</style>"#,
        );
        assert!(out.contains("Content"));
        assert!(!out.contains("alert"));
        assert!(!out.contains(".foo"));

        let doc = html_to_markdown("<html><head><title>Page</title></head><body>Content</body></html>");
        assert!(doc.contains("Content"));
        assert!(!doc.contains("Page"));
    }

    #[test]
    fn ignores_data_uri_images() {
        let out = html_to_markdown(r#"<p>Text</p><img src="data:image/gif;base64,R0lGOD" alt="t">"#);
        assert!(out.contains("Text"));
        assert!(!out.contains("data:"));
        assert!(!out.contains("!["));
    }

    #[test]
    fn ignores_outlook_conditional_comments() {
        let out = html_to_markdown(
            "<!--[if mso]><table><tr><td>MSO only</td></tr></table><![endif]--><p>Normal content</p>",
        );
        assert!(out.contains("Normal content"));
        assert!(!out.contains("MSO only"));
    }

    #[test]
    fn keeps_text_of_legacy_and_office_elements() {
        let out = html_to_markdown(
            r#"<o:p>Office paragraph</o:p><font color="red">Red text</font><p><mark>marked</mark> <u>lined</u></p>"#,
        );
        assert!(out.contains("Office paragraph"));
        assert!(out.contains("Red text"));
        assert!(out.contains("marked"));
        assert!(out.contains("lined"));
    }

    #[test]
    fn decodes_entities_via_the_parser() {
        let out = html_to_markdown("<p>&amp; &lt; &gt; &quot; &copy;</p>");
        for needle in ["&", "<", ">", "\"", "©"] {
            assert!(out.contains(needle), "missing {needle} in {out:?}");
        }
    }

    #[test]
    fn nested_blockquotes_double_the_marker() {
        let out = html_to_markdown("<blockquote>Level 1<blockquote>Level 2</blockquote></blockquote>");
        assert!(out.contains("> Level 1"), "got {out:?}");
        assert!(out.contains(">> Level 2"), "got {out:?}");
    }

    #[test]
    fn images_with_alt_and_title() {
        let out = html_to_markdown(r#"<img src="https://example.com/img.png" alt="Description" title="Title">"#);
        assert!(out.contains("![Description](https://example.com/img.png"));
        assert!(out.contains("Title"));

        let bare = html_to_markdown(r#"<img src="https://example.com/img.png">"#);
        assert!(bare.contains("![](https://example.com/img.png)"));
    }

    #[test]
    fn image_cells_join_with_pipes() {
        let out = html_to_markdown(
            r#"<table><tr><td><img src="https://example.com/a.png" alt="Icon A"></td><td><img src="https://example.com/b.png" alt="Icon B"></td></tr></table>"#,
        );
        assert!(Regex::new(r"Icon A.*\|.*Icon B").unwrap().is_match(&out));
    }

    #[test]
    fn normalizes_excess_whitespace() {
        let out = html_to_markdown("<p>   Multiple   spaces   </p>");
        assert!(!Regex::new(r"\s{3,}").unwrap().is_match(&out), "got {out:?}");
        assert!(out.contains("Multiple"));
        assert!(out.contains("spaces"));
    }

    #[test]
    fn renders_lists() {
        let out = html_to_markdown("<ul><li>Item 1</li><li>Item 2</li></ul>");
        assert!(out.contains("* Item 1"));
        assert!(out.contains("* Item 2"));

        let ordered = html_to_markdown("<ol><li>First</li><li>Second</li></ol>");
        assert!(ordered.contains("1. First"));
        assert!(ordered.contains("2. Second"));
    }

    #[test]
    fn renders_inline_code_and_code_blocks() {
        let out = html_to_markdown("<p>Use the <code>npm install</code> command</p>");
        assert!(out.contains("`npm install`"));

        let pre = html_to_markdown("<pre><code>function test() {\n  return true;\n}</code></pre>");
        assert!(pre.contains("```"));
        assert!(pre.contains("function test()"));
    }

    #[test]
    fn renders_horizontal_rules() {
        let out = html_to_markdown("<p>Above</p><hr><p>Below</p>");
        assert!(out.contains("---"));
    }

    #[test]
    fn text_to_html_expands_markdown() {
        let out = text_to_html("Hello **world**");
        assert!(out.contains("<p>"));
        assert!(out.contains("<strong>world</strong>"));
    }

    #[test]
    fn text_to_html_of_plain_lines_keeps_content() {
        let out = text_to_html("Hi there");
        assert!(out.contains("Hi there"));
    }
}
