//! The quote engine: sequences the signature cascade, the pattern table and
//! the boundary mapper over one message, and exposes memoized accessors.
//!
//! One instance owns one message. There is no shared mutable state between
//! instances (the rule and pattern tables are static and read-only), so
//! independent messages can be processed concurrently.

use html_scraper::{Html, Selector};
use mailstrip_core::{Diagnostics, Error, NoopDiagnostics, RenderMode, Result};

use crate::{boundary, markdown, patterns, render, sanitize, signatures, text};

pub struct Unquote {
    original_html: Option<String>,
    original_text: Option<String>,
    // De-quoted outputs, computed by `parse`.
    html: Option<String>,
    text: Option<String>,
    quote: Option<String>,
    // Per-mode memos, filled on first access.
    clean_html: Option<String>,
    clean_text: Option<String>,
    clean_quote: Option<String>,
    markdown: Option<String>,
    diagnostics: Box<dyn Diagnostics + Send + Sync>,
}

fn has_selector_match(doc: &Html, selector: &str) -> bool {
    let Ok(sel) = Selector::parse(selector) else {
        return false;
    };
    doc.select(&sel).next().is_some()
}

impl Unquote {
    /// Build an engine for one message and run the full pipeline eagerly.
    /// At least one of `html`/`text` must be non-empty.
    pub fn new(html: Option<&str>, text: Option<&str>) -> Result<Self> {
        Self::with_diagnostics(html, text, Box::new(NoopDiagnostics))
    }

    /// Same as [`Unquote::new`] with custom observability hooks.
    pub fn with_diagnostics(
        html: Option<&str>,
        text: Option<&str>,
        diagnostics: Box<dyn Diagnostics + Send + Sync>,
    ) -> Result<Self> {
        // NBSP folds to a plain space up front so every downstream comparison
        // sees one whitespace alphabet.
        let original_html = html
            .filter(|s| !s.is_empty())
            .map(|s| s.replace('\u{a0}', " "));
        let original_text = text
            .filter(|s| !s.is_empty())
            .map(|s| s.replace('\u{a0}', " "));
        if original_html.is_none() && original_text.is_none() {
            return Err(Error::InvalidInput);
        }

        let mut engine = Self {
            original_html,
            original_text,
            html: None,
            text: None,
            quote: None,
            clean_html: None,
            clean_text: None,
            clean_quote: None,
            markdown: None,
            diagnostics,
        };
        engine.parse();
        Ok(engine)
    }

    /// Whether a quote was detected and removed from this message.
    pub fn quote_removed(&self) -> bool {
        self.quote.is_some()
    }

    /// De-quoted HTML. `Clean` passes through the sanitizer; `Raw` returns
    /// the pruned but unsanitized rendering.
    pub fn html(&mut self, mode: RenderMode) -> Option<&str> {
        if mode == RenderMode::Raw {
            return self.raw_html();
        }
        if self.clean_html.is_none() {
            let raw = self.raw_html()?.to_string();
            self.clean_html = Some(sanitize::clean_html(&raw));
        }
        self.clean_html.as_deref()
    }

    /// De-quoted text. Inputs that supplied text return it truncated in both
    /// modes; HTML-derived text flattens the sanitized HTML in `Clean` mode.
    pub fn text(&mut self, mode: RenderMode) -> Option<&str> {
        if self.original_text.is_some() || mode == RenderMode::Raw {
            return self.text.as_deref();
        }
        if self.clean_text.is_none() {
            let html = self.html(RenderMode::Clean)?.to_string();
            self.clean_text = Some(text::html_to_text(&html).trim().to_string());
        }
        self.clean_text.as_deref()
    }

    /// The removed quote as HTML, or `None` when the message had no
    /// recognizable quote.
    pub fn quote(&mut self, mode: RenderMode) -> Option<&str> {
        if mode == RenderMode::Raw {
            return self.quote.as_deref();
        }
        if self.clean_quote.is_none() {
            let raw = self.quote.as_deref()?.to_string();
            self.clean_quote = Some(sanitize::clean_html(&raw));
        }
        self.clean_quote.as_deref()
    }

    /// Markdown rendering of the cleaned, de-quoted HTML.
    pub fn markdown(&mut self) -> Option<&str> {
        if self.markdown.is_none() {
            let html = self.html(RenderMode::Clean)?.to_string();
            self.markdown = Some(markdown::html_to_markdown(&html));
        }
        self.markdown.as_deref()
    }

    fn raw_html(&mut self) -> Option<&str> {
        if self.html.is_none() {
            if let Some(text) = &self.text {
                self.html = Some(markdown::text_to_html(text));
            }
        }
        self.html.as_deref()
    }

    /// Run the pipeline: cascade first, then pattern table + boundary mapper.
    /// At most one removal strategy applies per message.
    fn parse(&mut self) {
        self.text = self.original_text.clone();
        self.html = self.original_html.clone();

        if let Some(original_html) = self.original_html.clone() {
            let mut doc = Html::parse_document(&original_html);
            let mut removed = Vec::new();
            if signatures::try_remove_known_quote(&mut doc, &mut removed) {
                let html = render::document_to_html(&doc, &original_html);
                self.text = Some(text::html_to_text(&html).trim().to_string());
                self.html = Some(html);
                self.quote = (!removed.is_empty()).then(|| removed.join("\n"));
                return;
            }
            // Quote-ish or signature-ish markup survived the whole cascade:
            // diagnostic, not a failure.
            if has_selector_match(&doc, "[class*=\"quote\"]") {
                self.diagnostics.quote_markup_seen(&original_html);
            }
            if has_selector_match(&doc, "[class*=\"sign\"]") {
                self.diagnostics.signature_markup_seen(&original_html);
            }
        }

        if self.text.is_none() {
            if let Some(html) = &self.html {
                self.text = Some(text::html_to_text(html).trim().to_string());
            }
        }

        let Some(current_text) = self.text.clone() else {
            return;
        };
        let Some(span) = patterns::find_quote_header(&current_text) else {
            self.diagnostics.no_pattern_matched(&current_text);
            return;
        };

        let truncated = current_text[..span.start].trim().to_string();
        let tail = current_text[span.start..].trim().to_string();
        self.text = Some(truncated.clone());

        match self.original_html.clone() {
            Some(original_html) => {
                // A fresh parse: any non-concluding cascade mutation is
                // discarded here.
                let mut doc = Html::parse_document(&original_html);
                let mut removed = Vec::new();
                if boundary::prune_at_match(&mut doc, &span.text, &mut removed) {
                    self.html = Some(render::document_to_html(&doc, &original_html));
                    self.quote = if removed.is_empty() {
                        Some(markdown::text_to_html(&tail))
                    } else {
                        Some(removed.join("\n"))
                    };
                } else {
                    // No anchor in the tree: rebuild HTML from the truncated
                    // text so both views stay consistent.
                    self.html = Some(markdown::text_to_html(&truncated));
                    self.quote = Some(markdown::text_to_html(&tail));
                }
            }
            None => {
                self.html = Some(markdown::text_to_html(&truncated));
                self.quote = Some(markdown::text_to_html(&tail));
            }
        }
    }
}
