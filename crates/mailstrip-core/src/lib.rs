//! Shared types for the mailstrip workspace.
//!
//! Everything here is backend-agnostic: the engine crate (`mailstrip`) and the
//! CLI both consume these without pulling in the HTML machinery.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Construction requires at least one of html/text; a message with
    /// neither rendering cannot be de-quoted.
    #[error("invalid input: at least one of html or text must be provided")]
    InvalidInput,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Output mode for the engine accessors.
///
/// `Clean` passes HTML through the sanitizer before returning; `Raw` returns
/// the pruned-but-unsanitized rendering. Results are memoized per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Clean,
    Raw,
}

/// Observability hooks for conditions that are diagnostic, not failures.
///
/// The engine reports here when a quote-like or signature-like class name is
/// present in the document but no cascade rule consumed it, and when no text
/// pattern matched at all. Absence of a recognized quote is a valid outcome,
/// so none of these are errors.
pub trait Diagnostics {
    /// A `class*="quote"` element survived the cascade unconsumed.
    fn quote_markup_seen(&self, html: &str) {
        let _ = html;
    }

    /// A `class*="sign"` element survived the cascade unconsumed.
    fn signature_markup_seen(&self, html: &str) {
        let _ = html;
    }

    /// The pattern table found no quote header in the flattened text.
    fn no_pattern_matched(&self, text: &str) {
        let _ = text;
    }
}

/// Default hooks: ignore everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

/// Hooks that emit `tracing` debug events with a bounded preview of the
/// offending content.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

fn preview(s: &str) -> String {
    s.chars().take(100).collect()
}

impl Diagnostics for TracingDiagnostics {
    fn quote_markup_seen(&self, html: &str) {
        tracing::debug!(preview = %preview(html), "quote-like markup not consumed by any rule");
    }

    fn signature_markup_seen(&self, html: &str) {
        tracing::debug!(preview = %preview(html), "signature-like markup not consumed by any rule");
    }

    fn no_pattern_matched(&self, text: &str) {
        tracing::debug!(preview = %preview(text), "no quote-header pattern matched");
    }
}
