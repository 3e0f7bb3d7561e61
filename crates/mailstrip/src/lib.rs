//! mailstrip: extract the newly-written part of an email message.
//!
//! Email clients append the quoted prior conversation in wildly inconsistent
//! ways: client-specific markup wrappers, multilingual "On DATE, X wrote:"
//! headers, dashed "Original Message" delimiters. [`Unquote`] detects and
//! removes them, producing consistent de-quoted HTML and text plus the
//! removed quote itself.
//!
//! ```
//! use mailstrip::{RenderMode, Unquote};
//!
//! let html = r#"<div><p>Reply</p><div class="gmail_quote">
//!   <div class="gmail_attr">On Jan 1, John wrote:</div>
//!   <blockquote>Old</blockquote>
//! </div></div>"#;
//!
//! let mut engine = Unquote::new(Some(html), None)?;
//! assert!(engine.html(RenderMode::Raw).unwrap().contains("Reply"));
//! assert!(!engine.html(RenderMode::Raw).unwrap().contains("Old"));
//! assert!(engine.quote(RenderMode::Raw).unwrap().contains("Old"));
//! # Ok::<(), mailstrip::Error>(())
//! ```

pub mod boundary;
pub mod dom;
pub mod engine;
pub mod markdown;
pub mod patterns;
pub mod render;
pub mod sanitize;
pub mod signatures;
pub mod text;

pub use engine::Unquote;
pub use mailstrip_core::{
    Diagnostics, Error, NoopDiagnostics, RenderMode, Result, TracingDiagnostics,
};
