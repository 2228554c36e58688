//! # marginalia
//!
//! Offset reconciliation and safe span highlighting for document feedback.
//!
//! External producers (LLMs, grammar tools) flag spans of a document —
//! errors, arguments, style problems — but the character offsets they report
//! are computed against *their* copy of the text, which rarely matches the
//! one being rendered (newlines collapsed to spaces, mojibake, truncated
//! excerpts). Splicing markup at those offsets corrupts the text. This crate
//! recovers the real spans and wraps them safely:
//!
//! - [`Locator`] resolves each [`RawAnnotation`] to a [`LocatedSpan`] in the
//!   original text, via exact match, normalized-view match, and
//!   context-assisted disambiguation, degrading gracefully to a per-annotation
//!   [`LocateFailure`] instead of crashing the pass.
//! - [`compose`] renders the document with every located span wrapped in
//!   non-overlapping markup; stripping the markup reconstructs the document
//!   exactly.
//!
//! ## Quick start
//!
//! ```rust
//! use marginalia::{highlight, Category, RawAnnotation};
//!
//! let document = "The qick brown fox.";
//! let annotations = vec![RawAnnotation::new("qick", Category::Spelling)];
//!
//! let result = highlight(document, &annotations);
//! assert!(result.html.contains(r#"<span class="note-spelling">qick</span>"#));
//! assert!(result.dropped.is_empty());
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! producer JSON ──ingest──► RawAnnotation ──Locator──► LocatedSpan ──compose──► annotated text
//!                                │                          │
//!                                └── malformed records ─────┴── dropped with reasons (logged)
//! ```
//!
//! ## Design
//!
//! - **Pure core**: `locate` and `compose` take immutable inputs and return
//!   new values; no I/O, no shared state, safe to call concurrently from
//!   multiple rendering passes.
//! - **Nothing is fatal**: a pass where every annotation fails still returns
//!   the unmodified document. Drop reasons surface through [`LocateFailure`]
//!   and the `log` facade, not through panics.
//! - **Character offsets at the boundary**: producers count characters;
//!   byte conversion is internal.

#![warn(missing_docs)]

mod annotation;
mod compose;
mod error;
pub mod ingest;
mod locate;
mod normalize;
pub mod offset;
pub mod prepare;

pub use annotation::{Category, LocatedSpan, RawAnnotation, Suggestion};
pub use compose::{compose, strip_markup};
pub use error::{Error, Result};
pub use ingest::{parse_arguments, parse_corrections, parse_with_retries, ArgumentRecord};
pub use locate::{DroppedAnnotation, LocateFailure, LocateOutcome, Locator};
pub use normalize::NormalizedView;

/// Output of the full locate-then-compose pipeline.
#[derive(Debug, Clone)]
pub struct Highlighted {
    /// The document with markup wrapped around every located span.
    pub html: String,
    /// The spans that made it into the output.
    pub located: Vec<LocatedSpan>,
    /// Annotations that could not be located, with diagnostic reasons.
    pub dropped: Vec<DroppedAnnotation>,
}

/// Locate a batch of annotations and render the highlighted document.
///
/// Convenience wrapper over [`Locator::locate_all`] and [`compose`] with
/// default (per-annotation independent) matching. Annotations that fail to
/// locate are absent from the output and reported in
/// [`dropped`](Highlighted::dropped); they never abort the render.
#[must_use]
pub fn highlight(document: &str, annotations: &[RawAnnotation]) -> Highlighted {
    let mut locator = Locator::new(document);
    let outcome = locator.locate_all(annotations);
    let html = compose(document, &outcome.spans);
    Highlighted {
        html,
        located: outcome.spans,
        dropped: outcome.dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_empty_batch_returns_document() {
        let result = highlight("unchanged text", &[]);
        assert_eq!(result.html, "unchanged text");
        assert!(result.located.is_empty());
        assert!(result.dropped.is_empty());
    }

    #[test]
    fn test_highlight_all_failures_returns_document() {
        let annotations = vec![RawAnnotation::new("absent", Category::Grammar)];
        let result = highlight("present words only", &annotations);
        assert_eq!(result.html, "present words only");
        assert_eq!(result.dropped.len(), 1);
    }
}
