//! Span location: reconcile claimed annotation positions with the document.
//!
//! Producers report where an error sits, but their offsets are computed
//! against *their* copy of the text — frequently one with newlines collapsed
//! to spaces, sometimes with different encoding artifacts. Trusting those
//! offsets verbatim corrupts highlights. The locator instead re-derives every
//! span from the annotation's `error` text and `context` snippet:
//!
//! 1. Exact-unique match against the original document.
//! 2. Exact-unique match against the [`NormalizedView`], mapped back through
//!    its offset table.
//! 3. Context-assisted match: find the context in the normalized view, then
//!    the error within the context window.
//!
//! Every failure is a value ([`LocateFailure`]); one bad annotation never
//! blocks the rest of the batch.

use crate::annotation::{LocatedSpan, RawAnnotation};
use crate::normalize::NormalizedView;
use crate::offset::{char_len, char_occurrences};
use std::ops::Range;
use thiserror::Error;

/// Long errors with no context fall back to matching this many leading
/// characters when the full text cannot be found (PDF extraction tends to
/// mangle the tail of long excerpts more than the head).
const PREFIX_FALLBACK_CHARS: usize = 50;

/// Why an annotation could not be located.
///
/// These are per-annotation diagnostics, not crate errors: the batch API
/// drops the annotation, records the reason, and keeps going.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LocateFailure {
    /// The annotation is missing its error text.
    #[error("annotation is missing its error text")]
    Malformed,

    /// The error text contains a raw newline; multi-line spans are excluded
    /// because markup must not straddle line structure.
    #[error("error text spans multiple lines")]
    UnsupportedSpan,

    /// The error text occurs more than once and no context disambiguates it.
    #[error("error text is ambiguous and no context disambiguates it")]
    Ambiguous,

    /// Neither the error text nor its context could be located.
    #[error("neither the error text nor its context was found in the document")]
    ContextNotFound,

    /// The context was found, but the error text does not occur inside it.
    #[error("error text not found inside its context window")]
    ErrorNotInContext,

    /// The computed span falls outside the document's valid index range.
    #[error("computed span falls outside the document")]
    OutOfBounds,
}

impl LocateFailure {
    /// Stable diagnostic token for logs and structured reporting.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            LocateFailure::Malformed => "malformed",
            LocateFailure::UnsupportedSpan => "unsupported-span",
            LocateFailure::Ambiguous => "ambiguous",
            LocateFailure::ContextNotFound => "context-not-found",
            LocateFailure::ErrorNotInContext => "error-not-in-context",
            LocateFailure::OutOfBounds => "out-of-bounds",
        }
    }
}

/// A dropped annotation with its diagnostic reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedAnnotation {
    /// Index of the annotation in the input batch.
    pub index: usize,
    /// The annotation's error text (for log correlation).
    pub error: String,
    /// Why it was dropped.
    pub reason: LocateFailure,
}

/// Result of locating a batch of annotations.
#[derive(Debug, Clone, Default)]
pub struct LocateOutcome {
    /// Successfully located spans, in input order.
    pub spans: Vec<LocatedSpan>,
    /// Annotations that could not be located, with reasons.
    pub dropped: Vec<DroppedAnnotation>,
}

/// Resolves annotations to character spans in one document.
///
/// Builds the normalized view once; each [`locate`](Locator::locate) call is
/// then pure. The optional strict mode
/// ([`with_context_consumption`](Locator::with_context_consumption)) marks
/// matched context windows as consumed so two annotations in the same batch
/// cannot claim the same text; the default is independent per-annotation
/// matching, first occurrence wins.
#[derive(Debug)]
pub struct Locator<'a> {
    document: &'a str,
    doc_char_len: usize,
    view: NormalizedView,
    consume_contexts: bool,
    consumed: Vec<Range<usize>>,
}

impl<'a> Locator<'a> {
    /// Create a locator for a document.
    #[must_use]
    pub fn new(document: &'a str) -> Self {
        Self {
            document,
            doc_char_len: char_len(document),
            view: NormalizedView::new(document),
            consume_contexts: false,
            consumed: Vec::new(),
        }
    }

    /// Enable context consumption: each matched context window is claimed by
    /// at most one annotation per batch.
    #[must_use]
    pub fn with_context_consumption(mut self) -> Self {
        self.consume_contexts = true;
        self
    }

    /// The document this locator addresses.
    #[must_use]
    pub fn document(&self) -> &str {
        self.document
    }

    /// Locate a single annotation.
    ///
    /// Pure: the same (document, annotation) pair always yields the same
    /// result. Context consumption does not apply here; use
    /// [`locate_all`](Locator::locate_all) for batch semantics.
    pub fn locate(&self, annotation: &RawAnnotation) -> Result<LocatedSpan, LocateFailure> {
        self.locate_inner(annotation, &[]).map(|(span, _)| span)
    }

    /// Locate a batch of annotations, dropping failures with diagnostics.
    ///
    /// Each drop is logged via `log::warn!` with its reason token; nothing
    /// here panics or propagates. A batch where every annotation fails still
    /// produces an empty (usable) outcome.
    pub fn locate_all(&mut self, annotations: &[RawAnnotation]) -> LocateOutcome {
        let mut outcome = LocateOutcome::default();
        for (index, annotation) in annotations.iter().enumerate() {
            let consumed: &[Range<usize>] = if self.consume_contexts {
                &self.consumed
            } else {
                &[]
            };
            match self.locate_inner(annotation, consumed) {
                Ok((span, used_context)) => {
                    if self.consume_contexts {
                        if let Some(range) = used_context {
                            self.consumed.push(range);
                        }
                    }
                    outcome.spans.push(span);
                }
                Err(reason) => {
                    log::warn!(
                        "dropping annotation {index} ({}): {:?}",
                        reason.reason(),
                        truncate(&annotation.error, 60),
                    );
                    outcome.dropped.push(DroppedAnnotation {
                        index,
                        error: annotation.error.clone(),
                        reason,
                    });
                }
            }
        }
        outcome
    }

    /// Core strategy chain. Returns the span plus the normalized context
    /// range it consumed, if the context path was taken.
    fn locate_inner(
        &self,
        annotation: &RawAnnotation,
        consumed: &[Range<usize>],
    ) -> Result<(LocatedSpan, Option<Range<usize>>), LocateFailure> {
        if annotation.error.is_empty() {
            return Err(LocateFailure::Malformed);
        }
        if annotation.error.contains('\n') {
            return Err(LocateFailure::UnsupportedSpan);
        }

        let error_chars = annotation.error.chars().count();
        // Trust the claimed length over the error's own length when they
        // disagree; producers sometimes quote a shortened error string.
        let span_len = annotation.length.unwrap_or(error_chars);

        // Strategy 1: exact-unique match against the original document.
        let direct = char_occurrences(self.document, &annotation.error);
        if direct.len() == 1 {
            let span = self.checked_span(direct[0], direct[0] + span_len, annotation)?;
            return Ok((span, None));
        }

        let norm_error = NormalizedView::normalize_snippet(&annotation.error);

        // Strategy 2: the error text was not found verbatim (or not uniquely);
        // try an exact-unique match against the normalized view.
        let norm_hits = if direct.is_empty() {
            let hits = self.view.find_all(&norm_error);
            if hits.len() == 1 {
                let span = self.mapped_span(hits[0], hits[0] + span_len, annotation)?;
                return Ok((span, None));
            }
            hits.len()
        } else {
            direct.len()
        };

        // Strategy 3: context-assisted disambiguation.
        if let Some(context) = &annotation.context {
            let (span, range) =
                self.locate_in_context(context, &norm_error, span_len, annotation, consumed)?;
            return Ok((span, Some(range)));
        }

        // No context to lean on.
        if norm_hits > 1 {
            return Err(LocateFailure::Ambiguous);
        }

        // Long excerpts get one more chance via their leading characters
        // before we give up.
        if error_chars > PREFIX_FALLBACK_CHARS {
            let prefix: String = norm_error.chars().take(PREFIX_FALLBACK_CHARS).collect();
            let hits = self.view.find_all(&prefix);
            if hits.len() == 1 {
                let span = self.mapped_span(hits[0], hits[0] + span_len, annotation)?;
                return Ok((span, None));
            }
        }
        Err(LocateFailure::ContextNotFound)
    }

    fn locate_in_context(
        &self,
        context: &str,
        norm_error: &str,
        span_len: usize,
        annotation: &RawAnnotation,
        consumed: &[Range<usize>],
    ) -> Result<(LocatedSpan, Range<usize>), LocateFailure> {
        let norm_context = NormalizedView::normalize_snippet(context);
        let context_chars = norm_context.chars().count();

        // Earliest unused occurrence wins.
        let ctx_start = self
            .view
            .find_all(&norm_context)
            .into_iter()
            .find(|&start| {
                let candidate = start..start + context_chars;
                !consumed.iter().any(|used| ranges_overlap(used, &candidate))
            })
            .ok_or(LocateFailure::ContextNotFound)?;

        let error_in_context = char_occurrences(&norm_context, norm_error)
            .first()
            .copied()
            .ok_or(LocateFailure::ErrorNotInContext)?;

        let norm_start = ctx_start + error_in_context;
        let span = self.mapped_span(norm_start, norm_start + span_len, annotation)?;
        Ok((span, ctx_start..ctx_start + context_chars))
    }

    /// Build a span from original-document char offsets, bounds-checked.
    fn checked_span(
        &self,
        start: usize,
        end: usize,
        annotation: &RawAnnotation,
    ) -> Result<LocatedSpan, LocateFailure> {
        if start > end || end > self.doc_char_len {
            return Err(LocateFailure::OutOfBounds);
        }
        Ok(LocatedSpan::new(
            start,
            end,
            annotation.category.clone(),
            annotation.tooltip(),
        ))
    }

    /// Build a span from normalized-view char offsets, mapping back to
    /// original coordinates first.
    fn mapped_span(
        &self,
        norm_start: usize,
        norm_end: usize,
        annotation: &RawAnnotation,
    ) -> Result<LocatedSpan, LocateFailure> {
        if norm_start > norm_end || norm_end > self.view.char_len() {
            return Err(LocateFailure::OutOfBounds);
        }
        let (start, end) = self.view.to_original(norm_start, norm_end);
        self.checked_span(start, end, annotation)
    }
}

const fn ranges_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
