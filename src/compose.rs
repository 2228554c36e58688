//! Markup composition: wrap located spans without corrupting the document.
//!
//! Splicing markup into a string shifts every offset after the splice point.
//! Processing spans in **descending start order** sidesteps this entirely:
//! each splice only touches text after all still-pending spans, so their
//! offsets stay valid against the untouched prefix. Overlapping spans are
//! dropped silently (the higher-offset span, spliced first, wins).
//!
//! Stripping the emitted tags reconstructs the original document exactly;
//! markup wraps characters, it never edits them.

use crate::annotation::LocatedSpan;
use crate::offset::{char_len, chars_to_bytes};

/// Paragraph separator. Span content crossing one of these is split and each
/// fragment wrapped independently, so markup never straddles block structure
/// in the downstream renderer.
const PARAGRAPH_BREAK: &str = "\n\n";

/// Render the document with every safe span wrapped in markup.
///
/// Spans are spliced in descending `start` order. A span is dropped
/// (silently, with a `log::debug!` diagnostic) when:
/// - its offsets are invalid or out of bounds, or
/// - it would overlap a span already spliced at a higher offset.
///
/// Characters outside any span appear exactly once, untouched. A call with
/// zero spans returns the document unchanged.
#[must_use]
pub fn compose(document: &str, spans: &[LocatedSpan]) -> String {
    let doc_char_len = char_len(document);

    let mut ordered: Vec<&LocatedSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut out = document.to_string();
    // Lowest start spliced so far; a pending span may not reach past it.
    let mut low_water = doc_char_len;

    for span in ordered {
        if span.start > span.end || span.end > doc_char_len {
            log::debug!(
                "skipping span with invalid bounds: [{}, {})",
                span.start,
                span.end
            );
            continue;
        }
        if span.end > low_water {
            log::debug!(
                "skipping overlapping span: [{}, {}) reaches past {}",
                span.start,
                span.end,
                low_water
            );
            continue;
        }

        // Byte offsets computed against the original document stay valid in
        // `out`: everything below `low_water` is still untouched.
        let (byte_start, byte_end) = chars_to_bytes(document, span.start, span.end);
        let content = &document[byte_start..byte_end];
        out.replace_range(byte_start..byte_end, &wrap(content, span));
        low_water = span.start;
    }

    out
}

/// Wrap span content in markup, splitting at paragraph boundaries.
fn wrap(content: &str, span: &LocatedSpan) -> String {
    if content.contains(PARAGRAPH_BREAK) {
        content
            .split(PARAGRAPH_BREAK)
            .map(|fragment| tag(fragment, span))
            .collect::<Vec<_>>()
            .join(PARAGRAPH_BREAK)
    } else {
        tag(content, span)
    }
}

/// One markup tag. The category becomes a class; the tooltip an escaped
/// `title` attribute. Content is emitted verbatim so stripping tags yields
/// the original characters.
fn tag(content: &str, span: &LocatedSpan) -> String {
    if span.tooltip.is_empty() {
        format!(
            r#"<span class="note-{}">{}</span>"#,
            span.category.css_class(),
            content
        )
    } else {
        format!(
            r#"<span class="note-{}" title="{}">{}</span>"#,
            span.category.css_class(),
            escape_attribute(&span.tooltip),
            content
        )
    }
}

/// Escape text for use inside a double-quoted HTML attribute.
fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Remove every markup tag emitted by [`compose`], recovering the original
/// document. Intended for round-trip verification and plain-text export.
#[must_use]
pub fn strip_markup(annotated: &str) -> String {
    let mut out = String::with_capacity(annotated.len());
    let mut rest = annotated;
    while let Some(open) = rest.find("<span class=\"note-") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open..];
        match after_open.find('>') {
            Some(close) => rest = &after_open[close + 1..],
            None => {
                // Truncated tag; emit as-is rather than lose text.
                out.push_str(after_open);
                return out;
            }
        }
    }
    out.push_str(rest);
    out.replace("</span>", "")
}
