//! Whitespace- and encoding-normalized view of a document.
//!
//! Annotation producers often compute positions against a copy of the text
//! whose newlines were collapsed to spaces, and PDF-extracted text sometimes
//! carries mojibake (UTF-8 read as Latin-1, so a right single quote arrives
//! as `â€™`). Matching against a normalized view recovers spans the original
//! text would miss — but the *output* must address the original, so the view
//! carries a normalized-char → original-char offset map.
//!
//! Normalization is used for matching only; it is never applied to rendered
//! output.

use crate::offset::char_occurrences;

/// Mojibake sequences repaired during normalization, with their replacements.
///
/// Each entry is the character sequence as it appears after a UTF-8 byte
/// string has been mis-decoded as Latin-1/Windows-1252.
const MOJIBAKE: &[(&[char], char)] = &[
    // U+2019 RIGHT SINGLE QUOTATION MARK mis-decoded
    (&['â', '\u{20ac}', '\u{2122}'], '\''),
];

/// A matching view of a document with collapsed newlines and repaired
/// mojibake, plus the offset map back to original character coordinates.
#[derive(Debug, Clone)]
pub struct NormalizedView {
    text: String,
    /// `map[i]` = original char offset where normalized char `i` begins.
    map: Vec<usize>,
    original_char_len: usize,
}

impl NormalizedView {
    /// Build the normalized view of a document.
    #[must_use]
    pub fn new(document: &str) -> Self {
        let chars: Vec<char> = document.chars().collect();
        let mut text = String::with_capacity(document.len());
        let mut map = Vec::with_capacity(chars.len());

        let mut i = 0;
        'outer: while i < chars.len() {
            for (sequence, replacement) in MOJIBAKE {
                if chars[i..].starts_with(sequence) {
                    text.push(*replacement);
                    map.push(i);
                    i += sequence.len();
                    continue 'outer;
                }
            }
            if chars[i] == '\n' {
                text.push(' ');
            } else {
                text.push(chars[i]);
            }
            map.push(i);
            i += 1;
        }

        Self {
            text,
            map,
            original_char_len: chars.len(),
        }
    }

    /// The normalized text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character length of the normalized text.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.map.len()
    }

    /// Map a normalized char range back to original char coordinates.
    ///
    /// Because normalization is order-preserving, the exclusive end maps to
    /// the start of the next normalized character (or the end of the
    /// original text).
    #[must_use]
    pub fn to_original(&self, norm_start: usize, norm_end: usize) -> (usize, usize) {
        let start = self
            .map
            .get(norm_start)
            .copied()
            .unwrap_or(self.original_char_len);
        let end = self
            .map
            .get(norm_end)
            .copied()
            .unwrap_or(self.original_char_len);
        (start, end)
    }

    /// All occurrences of `needle` in the normalized text, as normalized
    /// char offsets.
    #[must_use]
    pub fn find_all(&self, needle: &str) -> Vec<usize> {
        char_occurrences(&self.text, needle)
    }

    /// Apply the same normalization to a free-standing snippet (a context
    /// string or error string from a producer), so needles and haystack agree.
    #[must_use]
    pub fn normalize_snippet(snippet: &str) -> String {
        let view = NormalizedView::new(snippet);
        view.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines_collapse_to_spaces() {
        let view = NormalizedView::new("This is\na broken\nline.");
        assert_eq!(view.text(), "This is a broken line.");
        // 1:1 replacement keeps offsets identical.
        assert_eq!(view.to_original(8, 14), (8, 14));
    }

    #[test]
    fn test_mojibake_repair_shifts_offsets() {
        // "itâ€™s fine" should match as "it's fine".
        let view = NormalizedView::new("itâ\u{20ac}\u{2122}s fine");
        assert_eq!(view.text(), "it's fine");
        // Normalized "s fine" starts at norm char 3, original char 5.
        assert_eq!(view.to_original(3, 9), (5, 11));
        // The apostrophe itself covers original chars 2..5.
        assert_eq!(view.to_original(2, 3), (2, 5));
    }

    #[test]
    fn test_find_all_normalized() {
        let view = NormalizedView::new("one\ntwo one");
        assert_eq!(view.find_all("one two"), vec![0]);
        assert_eq!(view.find_all("one"), vec![0, 8]);
    }

    #[test]
    fn test_range_end_at_text_boundary() {
        let view = NormalizedView::new("abc");
        assert_eq!(view.to_original(0, 3), (0, 3));
    }

    #[test]
    fn test_snippet_normalization_matches_view() {
        let doc = NormalizedView::new("a\nb");
        assert_eq!(NormalizedView::normalize_snippet("a\nb"), doc.text());
    }
}
