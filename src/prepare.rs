//! Text preparation for extracted documents.
//!
//! PDF extraction leaves artifacts the downstream producers choke on: words
//! hyphen-split across line breaks, and documents too long for one model
//! call. These helpers run *before* annotation, so the canonical document
//! the locator addresses is the repaired text.

use once_cell::sync::Lazy;
use regex::Regex;

/// A word split across a line break with a trailing hyphen.
static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-\s+(\w+)").expect("valid regex"));

/// Rejoin words that extraction split across line breaks
/// (`exam-\nple` → `example`).
///
/// Applied once at ingestion; the rejoined text becomes the canonical
/// document, so annotation offsets are reconciled against it, not against
/// the raw extraction.
#[must_use]
pub fn repair_hyphenation(text: &str) -> String {
    HYPHEN_BREAK.replace_all(text, "$1$2").into_owned()
}

/// Split text into fixed-size chunks of at most `max_chars` characters.
///
/// Chunks split on character boundaries only; no attempt is made to respect
/// words or sentences. An empty text or zero `max_chars` yields no chunks.
#[must_use]
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Split text into overlapping chunks for embedding batches.
///
/// Each chunk holds at most `size` characters; consecutive chunks share
/// `overlap` characters so retrieval does not lose sentences cut at a chunk
/// boundary. `overlap` is clamped below `size`.
#[must_use]
pub fn split_chunks_overlap(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }
    let overlap = overlap.min(size - 1);
    let step = size - overlap;

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenation_repair() {
        assert_eq!(repair_hyphenation("exam-\nple text"), "example text");
        // Replacement is left-to-right, non-overlapping: "line" is consumed
        // by the first match, so the second break survives.
        assert_eq!(
            repair_hyphenation("multi-\n  line-\nbreak"),
            "multiline-\nbreak"
        );
    }

    #[test]
    fn test_hyphenation_leaves_inline_hyphens() {
        // No whitespace after the hyphen, so nothing to repair.
        assert_eq!(repair_hyphenation("well-known"), "well-known");
    }

    #[test]
    fn test_split_chunks_exact_and_remainder() {
        assert_eq!(split_chunks("abcdef", 2), vec!["ab", "cd", "ef"]);
        assert_eq!(split_chunks("abcde", 2), vec!["ab", "cd", "e"]);
        assert_eq!(split_chunks("", 2), Vec::<String>::new());
        assert_eq!(split_chunks("abc", 0), Vec::<String>::new());
    }

    #[test]
    fn test_split_chunks_char_safe() {
        let chunks = split_chunks("ééé", 2);
        assert_eq!(chunks, vec!["éé", "é"]);
    }

    #[test]
    fn test_split_chunks_overlap() {
        let chunks = split_chunks_overlap("abcdefgh", 4, 2);
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh"]);
    }

    #[test]
    fn test_split_chunks_overlap_clamped() {
        // overlap >= size would never advance; it is clamped instead.
        let chunks = split_chunks_overlap("abcd", 2, 5);
        assert_eq!(chunks, vec!["ab", "bc", "cd"]);
    }
}
