//! Byte/character offset conversion.
//!
//! Annotation producers count positions in **characters** (that is what an
//! LLM or a grammar tool sees), while Rust string slicing needs **byte**
//! offsets. Everything in the public API is character offsets; conversion to
//! bytes happens here, at the splice site.
//!
//! Out-of-range inputs clamp to the end of the text rather than panicking;
//! callers bounds-check spans before slicing.

/// Number of characters in the text.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert character offsets to byte offsets.
///
/// `char_start`/`char_end` past the end of the text clamp to `text.len()`.
#[must_use]
pub fn chars_to_bytes(text: &str, char_start: usize, char_end: usize) -> (usize, usize) {
    let mut byte_start = text.len();
    let mut byte_end = text.len();
    let mut found_start = false;
    let mut found_end = false;

    for (char_idx, (byte_idx, _ch)) in text.char_indices().enumerate() {
        if char_idx == char_start {
            byte_start = byte_idx;
            found_start = true;
        }
        if char_idx == char_end {
            byte_end = byte_idx;
            found_end = true;
        }
        if found_start && found_end {
            break;
        }
    }

    (byte_start, byte_end)
}

/// Convert a byte offset to a character offset.
///
/// The byte offset must lie on a character boundary; mid-character offsets
/// round down to the containing character.
#[must_use]
pub fn byte_to_char(text: &str, byte_offset: usize) -> usize {
    let mut count = 0;
    for (byte_idx, _ch) in text.char_indices() {
        if byte_idx >= byte_offset {
            return count;
        }
        count += 1;
    }
    count
}

/// All occurrences of `needle` in `haystack`, as character offsets.
///
/// An empty needle matches nowhere.
pub(crate) fn char_occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    let mut char_cursor = 0;
    let mut byte_cursor = 0;
    for (byte_idx, _) in haystack.match_indices(needle) {
        char_cursor += haystack[byte_cursor..byte_idx].chars().count();
        byte_cursor = byte_idx;
        hits.push(char_cursor);
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_occurrences() {
        assert_eq!(char_occurrences("cat sat on the cat mat", "cat"), vec![0, 15]);
        assert_eq!(char_occurrences("ab", "z"), Vec::<usize>::new());
        assert_eq!(char_occurrences("ab", ""), Vec::<usize>::new());
        // Offsets are in characters, not bytes.
        assert_eq!(char_occurrences("é cat", "cat"), vec![2]);
    }

    #[test]
    fn test_ascii_identity() {
        let text = "Hello World";
        assert_eq!(chars_to_bytes(text, 6, 11), (6, 11));
        assert_eq!(byte_to_char(text, 6), 6);
        assert_eq!(char_len(text), 11);
    }

    #[test]
    fn test_multibyte_conversion() {
        let text = "café €50";
        // 'é' is 2 bytes, '€' is 3 bytes.
        assert_eq!(char_len(text), 8);
        // chars 5..8 = "€50", bytes: "café " = 6 bytes, so 6..11
        assert_eq!(chars_to_bytes(text, 5, 8), (6, 11));
        assert_eq!(byte_to_char(text, 6), 5);
    }

    #[test]
    fn test_end_of_text() {
        let text = "abc";
        assert_eq!(chars_to_bytes(text, 0, 3), (0, 3));
        assert_eq!(chars_to_bytes(text, 3, 3), (3, 3));
        assert_eq!(byte_to_char(text, 3), 3);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let text = "abc";
        assert_eq!(chars_to_bytes(text, 1, 99), (1, 3));
        assert_eq!(byte_to_char(text, 99), 3);
    }

    #[test]
    fn test_slicing_through_conversion() {
        let text = "naïve approach";
        let (bs, be) = chars_to_bytes(text, 0, 5);
        assert_eq!(&text[bs..be], "naïve");
    }
}
