//! Text limits and character-safe truncation helpers.
//!
//! All limits count Unicode scalar values (`char`s), never bytes, so a
//! truncation can never split a multi-byte character.

/// Maximum length of a submission's raw text.
pub const RAW_TEXT_MAX_CHARS: usize = 300;

/// Maximum length of a summary.
pub const SUMMARY_MAX_CHARS: usize = 50;

/// Marker appended when text is shortened for display.
pub const ELLIPSIS: &str = "...";

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Borrow at most `max_chars` characters from the front of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Shorten `text` to at most `max_chars` characters, marking the cut with
/// [`ELLIPSIS`]. Text that already fits is returned unchanged.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let marker_len = ELLIPSIS.len();
    if max_chars <= marker_len {
        return truncate_chars(text, max_chars).to_string();
    }
    let mut out = truncate_chars(text, max_chars - marker_len).to_string();
    out.push_str(ELLIPSIS);
    out
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse line breaks into single spaces and trim the result.
pub fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: ellipsize never exceeds the limit and is the identity on fitting text
        #[test]
        fn prop_ellipsize_bounded(text in "\\PC{0,120}", max in 4usize..80) {
            let out = ellipsize(&text, max);
            prop_assert!(char_len(&out) <= max);
            if char_len(&text) <= max {
                prop_assert_eq!(out, text);
            }
        }

        /// Property: truncate_chars yields a prefix of at most max characters
        #[test]
        fn prop_truncate_is_prefix(text in "\\PC{0,400}", max in 0usize..400) {
            let out = truncate_chars(&text, max);
            prop_assert!(char_len(out) <= max);
            prop_assert!(text.starts_with(out));
        }
    }
}
