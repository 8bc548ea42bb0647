//! SMS message formatting for the IPROG gateway
//!
//! The gateway's accepted message format is an external contract rediscovered
//! against the live service: bodies outside printable ASCII are rejected or
//! mangled, and anything past three concatenated segments is dropped. The
//! transform here is pure and deterministic so the same raw text always
//! produces the same wire body.

use unicode_normalization::UnicodeNormalization;

/// Maximum message length the gateway accepts (three 160-character segments).
pub const MAX_MESSAGE_LEN: usize = 480;

/// Format a raw free-text message into a gateway-safe body.
///
/// Applies, in order: replacement of common typographic characters with ASCII
/// equivalents, NFKD normalization (so accented letters fold to their base
/// letter), removal of everything outside printable ASCII, whitespace
/// collapsing, and truncation to [`MAX_MESSAGE_LEN`].
#[must_use]
pub fn format_message(raw: &str) -> String {
    let mapped: String = raw.chars().map(map_typographic).collect();

    // NFKD splits accented letters into base + combining mark; the combining
    // marks are non-ASCII and fall out in the filter below.
    let ascii: String = mapped
        .nfkd()
        .filter(|c| c.is_ascii() && (!c.is_ascii_control() || c.is_ascii_whitespace()))
        .collect();

    let collapsed = ascii.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.chars().take(MAX_MESSAGE_LEN).collect()
}

/// Map typographic punctuation the gateway rejects onto ASCII equivalents.
///
/// NFKD does not decompose these, so they are handled explicitly.
const fn map_typographic(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
        '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
        '\u{2026}' => '.',
        '\u{00A0}' => ' ',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_passes_through() {
        assert_eq!(
            format_message("Good morning, class 4-B is dismissed."),
            "Good morning, class 4-B is dismissed."
        );
    }

    #[test]
    fn test_accents_fold_to_base_letters() {
        assert_eq!(format_message("José García está ausente"), "Jose Garcia esta ausente");
    }

    #[test]
    fn test_smart_quotes_become_ascii() {
        assert_eq!(format_message("\u{201C}quoted\u{201D} \u{2018}text\u{2019}"), "\"quoted\" 'text'");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(format_message("  two\t\twords \n here  "), "two words here");
    }

    #[test]
    fn test_emoji_stripped() {
        assert_eq!(format_message("Hello \u{1F600} world"), "Hello world");
    }

    #[test]
    fn test_truncated_to_max_len() {
        let long = "a".repeat(MAX_MESSAGE_LEN + 50);
        assert_eq!(format_message(&long).len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(format_message("ding\u{7}dong\0"), "dingdong");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_message(""), "");
    }
}
