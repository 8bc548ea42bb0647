//! Tests for the gateway message formatter

use proptest::prelude::*;
use school_sms_rust::formatter::{format_message, MAX_MESSAGE_LEN};

#[test]
fn test_short_ascii_message_unchanged() {
    assert_eq!(format_message("Classes resume Monday."), "Classes resume Monday.");
}

#[test]
fn test_accented_names_fold() {
    assert_eq!(format_message("Señora Muñoz"), "Senora Munoz");
}

#[test]
fn test_typographic_punctuation_mapped() {
    assert_eq!(
        format_message("Don\u{2019}t forget \u{2014} bring forms"),
        "Don't forget - bring forms"
    );
}

#[test]
fn test_newlines_become_spaces() {
    assert_eq!(format_message("line one\nline two"), "line one line two");
}

#[test]
fn test_long_message_truncated() {
    let long = "word ".repeat(200);
    let formatted = format_message(&long);
    assert_eq!(formatted.len(), MAX_MESSAGE_LEN);
}

#[test]
fn test_only_unsupported_characters_yields_empty() {
    assert_eq!(format_message("\u{1F600}\u{1F601}\u{4E2D}\u{6587}"), "");
}

proptest! {
    #[test]
    fn prop_formatter_is_deterministic(raw in ".{0,600}") {
        prop_assert_eq!(format_message(&raw), format_message(&raw));
    }

    #[test]
    fn prop_output_never_exceeds_max_len(raw in ".{0,600}") {
        prop_assert!(format_message(&raw).len() <= MAX_MESSAGE_LEN);
    }

    #[test]
    fn prop_output_is_printable_ascii(raw in ".{0,600}") {
        let formatted = format_message(&raw);
        prop_assert!(formatted
            .chars()
            .all(|c| c.is_ascii_graphic() || c == ' '));
    }

    #[test]
    fn prop_formatting_is_idempotent(raw in ".{0,600}") {
        let once = format_message(&raw);
        prop_assert_eq!(format_message(&once), once.clone());
    }
}
