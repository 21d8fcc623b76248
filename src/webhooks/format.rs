//! Condensing free text (commit messages, issue titles, comment bodies) into a
//! single chat line.

/// Maximum number of characters kept by [`format_summary`].
pub const MAX_SUMMARY_CHARS: usize = 151;

/// Reduces free text to a one-line summary.
///
/// 1. Keeps only the text before the first blank line (`\n\n`, with optional
///    `\r` before either newline), which isolates a commit subject or the first
///    paragraph of a comment.
/// 2. Collapses every ASCII whitespace run (space, tab, CR, LF, vertical tab,
///    form feed) into one space. Other Unicode spaces such as NBSP are kept.
///    Leading and trailing whitespace is collapsed but not removed.
/// 3. Truncates to at most [`MAX_SUMMARY_CHARS`] Unicode scalar values.
///
/// Total and pure: every input yields some output, and empty input yields
/// empty output.
///
/// ```
/// use hook_relay::webhooks::format_summary;
///
/// assert_eq!(format_summary("Fix bug\n\nLonger explanation"), "Fix bug");
/// assert_eq!(format_summary("a\n  b\tc"), "a b c");
/// ```
pub fn format_summary(text: &str) -> String {
    let first_paragraph = &text[..paragraph_end(text)];

    let mut out = String::with_capacity(first_paragraph.len().min(MAX_SUMMARY_CHARS * 4));
    let mut count = 0;
    let mut in_whitespace = false;

    for c in first_paragraph.chars() {
        if count == MAX_SUMMARY_CHARS {
            break;
        }
        if is_collapsible(c) {
            if in_whitespace {
                continue;
            }
            in_whitespace = true;
            out.push(' ');
        } else {
            in_whitespace = false;
            out.push(c);
        }
        count += 1;
    }

    out
}

/// ASCII whitespace, including the vertical tab `is_ascii_whitespace` omits.
fn is_collapsible(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0B'
}

/// Returns the byte offset of the first blank-line separator, or the text
/// length if there is none.
fn paragraph_end(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(first) = newline_len(&bytes[i..]) {
            if newline_len(&bytes[i + first..]).is_some() {
                return i;
            }
        }
        i += 1;
    }
    bytes.len()
}

/// Length of a `\n` or `\r\n` at the start of `bytes`.
fn newline_len(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [b'\n', ..] => Some(1),
        [b'\r', b'\n', ..] => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(format_summary(""), "");
    }

    #[test]
    fn keeps_text_before_blank_line() {
        assert_eq!(format_summary("line1\n\nline2"), "line1");
    }

    #[test]
    fn crlf_blank_line_also_splits() {
        assert_eq!(format_summary("line1\r\n\r\nline2"), "line1");
        assert_eq!(format_summary("line1\r\n\nline2"), "line1");
        assert_eq!(format_summary("line1\n\r\nline2"), "line1");
    }

    #[test]
    fn single_newlines_collapse_to_spaces() {
        assert_eq!(format_summary("one\ntwo\r\nthree"), "one two three");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(format_summary("a   b\t\t c"), "a b c");
    }

    #[test]
    fn vertical_tab_and_form_feed_collapse() {
        assert_eq!(format_summary("a\x0B\x0Cb"), "a b");
    }

    #[test]
    fn unicode_spaces_are_kept() {
        assert_eq!(format_summary("a\u{A0}\u{A0}b\u{3000}c"), "a\u{A0}\u{A0}b\u{3000}c");
    }

    #[test]
    fn leading_whitespace_is_collapsed_not_trimmed() {
        assert_eq!(format_summary("   padded  "), " padded ");
    }

    #[test]
    fn leading_blank_line_yields_empty() {
        assert_eq!(format_summary("\n\nbody"), "");
    }

    #[test]
    fn whitespace_only_line_is_not_a_blank_line() {
        // "\n \n" has a space between the newlines, so it does not split.
        assert_eq!(format_summary("a\n \nb"), "a b");
    }

    #[test]
    fn long_line_truncates_to_151_chars() {
        let input = "x".repeat(300);
        let out = format_summary(&input);
        assert_eq!(out.chars().count(), 151);
    }

    #[test]
    fn exactly_151_chars_is_unchanged() {
        let input = "y".repeat(151);
        assert_eq!(format_summary(&input), input);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let input = "é".repeat(200);
        let out = format_summary(&input);
        assert_eq!(out.chars().count(), 151);
        assert_eq!(out.len(), 302);
    }

    #[test]
    fn truncation_applies_after_collapse() {
        let input = format!("{}{}", "a ".repeat(100), "b".repeat(100));
        let out = format_summary(&input.replace(' ', "     "));
        assert_eq!(out, format_summary(&input));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_limit(text: String) {
            prop_assert!(format_summary(&text).chars().count() <= MAX_SUMMARY_CHARS);
        }

        #[test]
        fn prop_idempotent(text: String) {
            let once = format_summary(&text);
            prop_assert_eq!(format_summary(&once), once.clone());
        }

        #[test]
        fn prop_output_is_single_line(text: String) {
            let out = format_summary(&text);
            prop_assert!(!out.contains('\n'));
            prop_assert!(!out.contains('\r'));
            prop_assert!(!out.contains("  "));
        }
    }
}
