//! Width math and overlong-word helpers shared by the sink.
//!
//! Widths are printable columns: ANSI escape sequences contribute zero,
//! everything else is measured with `unicode-width`.

use unicode_width::UnicodeWidthChar;

/// Printable column width of `text`, skipping CSI and OSC sequences.
pub fn printable_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    // CSI: parameters then a final byte in @..~
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    // OSC: terminated by BEL or ST (ESC \)
                    chars.next();
                    let mut prev_esc = false;
                    for c in chars.by_ref() {
                        if c == '\u{7}' || (prev_esc && c == '\\') {
                            break;
                        }
                        prev_esc = c == '\x1b';
                    }
                }
                _ => {}
            }
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

/// Removes CSI and OSC escape sequences, keeping printable bytes.
pub fn strip_ansi_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    let mut prev_esc = false;
                    for c in chars.by_ref() {
                        if c == '\u{7}' || (prev_esc && c == '\\') {
                            break;
                        }
                        prev_esc = c == '\x1b';
                    }
                }
                _ => {}
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Truncates `text` to `limit` columns, ending with an ellipsis.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if printable_width(text) <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    if limit == 1 {
        return "…".to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        if width + 1 > limit - 1 {
            break;
        }
        out.push(c);
        width += 1;
    }
    out.push('…');
    out
}

/// Fits a URL into `limit` columns: whole, scheme-stripped, or truncated.
pub fn fit_url(url: &str, limit: usize) -> String {
    if printable_width(url) <= limit {
        return url.to_string();
    }
    if let Some(idx) = url.find("://") {
        let trimmed = &url[idx + 3..];
        if printable_width(trimmed) <= limit {
            return trimmed.to_string();
        }
    }
    truncate_with_ellipsis(url, limit)
}

/// Splits a bracket-wrapped URL word into (open, url, close).
///
/// Recognizes `(…)`, `[…]`, `{…}`, and `<…>`; anything else is not a
/// wrapper.
pub fn split_url_wrapper(text: &str) -> Option<(char, &str, char)> {
    let mut chars = text.chars();
    let open = chars.next()?;
    let close = chars.next_back()?;
    let want = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        _ => return None,
    };
    if close != want {
        return None;
    }
    Some((open, chars.as_str(), close))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_width_skips_csi() {
        assert_eq!(printable_width("\x1b[38;5;212mhello\x1b[0m"), 5);
        assert_eq!(printable_width("plain"), 5);
    }

    #[test]
    fn printable_width_skips_osc8() {
        let text = "\x1b]8;;https://example.com\x1b\\site\x1b]8;;\x1b\\";
        assert_eq!(printable_width(text), 4);
    }

    #[test]
    fn printable_width_counts_wide_runes() {
        assert_eq!(printable_width("日本"), 4);
    }

    #[test]
    fn strip_ansi_removes_escapes() {
        assert_eq!(strip_ansi_codes("\x1b[1mbold\x1b[0m rest"), "bold rest");
        let osc = "\x1b]8;;https://example.com\x1b\\site\x1b]8;;\x1b\\";
        assert_eq!(strip_ansi_codes(osc), "site");
    }

    #[test]
    fn truncate_short_text_is_identity() {
        assert_eq!(truncate_with_ellipsis("abc", 5), "abc");
    }

    #[test]
    fn truncate_long_text_ends_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_with_ellipsis("abcdef", 1), "…");
        assert_eq!(truncate_with_ellipsis("abcdef", 0), "");
    }

    #[test]
    fn fit_url_strips_scheme_when_needed() {
        assert_eq!(fit_url("https://example.com", 30), "https://example.com");
        assert_eq!(fit_url("https://example.com", 12), "example.com");
        assert_eq!(fit_url("https://example.com/long/path", 6), "https…");
    }

    #[test]
    fn split_url_wrapper_peels_bracket_pairs() {
        assert_eq!(
            split_url_wrapper("(https://example.com)"),
            Some(('(', "https://example.com", ')'))
        );
        assert_eq!(split_url_wrapper("[x]"), Some(('[', "x", ']')));
        assert_eq!(split_url_wrapper("(mismatch]"), None);
        assert_eq!(split_url_wrapper("plain"), None);
        assert_eq!(split_url_wrapper("x"), None);
    }
}
