//! The token contract between the live parser and token sinks.

use std::time::Duration;

/// What a token contributes to the output stream.
///
/// Discriminant values are stable; alternative sinks (capture streams, a
/// PDF rasterizer) may rely on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// Plain text.
    #[default]
    Text = 0,
    /// Start of a hyperlink span; `link_url` is populated.
    LinkStart = 1,
    /// End of a hyperlink span.
    LinkEnd = 2,
    /// A URL rendered as text.
    Url = 3,
    /// Inline or block code.
    Code = 4,
    /// A thematic break (horizontal rule).
    ThematicBreak = 5,
}

/// A styled text segment with an optional pacing delay.
///
/// Borrowed fields are only valid for the duration of a single
/// `write_token` call; sinks that buffer across calls must copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Token<'a> {
    /// Literal bytes to render; often a single rune.
    pub text: &'a str,
    /// Opaque ANSI prefix from the theme; empty means unstyled.
    pub style: &'a str,
    pub kind: TokenKind,
    /// Target URL, populated only on [`TokenKind::LinkStart`].
    pub link_url: &'a str,
    /// Distinguishes fenced/indented code from inline code.
    pub code_block: bool,
    /// Producer pacing hint, honored by the sink before emission.
    pub delay: Duration,
}

impl<'a> Token<'a> {
    /// A plain text token.
    pub fn styled(text: &'a str, style: &'a str) -> Self {
        Token {
            text,
            style,
            ..Token::default()
        }
    }

    /// An inline or block code token.
    pub fn code(text: &'a str, style: &'a str, code_block: bool) -> Self {
        Token {
            text,
            style,
            kind: TokenKind::Code,
            code_block,
            ..Token::default()
        }
    }

    /// A URL rendered as link text.
    pub fn url(text: &'a str, style: &'a str) -> Self {
        Token {
            text,
            style,
            kind: TokenKind::Url,
            ..Token::default()
        }
    }

    /// Opens a hyperlink span targeting `url`.
    pub fn link_start(url: &'a str) -> Self {
        Token {
            kind: TokenKind::LinkStart,
            link_url: url,
            ..Token::default()
        }
    }

    /// Closes the current hyperlink span.
    pub fn link_end() -> Self {
        Token {
            kind: TokenKind::LinkEnd,
            ..Token::default()
        }
    }

    /// A thematic break marker; carries no text.
    pub fn rule() -> Self {
        Token {
            kind: TokenKind::ThematicBreak,
            ..Token::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_discriminants_are_stable() {
        assert_eq!(TokenKind::Text as u8, 0);
        assert_eq!(TokenKind::LinkStart as u8, 1);
        assert_eq!(TokenKind::LinkEnd as u8, 2);
        assert_eq!(TokenKind::Url as u8, 3);
        assert_eq!(TokenKind::Code as u8, 4);
        assert_eq!(TokenKind::ThematicBreak as u8, 5);
    }

    #[test]
    fn default_token_is_empty_text() {
        let tok = Token::default();
        assert_eq!(tok.kind, TokenKind::Text);
        assert!(tok.text.is_empty());
        assert!(tok.style.is_empty());
        assert!(!tok.code_block);
        assert_eq!(tok.delay, Duration::ZERO);
    }

    #[test]
    fn link_start_carries_url() {
        let tok = Token::link_start("https://example.com");
        assert_eq!(tok.kind, TokenKind::LinkStart);
        assert_eq!(tok.link_url, "https://example.com");
        assert!(tok.text.is_empty());
    }

    #[test]
    fn code_token_flags_block() {
        let inline = Token::code("x", "", false);
        let block = Token::code("x", "", true);
        assert!(!inline.code_block);
        assert!(block.code_block);
        assert_eq!(block.kind, TokenKind::Code);
    }
}
