//! End-to-end rendering tests: golden wrap shapes, token-level contracts,
//! and the pipeline invariants (width bounds, trailing newline, reuse).

use std::io::{self, Read};
use std::time::Duration;

use flowdown_render::{
    parse, parse_with, printable_width, render, strip_ansi_codes, LiveParser, RenderOptions,
    StreamRenderer, TokenSink, OSC8_END,
};
use flowdown_theme::{default_theme, theme_by_name};
use flowdown_types::{Token, TokenKind};

fn render_str(src: &str, width: usize) -> String {
    render_with(src, width, RenderOptions::default())
}

fn render_with(src: &str, width: usize, options: RenderOptions) -> String {
    let mut out = Vec::new();
    render(src.as_bytes(), &mut out, width, &default_theme(), options).expect("render");
    String::from_utf8(out).expect("utf8 output")
}

fn plain(src: &str, width: usize) -> String {
    strip_ansi_codes(&render_str(src, width))
}

#[derive(Debug, Clone)]
struct OwnedToken {
    text: String,
    style: String,
    kind: TokenKind,
    link_url: String,
    code_block: bool,
}

#[derive(Default)]
struct CaptureSink {
    tokens: Vec<OwnedToken>,
}

impl TokenSink for CaptureSink {
    fn write_token(&mut self, tok: Token<'_>) -> io::Result<()> {
        self.tokens.push(OwnedToken {
            text: tok.text.to_string(),
            style: tok.style.to_string(),
            kind: tok.kind,
            link_url: tok.link_url.to_string(),
            code_block: tok.code_block,
        });
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn width(&self) -> usize {
        80
    }

    fn set_width(&mut self, _width: usize) {}

    fn set_wrap_indent(&mut self, _indent: &str) {}
}

fn capture(src: &str, options: RenderOptions) -> Vec<OwnedToken> {
    let mut sink = CaptureSink::default();
    parse(src.as_bytes(), &mut sink, &default_theme(), options).expect("parse");
    sink.tokens
}

// --- golden wrap shapes ---

#[test]
fn heading_wrap_indentation() {
    let src = "# This is a long header\n\n## This is an even longer header\n\n### This is a super-long header";
    let out = plain(src, 12);
    let lines: Vec<&str> = out.lines().collect();
    let want = [
        "# This is a",
        "  long",
        "  header",
        "",
        "## This is",
        "   an even",
        "   longer",
        "   header",
        "",
        "### This is",
        "    a",
        "    super-long",
        "    header",
    ];
    assert!(lines.len() >= want.len(), "too few lines: {lines:?}");
    for (i, line) in want.iter().enumerate() {
        assert_eq!(&lines[i], line, "line {} of {out:?}", i + 1);
    }
}

#[test]
fn wrapped_bullet_indentation() {
    let src = concat!(
        "- Inputs:\n",
        "\n",
        "  - If a user-facing function or interface method takes more than 4\n",
        "    parameters total (including context.Context), move non-ctx inputs into\n",
        "    a request struct (e.g. FooRequest).\n",
    );
    let out = plain(src, 60);
    let got: Vec<&str> = out
        .lines()
        .map(|l| l.trim_end_matches(' '))
        .filter(|l| !l.is_empty())
        .collect();
    let want = [
        "- Inputs:",
        "  - If a user-facing function or interface method takes more",
        "    than 4 parameters total (including context.Context),",
        "    move non-ctx inputs into a request struct (e.g.",
        "    FooRequest).",
    ];
    assert!(got.len() >= want.len(), "too few lines: {got:?}");
    for (i, line) in want.iter().enumerate() {
        assert_eq!(&got[i], line, "line {} of {out:?}", i + 1);
    }
}

#[test]
fn integration_plain_document() {
    let src = concat!(
        "# Title\n",
        "\n",
        "Paragraph with *emphasis*, **strong**, and ***strong+em*** plus `code`.\n",
        "\n",
        "> Quote line one\n",
        "> Quote line two\n",
        "\n",
        "- item one\n",
        "- item two\n",
        "  - nested one\n",
        "  - nested two\n",
        "\n",
        "1. ordered one\n",
        "2. ordered two\n",
        "\n",
        "[site](https://example.com)\n",
        "\n",
        "---\n",
        "\n",
        "```go\n",
        "fmt.Println(\"hello\")\n",
        "```\n",
    );
    let raw = render_str(src, 0);
    let out = strip_ansi_codes(&raw);
    let want = concat!(
        "# Title\n",
        "\n",
        "Paragraph with emphasis, strong, and strong+em plus code.\n",
        "\n",
        "> Quote line one Quote line two\n",
        "\n",
        "- item one\n",
        "- item two\n",
        "  - nested one\n",
        "  - nested two\n",
        "\n",
        "1. ordered one\n",
        "2. ordered two\n",
        "\n",
        "site (https://example.com)\n",
        "\n",
        "fmt.Println(\"hello\")\n",
    );
    assert_eq!(out, want);

    let styles = default_theme();
    let styles = styles.styles();
    for (name, prefix) in [
        ("h1", &styles.heading[0].prefix),
        ("emphasis", &styles.emphasis.prefix),
        ("strong", &styles.strong.prefix),
        ("code inline", &styles.code_inline.prefix),
        ("quote", &styles.quote.prefix),
        ("list marker", &styles.list_marker.prefix),
        ("link url", &styles.link_url.prefix),
    ] {
        assert!(raw.contains(prefix.as_str()), "missing {name} ANSI prefix");
    }
}

// --- wrap width bounds ---

#[test]
fn wrap_stays_within_width() {
    let src = concat!(
        "# Heading One\n",
        "\n",
        "Paragraph with a [link](https://example.com) and some emphasized *text* plus **bold** words.\n",
        "\n",
        "> Quote line one with more words to wrap\n",
        "> Quote line two with additional words to wrap\n",
        "\n",
        "- item one with a long line that should wrap cleanly at small widths\n",
        "  - nested item with more words and wrapping\n",
        "\n",
        "```go\n",
        "fmt.Println(\"hello there from a longer code line\")\n",
        "```\n",
    );
    // wide enough for the longest unsplittable token, "(https://example.com)"
    let min_width = "(https://example.com)".len();
    for width in (min_width..=100).step_by(5) {
        let out = plain(src, width);
        for (i, line) in out.lines().enumerate() {
            if line.trim_start().starts_with("fmt.Println(") {
                continue;
            }
            assert!(
                printable_width(line) <= width,
                "width {width}: line {} too wide: {line:?}",
                i + 1
            );
        }
    }
}

#[test]
fn wrap_stays_within_width_with_osc8() {
    let src = "Paragraph with a [link](https://example.com) and some *styled* words to wrap.";
    for width in (20..=100).step_by(5) {
        let out = render_with(
            src,
            width,
            RenderOptions {
                osc8: true,
                ..RenderOptions::default()
            },
        );
        for (i, line) in strip_ansi_codes(&out).lines().enumerate() {
            assert!(
                printable_width(line) <= width,
                "width {width}: line {} too wide: {line:?}",
                i + 1
            );
        }
    }
}

// --- block structure ---

#[test]
fn wrap_indentation_for_lists_and_quotes() {
    let src = concat!(
        "- Parent item with enough text to wrap cleanly\n",
        "  - If cycles occur, extract core functionality into a core package\n",
        "12. Ordered item with enough text to wrap across lines properly\n",
        "> quote line one with more words to wrap\n",
        "> quote line two with additional words\n",
    );
    let out = plain(src, 40);
    assert!(
        out.contains("\n    functionality into a core package"),
        "missing nested list wrap indentation: {out:?}"
    );
    assert!(
        out.contains("\n    wrap across lines properly"),
        "missing ordered list wrap indentation: {out:?}"
    );
    assert!(out.contains("quote line one"));
    assert!(out.contains("quote line two"));
    for line in out.lines() {
        if line.contains("quote line") {
            assert!(
                line.trim_start().starts_with("> "),
                "missing quote prefix on: {line:?}"
            );
        }
    }
}

#[test]
fn quote_with_list_interior_aligns_markers() {
    let src = "> - item one\n> - item two\n";
    let out = plain(src, 40);
    let mut marker_columns = Vec::new();
    for line in out.lines() {
        if line.contains("item") {
            assert!(line.starts_with("> "), "missing quote prefix: {line:?}");
            marker_columns.push(line.find("- ").expect("list marker"));
        }
    }
    assert_eq!(marker_columns.len(), 2, "expected two items: {out:?}");
    assert_eq!(marker_columns[0], marker_columns[1]);
}

#[test]
fn list_items_stay_on_separate_lines() {
    let src = concat!(
        "- Outputs:\n",
        "  - A user-facing function or interface method must return no more than two values:\n",
        "    (T, error) or (Response, error).\n",
        "  - If multiple outputs are required, return a response/result struct as the first value.\n",
    );
    let out = plain(src, 80);
    assert!(
        !out.contains("error).  - If multiple outputs"),
        "list items merged: {out:?}"
    );
    assert!(
        out.contains("\n  - If multiple outputs are required"),
        "missing list item boundary: {out:?}"
    );
}

#[test]
fn punctuation_may_wrap_after_code_span() {
    let src = concat!(
        "- Outputs:\n",
        "  - A user-facing function or interface method must return no more than two values:\n",
        "    `(T, error)` or `(Response, error)`.\n",
        "  - If multiple outputs are required, return a response/result struct as the first value.\n",
    );
    let out = plain(src, 60);
    assert!(
        out.contains("error)\n    ."),
        "expected punctuation to wrap after the code span: {out:?}"
    );
}

#[test]
fn task_list_wrap_aligns_with_checkbox_body() {
    let out = plain("- [ ] Task item with enough words to wrap", 20);
    assert!(
        out.contains("\n      enough"),
        "expected task list wrap indent: {out:?}"
    );
}

#[test]
fn paragraph_reflows_source_line_breaks() {
    let src = "This is a wrapped line that should\nflow into the next line without\nblank lines.";
    let out = plain(src, 80);
    assert!(!out.contains("\n\n"), "unexpected paragraph break: {out:?}");
    assert!(out.contains("line that should flow into the next line without blank lines."));
}

#[test]
fn hard_break_forces_line_break() {
    let src = "Line one with break  \nLine two after break.";
    let out = plain(src, 80);
    assert!(
        out.contains("Line one with break\nLine two"),
        "expected hard line break: {out:?}"
    );
}

#[test]
fn thematic_break_emits_token_not_text() {
    let tokens = capture("one\n---\ntwo\n", RenderOptions::default());
    assert!(
        tokens.iter().any(|t| t.kind == TokenKind::ThematicBreak),
        "expected thematic break token"
    );
    let out = plain("one\n---\ntwo\n", 80);
    assert!(!out.contains("---"), "rule leaked as text: {out:?}");
    assert!(out.contains("one\n\ntwo"), "expected a break: {out:?}");
}

#[test]
fn fenced_code_is_a_single_block_token() {
    let tokens = capture("```go\nfmt.Println(\"hello\")\n```\n", RenderOptions::default());
    let code: Vec<&OwnedToken> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Code)
        .collect();
    assert_eq!(code.len(), 1, "expected one code token: {tokens:?}");
    assert_eq!(code[0].text, "fmt.Println(\"hello\")");
    assert!(code[0].code_block);
    // fence lines themselves contribute no text
    assert!(tokens.iter().all(|t| !t.text.contains("```")));
    assert!(tokens.iter().all(|t| !t.text.contains("go")));
}

#[test]
fn indented_code_passes_through_verbatim() {
    let src = "Paragraph before.\n\n    let x = 1;\n    let y = 2;\n\nParagraph after.\n";
    let out = plain(src, 80);
    assert!(out.contains("let x = 1;"));
    assert!(out.contains("let y = 2;"));
    assert!(out.contains("Paragraph before."));
    assert!(out.contains("Paragraph after."));
}

// --- inline content ---

#[test]
fn numeric_underscores_render_as_spaces() {
    let raw = render_str("10_000_000\n", 80);
    assert!(
        !raw.contains("\x1b[3"),
        "unexpected italic styling: {raw:?}"
    );
    let out = strip_ansi_codes(&raw);
    assert!(out.contains("10 000 000"), "got: {out:?}");
}

#[test]
fn numeric_underscore_units_do_not_wrap() {
    for (src, width, want) in [
        ("X X 4_2GiB Y\n", 9, "4 2GiB"),
        ("Time 1_000_000ms end\n", 14, "1 000 000ms"),
    ] {
        let raw = render_str(src, width);
        assert!(!raw.contains("\x1b[3"), "unexpected italics: {raw:?}");
        let out = strip_ansi_codes(&raw);
        assert!(
            out.lines().any(|line| line.contains(want)),
            "expected {want:?} on a single line: {out:?}"
        );
    }
}

#[test]
fn nbsp_entities_decode_to_plain_spaces() {
    let out = plain("A value of 350&nbsp;000 units and 1&#160;separator and 2&#xA0;more.\n", 60);
    assert!(!out.contains("&nbsp;"), "entity leaked: {out:?}");
    assert!(!out.contains('\u{a0}'), "raw NBSP leaked: {out:?}");
    assert!(out.contains("350 000"));
    assert!(out.contains("1 separator"));
    assert!(out.contains("2 more"));
}

#[test]
fn unknown_entities_stay_literal() {
    let out = plain("An &unknown; entity and a bare & ampersand.\n", 80);
    assert!(out.contains("&unknown;"));
    assert!(out.contains("& ampersand"));
}

#[test]
fn unterminated_link_falls_back_to_literal() {
    let out = plain("An [unclosed link text\n", 80);
    assert!(out.contains("[unclosed link text"), "got: {out:?}");
}

#[test]
fn quote_stays_attached_to_punctuation() {
    for punct in ['.', ',', ';', ':', '!', '?'] {
        for quote in ["\"", "”", "’"] {
            let src = format!("X Y Z{punct}*{quote}word*\n");
            let out = plain(&src, 6);
            let bad = format!("{punct}\n{quote}");
            assert!(
                !out.contains(&bad),
                "quote detached from {punct:?}: {out:?}"
            );
        }
    }
}

// --- links and OSC 8 ---

#[test]
fn osc8_link_span_wraps_text_only() {
    let src = "This is [an example](http://example.com/) inline link.";
    let out = render_with(
        src,
        80,
        RenderOptions {
            osc8: true,
            ..RenderOptions::default()
        },
    );
    let start = out.find("\x1b]8;;http://example.com/\x1b\\").expect("osc8 start");
    let after_start = start + "\x1b]8;;http://example.com/\x1b\\".len();
    let end = out[after_start..].find(OSC8_END).expect("osc8 end") + after_start;
    let link_text = strip_ansi_codes(&out[after_start..end]);
    assert_eq!(link_text, "an example");
}

#[test]
fn osc8_off_renders_text_and_url() {
    let out = plain("See [website](https://example.com) now.", 80);
    assert!(
        out.contains("website (https://example.com)"),
        "got: {out:?}"
    );
}

#[test]
fn osc8_wrapped_link_preserves_spaces() {
    let src = "A paragraph with a link to [site](https://example.com) and more text.";
    let out = render_with(
        src,
        30,
        RenderOptions {
            osc8: true,
            ..RenderOptions::default()
        },
    );
    let text = strip_ansi_codes(&out);
    assert!(!text.contains("paragraphwith"), "spaces collapsed: {text:?}");
    assert!(out.contains("\x1b]8;;https://example.com\x1b\\"));
}

#[test]
fn autolink_tokens_carry_urls() {
    let tokens = capture(
        "<https://example.com> and <user@example.com>",
        RenderOptions {
            osc8: true,
            ..RenderOptions::default()
        },
    );
    let mut links = Vec::new();
    let mut inside = false;
    let mut saw_text = false;
    let link_style = default_theme().styles().link_text.prefix.clone();
    for tok in &tokens {
        match tok.kind {
            TokenKind::LinkStart => {
                links.push(tok.link_url.clone());
                inside = true;
                saw_text = false;
            }
            TokenKind::LinkEnd => {
                assert!(inside, "unexpected link end");
                assert!(saw_text, "no link text inside {:?}", links.last());
                inside = false;
            }
            TokenKind::Url if inside => {
                if tok.style == link_style {
                    saw_text = true;
                }
            }
            _ => {}
        }
    }
    assert!(!inside, "unterminated link span");
    assert_eq!(
        links,
        vec!["https://example.com", "mailto:user@example.com"]
    );
}

#[test]
fn bracketed_autolink_keeps_literal_brackets() {
    let tokens = capture(
        "[<http://example.com>]",
        RenderOptions {
            osc8: true,
            ..RenderOptions::default()
        },
    );
    let open = tokens.iter().position(|t| t.text == "[").expect("open");
    let close = tokens.iter().position(|t| t.text == "]").expect("close");
    let start = tokens
        .iter()
        .position(|t| t.kind == TokenKind::LinkStart)
        .expect("link start");
    let end = tokens
        .iter()
        .position(|t| t.kind == TokenKind::LinkEnd)
        .expect("link end");
    assert_eq!(tokens[start].link_url, "http://example.com");
    assert!(open < start && start < end && end < close);
}

#[test]
fn autolink_without_osc8_styles_as_link() {
    let tokens = capture("<https://example.com>", RenderOptions::default());
    assert!(tokens
        .iter()
        .all(|t| t.kind != TokenKind::LinkStart && t.kind != TokenKind::LinkEnd));
    let link_style = default_theme().styles().link_text.prefix.clone();
    let url_tok = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Url)
        .expect("url token");
    assert_eq!(url_tok.style, link_style);
}

#[test]
fn non_autolink_angle_text_stays_literal() {
    let out = plain("a < b and <not a link>\n", 80);
    assert!(out.contains("a < b"));
    assert!(out.contains("<not a link>"));
}

// --- front matter ---

#[test]
fn front_matter_is_stripped_at_stream_start() {
    for (src, contains, omits) in [
        (
            "---\ntitle: Post\ndate: 2026-02-09\n---\n\n# Hello\n\nBody.\n",
            vec!["# Hello", "Body."],
            vec!["title: Post", "date: 2026-02-09"],
        ),
        (
            "+++\ntitle = \"Post\"\n+++\n\n# Hello\n",
            vec!["# Hello"],
            vec!["title = \"Post\""],
        ),
        (
            ";;;\n{\"title\": \"Post\"}\n;;;\n\n# Hello\n",
            vec!["# Hello"],
            vec!["\"title\""],
        ),
    ] {
        let out = plain(src, 0);
        for want in contains {
            assert!(out.contains(want), "missing {want:?} in {out:?}");
        }
        for bad in omits {
            assert!(!out.contains(bad), "unexpected {bad:?} in {out:?}");
        }
    }
}

#[test]
fn front_matter_without_metadata_is_content() {
    let out = plain("---\n# Keep\n---\n\nTail\n", 0);
    assert!(out.contains("# Keep"));
    assert!(out.contains("Tail"));
}

#[test]
fn front_matter_only_checked_at_start() {
    let out = plain("# Intro\n\n+++\ntitle = \"Keep me\"\n+++\n\nTail\n", 0);
    assert!(out.contains("# Intro"));
    assert!(out.contains("title = \"Keep me\""));
    assert!(out.contains("Tail"));
}

#[test]
fn unclosed_front_matter_is_not_stripped() {
    let out = plain("---\ntitle: Post\n\n# Hello\n", 0);
    assert!(out.contains("title: Post"));
    assert!(out.contains("# Hello"));
}

// --- pipeline invariants ---

#[test]
fn output_ends_with_single_newline_and_reset() {
    for src in ["plain text", "# Heading\n\nBody\n", "- list\n"] {
        let raw = render_str(src, 80);
        assert!(raw.ends_with('\n'), "missing trailing newline: {raw:?}");
        assert!(!raw.ends_with("\n\n"), "extra trailing newline: {raw:?}");
    }
}

#[test]
fn reused_parser_and_sink_render_identically() {
    let src = concat!(
        "# Title\n\n",
        "A paragraph with *emphasis* and a [link](https://example.com).\n\n",
        "- one\n- two\n\n",
        "```sh\nls -la\n```\n",
    );
    let theme = default_theme();
    let mut parser = LiveParser::new(&theme, false);
    let mut sink = StreamRenderer::new(Vec::new(), 40, RenderOptions::default());

    parse_with(src.as_bytes(), &mut sink, &mut parser).expect("first render");
    let first = String::from_utf8(sink.get_ref().clone()).unwrap();

    for _ in 0..3 {
        sink.get_mut().clear();
        sink.reset(40);
        parser.reset(&theme, false);
        parse_with(src.as_bytes(), &mut sink, &mut parser).expect("re-render");
        let again = String::from_utf8(sink.get_ref().clone()).unwrap();
        assert_eq!(first, again, "reuse changed output");
    }
}

#[test]
fn one_byte_reads_survive_utf8_splits() {
    struct OneByte<'a>(&'a [u8], usize);
    impl Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.1 >= self.0.len() {
                return Ok(0);
            }
            buf[0] = self.0[self.1];
            self.1 += 1;
            Ok(1)
        }
    }
    let src = "UTF-8 test — ok, with *émphasis* präservéd\n";
    let mut out = Vec::new();
    render(
        OneByte(src.as_bytes(), 0),
        &mut out,
        80,
        &default_theme(),
        RenderOptions::default(),
    )
    .expect("render");
    let text = strip_ansi_codes(&String::from_utf8(out).unwrap());
    assert!(text.contains("UTF-8 test — ok"));
    assert!(text.contains("émphasis"));
    assert!(text.contains("präservéd"));
}

#[test]
fn text_content_survives_rendering() {
    let src = concat!(
        "# Document heading\n",
        "\n",
        "Opening paragraph with plain words.\n",
        "\n",
        "- first bullet content\n",
        "- second bullet content\n",
        "\n",
        "> quoted wisdom here\n",
    );
    let out = plain(src, 0);
    for want in [
        "Document heading",
        "Opening paragraph with plain words.",
        "first bullet content",
        "second bullet content",
        "quoted wisdom here",
    ] {
        assert!(out.contains(want), "missing {want:?} in {out:?}");
    }
}

#[test]
fn writer_errors_propagate() {
    struct FailWriter;
    impl io::Write for FailWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("broken pipe"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
    let err = render(
        "some text\n".as_bytes(),
        FailWriter,
        80,
        &default_theme(),
        RenderOptions::default(),
    )
    .expect_err("writer failure must surface");
    assert!(matches!(err, flowdown_types::RenderError::Write(_)));
}

#[test]
fn reader_errors_propagate() {
    struct FailReader;
    impl Read for FailReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }
    let mut out = Vec::new();
    let err = render(
        FailReader,
        &mut out,
        80,
        &default_theme(),
        RenderOptions::default(),
    )
    .expect_err("reader failure must surface");
    assert!(matches!(err, flowdown_types::RenderError::Read(_)));
}

#[test]
fn boring_theme_emits_no_escapes() {
    let theme = theme_by_name("boring").expect("boring theme");
    let mut out = Vec::new();
    render(
        "# Plain\n\n*styled* text with a [link](https://example.com)\n".as_bytes(),
        &mut out,
        80,
        &theme,
        RenderOptions::default(),
    )
    .expect("render");
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains('\x1b'), "boring output has escapes: {text:?}");
    assert!(text.contains("# Plain"));
    assert!(text.contains("styled"));
}

#[test]
fn delayed_tokens_still_render() {
    // pacing hints must not change the rendered bytes
    let mut sink = StreamRenderer::new(Vec::new(), 80, RenderOptions::default());
    sink.write_token(Token {
        text: "paced",
        delay: Duration::from_micros(10),
        ..Token::default()
    })
    .unwrap();
    sink.flush().unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(strip_ansi_codes(&out), "paced\n");
}
