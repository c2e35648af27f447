//! Entry points composing the pipeline: bytes → front-matter filter →
//! live parser → token sink → writer.

use std::io::{ErrorKind, Read, Write};

use flowdown_theme::Theme;
use flowdown_types::RenderError;

use crate::frontmatter::FrontMatterFilter;
use crate::parser::LiveParser;
use crate::sink::{StreamRenderer, TokenSink};

/// Rendering behavior switches.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Emit OSC 8 hyperlinks for links and autolinks.
    pub osc8: bool,
    /// Chop overlong words at the width instead of hyphenating them.
    pub soft_wrap: bool,
}

/// Renders Markdown from `reader` to ANSI on `writer`, wrapping at
/// `width` columns (0 disables wrapping).
pub fn render<R: Read, W: Write>(
    reader: R,
    writer: W,
    width: usize,
    theme: &Theme,
    options: RenderOptions,
) -> Result<(), RenderError> {
    let mut sink = StreamRenderer::new(writer, width, options);
    parse(reader, &mut sink, theme, options)
}

/// Parses Markdown from `reader` and pushes tokens into an arbitrary
/// sink.
pub fn parse<R: Read, S: TokenSink + ?Sized>(
    reader: R,
    sink: &mut S,
    theme: &Theme,
    options: RenderOptions,
) -> Result<(), RenderError> {
    let mut parser = LiveParser::new(theme, options.osc8);
    parse_with(reader, sink, &mut parser)
}

/// Like [`parse`] but drives a caller-owned parser, so a reset
/// parser/sink pair can be reused across documents without reallocating.
pub fn parse_with<R: Read, S: TokenSink + ?Sized>(
    mut reader: R,
    sink: &mut S,
    parser: &mut LiveParser,
) -> Result<(), RenderError> {
    let mut filter = FrontMatterFilter::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RenderError::Read(e)),
        };
        if n == 0 {
            break;
        }
        let chunk = filter.process(&buf[..n]);
        if !chunk.is_empty() {
            parser.feed(sink, chunk).map_err(RenderError::Write)?;
        }
    }
    let trailing = filter.finish();
    if !trailing.is_empty() {
        parser.feed(sink, trailing).map_err(RenderError::Write)?;
    }
    parser.finalize(sink).map_err(RenderError::Write)?;
    sink.flush().map_err(RenderError::Write)
}
