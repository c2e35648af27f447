//! Stream pacing simulator: plain UTF-8 in, evenly-delayed tokens out.
//!
//! Drives the wrapping sink without the Markdown parser; useful for
//! visualizing inference-token pacing over unstyled text.

use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use flowdown_types::{RenderError, Token};

use crate::render::RenderOptions;
use crate::sink::{StreamRenderer, TokenSink};
use crate::validate::is_control_rune;

/// Streams plain text through the wrapping renderer in `chunk_size`-rune
/// chunks, distributing `delay` across each chunk's runes.
///
/// Invalid UTF-8 and control runes are skipped. A zero chunk size is an
/// error.
pub fn stream_simulate<R: Read, W: Write>(
    reader: R,
    writer: W,
    width: usize,
    chunk_size: usize,
    delay: Duration,
    options: RenderOptions,
) -> Result<(), RenderError> {
    if chunk_size == 0 {
        return Err(RenderError::InvalidChunkSize);
    }
    let mut reader = reader;
    let mut sink = StreamRenderer::new(writer, width, options);
    let mut buf = [0u8; 4096];
    let mut tail: Vec<u8> = Vec::with_capacity(4);
    let mut runes: Vec<char> = Vec::with_capacity(chunk_size.min(4096));
    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RenderError::Read(e)),
        };
        if n == 0 {
            break;
        }
        let mut bytes = &buf[..n];
        while !tail.is_empty() && !bytes.is_empty() {
            tail.push(bytes[0]);
            bytes = &bytes[1..];
            match std::str::from_utf8(&tail) {
                Ok(s) => {
                    if let Some(r) = s.chars().next() {
                        push_rune(&mut sink, &mut runes, r, chunk_size, delay)
                            .map_err(RenderError::Write)?;
                    }
                    tail.clear();
                    break;
                }
                Err(e) if e.error_len().is_some() || tail.len() >= 4 => {
                    tail.clear();
                    break;
                }
                Err(_) => {}
            }
        }
        let mut i = 0;
        while i < bytes.len() {
            match std::str::from_utf8(&bytes[i..]) {
                Ok(s) => {
                    for r in s.chars() {
                        push_rune(&mut sink, &mut runes, r, chunk_size, delay)
                            .map_err(RenderError::Write)?;
                    }
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&bytes[i..i + valid]) {
                        for r in s.chars() {
                            push_rune(&mut sink, &mut runes, r, chunk_size, delay)
                                .map_err(RenderError::Write)?;
                        }
                    }
                    i += valid;
                    match e.error_len() {
                        Some(len) => i += len,
                        None => {
                            tail.extend_from_slice(&bytes[i..]);
                            break;
                        }
                    }
                }
            }
        }
    }
    if !runes.is_empty() {
        flush_chunk(&mut sink, &runes, delay).map_err(RenderError::Write)?;
        runes.clear();
    }
    sink.flush().map_err(RenderError::Write)
}

fn push_rune<W: Write>(
    sink: &mut StreamRenderer<W>,
    runes: &mut Vec<char>,
    r: char,
    chunk_size: usize,
    delay: Duration,
) -> io::Result<()> {
    if is_control_rune(r) {
        return Ok(());
    }
    runes.push(r);
    if runes.len() >= chunk_size {
        flush_chunk(sink, runes, delay)?;
        runes.clear();
    }
    Ok(())
}

fn flush_chunk<W: Write>(
    sink: &mut StreamRenderer<W>,
    runes: &[char],
    delay: Duration,
) -> io::Result<()> {
    if runes.is_empty() {
        return Ok(());
    }
    let per = delay / runes.len() as u32;
    let rem = delay - per * runes.len() as u32;
    let mut first = true;
    for &r in runes {
        let mut d = per;
        if first {
            d += rem;
            first = false;
        }
        let mut b = [0u8; 4];
        sink.write_token(Token {
            text: r.encode_utf8(&mut b),
            delay: d,
            ..Token::default()
        })?;
    }
    Ok(())
}
