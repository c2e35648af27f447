//! The wrapping token sink: groups incoming atoms into words, enforces
//! the target width, and writes ANSI with minimal style switches.

use std::io::{self, Write};
use std::time::Duration;

use flowdown_types::{Token, TokenKind, ANSI_RESET};
use unicode_width::UnicodeWidthChar;

use crate::osc8::{OSC8_END, OSC8_START, OSC8_ST};
use crate::render::RenderOptions;
use crate::validate::is_control_rune;
use crate::wrap::{fit_url, printable_width, split_url_wrapper};

/// Receiver side of the parser→sink contract.
pub trait TokenSink {
    fn write_token(&mut self, tok: Token<'_>) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    fn width(&self) -> usize;
    fn set_width(&mut self, width: usize);
    fn set_wrap_indent(&mut self, indent: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Boundary {
    None,
    Space,
    Newline,
    Punct,
    PunctEnd,
}

/// One rune with its resolved style and pacing metadata.
#[derive(Clone, Copy, Debug)]
struct Atom {
    ch: char,
    style: u16,
    kind: TokenKind,
    delay: Duration,
    boundary: Boundary,
}

/// Interned style prefixes; id 0 is always the empty style.
#[derive(Debug, Default)]
struct StylePool {
    entries: Vec<String>,
}

impl StylePool {
    fn new() -> Self {
        StylePool {
            entries: vec![String::new()],
        }
    }

    fn intern(&mut self, prefix: &str) -> u16 {
        if let Some(idx) = self.entries.iter().position(|e| e == prefix) {
            return idx as u16;
        }
        self.entries.push(prefix.to_string());
        (self.entries.len() - 1) as u16
    }
}

/// The word currently being accumulated between boundaries.
#[derive(Debug, Default)]
struct WordBuffer {
    atoms: Vec<Atom>,
    kind: TokenKind,
    width: usize,
    delay: Duration,
    style: u16,
    has_url: bool,
    has_non: bool,
    has_code: bool,
    last: char,
}

impl WordBuffer {
    fn reset(&mut self) {
        self.atoms.clear();
        self.kind = TokenKind::Text;
        self.width = 0;
        self.delay = Duration::ZERO;
        self.style = 0;
        self.has_url = false;
        self.has_non = false;
        self.has_code = false;
        self.last = '\0';
    }

    fn push(&mut self, a: Atom) {
        if self.atoms.is_empty() {
            self.kind = a.kind;
            self.style = a.style;
        }
        match a.kind {
            TokenKind::Url => {
                self.kind = TokenKind::Url;
                self.has_url = true;
            }
            TokenKind::Code => {
                self.kind = TokenKind::Code;
                self.has_code = true;
                self.has_non = true;
            }
            _ => self.has_non = true,
        }
        self.last = a.ch;
        self.width += a.ch.width().unwrap_or(0);
        self.delay += a.delay;
        self.atoms.push(a);
    }

    fn ends_with_open_bracket(&self) -> bool {
        matches!(self.last, '(' | '[' | '{')
    }
}

/// A width-enforcing ANSI renderer over any writer.
///
/// Tokens stream in through [`TokenSink::write_token`]; words are flushed
/// at boundaries and wrapped at the last possible moment, inserting the
/// wrap indent the parser (or the sink's own line-prefix tracking) has
/// established for the current block.
pub struct StreamRenderer<W: Write> {
    w: W,
    width: usize,
    osc8: bool,
    soft_wrap: bool,
    line_width: usize,
    style: String,
    pending: WordBuffer,
    pending_spaces: Vec<Atom>,
    last_word_code: bool,
    at_line_start: bool,
    last_was_newline: bool,
    wrap_indent: String,
    prefix_buf: String,
    word_scratch: String,
    styles: StylePool,
    nbsp_buf: Vec<Atom>,
    punct_quote_pending: bool,
    code_flush_pending: bool,
    chunk_scratch: Vec<char>,
}

impl<W: Write> StreamRenderer<W> {
    pub fn new(w: W, width: usize, options: RenderOptions) -> Self {
        StreamRenderer {
            w,
            width,
            osc8: options.osc8,
            soft_wrap: options.soft_wrap,
            line_width: 0,
            style: String::new(),
            pending: WordBuffer::default(),
            pending_spaces: Vec::with_capacity(16),
            last_word_code: false,
            at_line_start: true,
            last_was_newline: true,
            wrap_indent: String::new(),
            prefix_buf: String::with_capacity(64),
            word_scratch: String::with_capacity(256),
            styles: StylePool::new(),
            nbsp_buf: Vec::with_capacity(6),
            punct_quote_pending: false,
            code_flush_pending: false,
            chunk_scratch: Vec::with_capacity(64),
        }
    }

    /// Clears per-document state for reuse; buffers keep their capacity.
    pub fn reset(&mut self, width: usize) {
        self.width = width;
        self.line_width = 0;
        self.style.clear();
        self.pending.reset();
        self.pending_spaces.clear();
        self.last_word_code = false;
        self.at_line_start = true;
        self.last_was_newline = true;
        self.wrap_indent.clear();
        self.prefix_buf.clear();
        self.nbsp_buf.clear();
        self.punct_quote_pending = false;
        self.code_flush_pending = false;
        self.chunk_scratch.clear();
    }

    pub fn get_ref(&self) -> &W {
        &self.w
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.w
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn pending_spaces_width(&self) -> usize {
        self.pending_spaces
            .iter()
            .map(|a| a.ch.width().unwrap_or(0))
            .sum()
    }

    fn process_atom(&mut self, a: Atom) -> io::Result<()> {
        if self.handle_nbsp_atom(a)? {
            return Ok(());
        }
        self.process_atom_raw(a)
    }

    fn process_atom_raw(&mut self, mut a: Atom) -> io::Result<()> {
        if self.punct_quote_pending {
            if is_quote(a.ch) {
                self.punct_quote_pending = false;
                a.boundary = Boundary::None;
            } else {
                self.flush_word(Boundary::None)?;
                self.punct_quote_pending = false;
            }
        }
        if self.code_flush_pending && a.boundary != Boundary::Punct && a.boundary != Boundary::PunctEnd
        {
            self.flush_word(Boundary::None)?;
            self.code_flush_pending = false;
        }
        if a.kind == TokenKind::Code && a.boundary == Boundary::Space {
            // code spans keep their internal spaces inside the word
            self.pending.push(a);
            return Ok(());
        }
        match a.boundary {
            Boundary::None => {
                self.pending.push(a);
                Ok(())
            }
            Boundary::Punct | Boundary::PunctEnd => self.process_punct_atom(a),
            Boundary::Space => {
                self.flush_word(Boundary::None)?;
                self.last_word_code = false;
                if self.at_line_start {
                    if !is_line_prefix(self.prefix_buf.as_bytes()) {
                        self.at_line_start = false;
                        self.pending_spaces.push(a);
                        return Ok(());
                    }
                    return self.emit_prefix_space(a);
                }
                self.pending_spaces.push(a);
                Ok(())
            }
            Boundary::Newline => {
                self.flush_word(Boundary::None)?;
                self.last_word_code = false;
                sleep(a.delay);
                self.emit_boundary(Boundary::Newline)
            }
        }
    }

    fn process_punct_atom(&mut self, a: Atom) -> io::Result<()> {
        if a.kind == TokenKind::Url || a.kind == TokenKind::Code {
            self.pending.push(a);
            return Ok(());
        }
        if a.kind != TokenKind::Text {
            self.pending.push(a);
            self.code_flush_pending = false;
            return Ok(());
        }
        if !self.pending.atoms.is_empty()
            && self.pending.kind == TokenKind::Code
            && self.width > 0
            && self.line_width > 0
        {
            let total = self.line_width
                + self.pending_spaces_width()
                + self.pending.width
                + a.ch.width().unwrap_or(0);
            if total > self.width {
                self.wrap_newline()?;
                self.pending_spaces.clear();
            }
        }
        if self.pending.atoms.is_empty() && self.pending_spaces.is_empty() {
            self.last_word_code = false;
            return self.emit_atom_text(a);
        }
        if !self.pending.atoms.is_empty() && self.pending.kind != TokenKind::Url {
            self.pending.push(a);
            if a.boundary == Boundary::PunctEnd {
                self.punct_quote_pending = true;
                self.code_flush_pending = false;
                return Ok(());
            }
            self.flush_word(Boundary::None)?;
            self.code_flush_pending = false;
            return Ok(());
        }
        if !self.pending.atoms.is_empty() {
            self.flush_word(Boundary::None)?;
        }
        self.pending.push(a);
        if a.boundary == Boundary::PunctEnd {
            self.punct_quote_pending = true;
            self.code_flush_pending = false;
            return Ok(());
        }
        self.flush_word(Boundary::None)?;
        self.code_flush_pending = false;
        Ok(())
    }

    // Space arriving while the line is still a prefix: written through
    // immediately so the prefix tracker sees it.
    fn emit_prefix_space(&mut self, a: Atom) -> io::Result<()> {
        sleep(a.delay);
        let mut buf = [0u8; 4];
        let text: &str = a.ch.encode_utf8(&mut buf);
        if self.styles.entries[a.style as usize] != self.style {
            if !self.style.is_empty() {
                self.w.write_all(ANSI_RESET.as_bytes())?;
            }
            self.style.clear();
            self.style.push_str(&self.styles.entries[a.style as usize]);
            if !self.style.is_empty() {
                self.w.write_all(self.style.as_bytes())?;
            }
        }
        self.w.write_all(text.as_bytes())?;
        self.line_width += a.ch.width().unwrap_or(0);
        self.prefix_buf.push(a.ch);
        self.maybe_set_wrap_indent();
        if !self.style.is_empty() {
            self.w.write_all(ANSI_RESET.as_bytes())?;
            self.style.clear();
        }
        if self.prefix_buf.contains(' ') && !is_line_prefix(self.prefix_buf.as_bytes()) {
            self.at_line_start = false;
        }
        Ok(())
    }

    fn handle_nbsp_atom(&mut self, a: Atom) -> io::Result<bool> {
        if a.kind == TokenKind::Code {
            if !self.nbsp_buf.is_empty() {
                self.flush_nbsp_buf()?;
            }
            return Ok(false);
        }
        if self.nbsp_buf.is_empty() {
            if a.ch == '&' {
                self.nbsp_buf.push(a);
                return Ok(true);
            }
            return Ok(false);
        }
        let first = self.nbsp_buf[0];
        if a.kind != first.kind || a.style != first.style || !is_nbsp_char(a.ch) {
            self.flush_nbsp_buf()?;
            return Ok(false);
        }
        self.nbsp_buf.push(a);
        if self.nbsp_buf.len() < 6 {
            return Ok(true);
        }
        if is_nbsp_entity(&self.nbsp_buf) {
            let delay = self.nbsp_buf.iter().map(|b| b.delay).sum();
            self.nbsp_buf.clear();
            self.process_atom_raw(Atom {
                ch: '\u{a0}',
                style: first.style,
                kind: first.kind,
                delay,
                boundary: Boundary::None,
            })?;
            return Ok(true);
        }
        self.flush_nbsp_buf()?;
        Ok(true)
    }

    fn flush_nbsp_buf(&mut self) -> io::Result<()> {
        let buf = std::mem::take(&mut self.nbsp_buf);
        for &a in &buf {
            self.process_atom_raw(a)?;
        }
        self.nbsp_buf = {
            let mut b = buf;
            b.clear();
            b
        };
        Ok(())
    }

    fn write_link_token(&mut self, tok: Token<'_>) -> io::Result<()> {
        if !self.pending.atoms.is_empty() {
            self.flush_word(Boundary::None)?;
        } else if !self.pending_spaces.is_empty() {
            self.flush_pending_spaces()?;
        }
        if !self.osc8 {
            return Ok(());
        }
        sleep(tok.delay);
        if tok.kind == TokenKind::LinkStart {
            if !tok.link_url.is_empty() {
                self.w.write_all(OSC8_START.as_bytes())?;
                self.w.write_all(tok.link_url.as_bytes())?;
                self.w.write_all(OSC8_ST.as_bytes())?;
            }
            return Ok(());
        }
        self.w.write_all(OSC8_END.as_bytes())
    }

    fn flush_pending_spaces(&mut self) -> io::Result<()> {
        let spaces = std::mem::take(&mut self.pending_spaces);
        self.emit_atoms(&spaces)?;
        self.pending_spaces = {
            let mut s = spaces;
            s.clear();
            s
        };
        Ok(())
    }

    fn flush_word(&mut self, boundary: Boundary) -> io::Result<()> {
        if self.pending.atoms.is_empty() {
            return self.emit_boundary(boundary);
        }
        let word_width = self.pending.width;
        let spaces_width = self.pending_spaces_width();
        if self.width > 0
            && self.line_width > 0
            && self.line_width + spaces_width + word_width > self.width
        {
            let prefix_width = printable_width(&self.prefix_buf);
            // a word alone after the line prefix has nowhere better to go
            if !(prefix_width > 0 && self.line_width == prefix_width && spaces_width == 0) {
                self.wrap_newline()?;
                self.pending_spaces.clear();
            }
        }
        if !self.pending_spaces.is_empty() {
            self.flush_pending_spaces()?;
        }
        if self.width > 0 && word_width > self.width {
            let mut word = std::mem::take(&mut self.word_scratch);
            word.clear();
            for a in &self.pending.atoms {
                word.push(a.ch);
            }
            let style = self.pending.style;
            let delay = self.pending.delay;
            let limit = self.width;
            let has_non = self.pending.has_non;
            let result = if self.pending.kind == TokenKind::Code || self.pending.has_code {
                self.emit_timed_code_split(&word, style, delay, limit)
            } else if self.pending.kind == TokenKind::Url {
                self.emit_overlong_url(&word, style, delay, limit, has_non)
            } else {
                self.emit_word_split(&word, style, delay, limit)
            };
            self.word_scratch = word;
            result?;
        } else {
            let atoms = std::mem::take(&mut self.pending.atoms);
            self.emit_atoms(&atoms)?;
            self.pending.atoms = {
                let mut a = atoms;
                a.clear();
                a
            };
        }
        self.last_word_code = self.pending.kind == TokenKind::Code || self.pending.has_code;
        self.pending.reset();
        self.emit_boundary(boundary)
    }

    fn emit_boundary(&mut self, boundary: Boundary) -> io::Result<()> {
        if boundary == Boundary::Newline {
            if !self.pending_spaces.is_empty() {
                self.flush_pending_spaces()?;
            }
            self.newline(true)?;
        }
        Ok(())
    }

    fn emit_overlong_url(
        &mut self,
        word: &str,
        style: u16,
        delay: Duration,
        limit: usize,
        has_non: bool,
    ) -> io::Result<()> {
        if let Some((open, url, close)) = split_url_wrapper(word) {
            let available = limit.saturating_sub(2);
            if available > 0 {
                let fitted = fit_url(url, available);
                let mut buf = [0u8; 4];
                self.emit_timed_str(open.encode_utf8(&mut buf), style, Duration::ZERO)?;
                self.emit_timed_str(&fitted, style, delay)?;
                self.emit_timed_str(close.encode_utf8(&mut buf), style, Duration::ZERO)?;
                return Ok(());
            }
        }
        if has_non {
            return self.emit_word_split(word, style, delay, limit);
        }
        let fitted = fit_url(word, limit);
        self.emit_timed_str(&fitted, style, delay)
    }

    /// Splits an overlong text word across lines.
    ///
    /// Default mode is hyphenation-aware: existing hyphens first, then
    /// syllable-like vowel→consonant boundaries, then per-rune chunks.
    /// With `soft_wrap` the word is simply chopped at the width.
    fn emit_word_split(
        &mut self,
        word: &str,
        style: u16,
        delay: Duration,
        limit: usize,
    ) -> io::Result<()> {
        if word.is_empty() || limit == 0 {
            return Ok(());
        }
        let total_runes = word.chars().count();
        let per = delay / total_runes as u32;
        let mut rem = delay - per * total_runes as u32;

        let mut chunks = std::mem::take(&mut self.chunk_scratch);
        chunks.clear();
        chunks.extend(word.chars());
        let mut first_piece = true;
        let mut start = 0;
        let result = (|| -> io::Result<()> {
            while start < chunks.len() {
                let mut end = split_point(&chunks[start..], limit, self.soft_wrap) + start;
                // keep a trailing quote rune attached to the piece before it
                if end == chunks.len() - 1 && is_quote(chunks[end]) && end - start > 1 {
                    end -= 1;
                }
                if end < chunks.len() && end - start > 1 && is_quote(chunks[end - 1]) {
                    end -= 1;
                }
                if !first_piece {
                    self.wrap_newline()?;
                }
                first_piece = false;
                for &r in &chunks[start..end] {
                    let mut d = per;
                    if rem > Duration::ZERO {
                        d += Duration::from_nanos(1);
                        rem = rem.saturating_sub(Duration::from_nanos(1));
                    }
                    sleep(d);
                    self.emit_rune(r, style)?;
                }
                start = end;
            }
            Ok(())
        })();
        self.chunk_scratch = chunks;
        result
    }

    fn emit_timed_code_split(
        &mut self,
        text: &str,
        style: u16,
        delay: Duration,
        limit: usize,
    ) -> io::Result<()> {
        if text.is_empty() || limit == 0 {
            return Ok(());
        }
        let mut total_runes = 0usize;
        for segment in code_segments(text) {
            total_runes += code_segment_runes(segment, limit);
        }
        if total_runes == 0 {
            return Ok(());
        }
        let per = delay / total_runes as u32;
        let mut rem = delay - per * total_runes as u32;
        for segment in code_segments(text) {
            if self.width > 0
                && self.line_width > 0
                && self.line_width + printable_width(segment) > limit
                && !self.line_has_only_whitespace_prefix()
            {
                self.wrap_newline()?;
            }
            self.emit_code_segment(segment, limit, style, per, &mut rem)?;
        }
        Ok(())
    }

    fn emit_code_segment(
        &mut self,
        segment: &str,
        limit: usize,
        style: u16,
        per: Duration,
        rem: &mut Duration,
    ) -> io::Result<()> {
        if limit == 0 {
            return Ok(());
        }
        if printable_width(segment) <= limit {
            for r in segment.chars() {
                self.emit_rune_with_delay(r, style, per, rem)?;
            }
            return Ok(());
        }
        if limit == 1 {
            return self.emit_rune_with_delay('…', style, per, rem);
        }
        let mut count = 0;
        for r in segment.chars() {
            if count >= limit - 1 {
                break;
            }
            self.emit_rune_with_delay(r, style, per, rem)?;
            count += 1;
        }
        self.emit_rune_with_delay('…', style, per, rem)
    }

    fn emit_rune_with_delay(
        &mut self,
        r: char,
        style: u16,
        per: Duration,
        rem: &mut Duration,
    ) -> io::Result<()> {
        let mut d = per;
        if *rem > Duration::ZERO {
            d += Duration::from_nanos(1);
            *rem = rem.saturating_sub(Duration::from_nanos(1));
        }
        sleep(d);
        self.emit_rune(r, style)
    }

    fn wrap_newline(&mut self) -> io::Result<()> {
        if !self.style.is_empty() {
            self.w.write_all(ANSI_RESET.as_bytes())?;
            self.style.clear();
        }
        self.newline(false)?;
        self.emit_indent()
    }

    fn emit_atoms(&mut self, atoms: &[Atom]) -> io::Result<()> {
        for a in atoms {
            sleep(a.delay);
            self.emit_rune(a.ch, a.style)?;
        }
        Ok(())
    }

    fn emit_timed_str(&mut self, text: &str, style: u16, delay: Duration) -> io::Result<()> {
        let total = text.chars().count();
        if total == 0 {
            return Ok(());
        }
        let per = delay / total as u32;
        let mut rem = delay - per * total as u32;
        for r in text.chars() {
            let mut d = per;
            if rem > Duration::ZERO {
                d += Duration::from_nanos(1);
                rem = rem.saturating_sub(Duration::from_nanos(1));
            }
            sleep(d);
            self.emit_rune(r, style)?;
        }
        Ok(())
    }

    fn emit_rune(&mut self, r: char, style: u16) -> io::Result<()> {
        // NBSP survives word building so it never splits; render as space
        let r = if r == '\u{a0}' { ' ' } else { r };
        let mut buf = [0u8; 4];
        let text: &str = r.encode_utf8(&mut buf);
        self.emit_str(text, style)
    }

    fn emit_atom_text(&mut self, a: Atom) -> io::Result<()> {
        sleep(a.delay);
        self.emit_rune(a.ch, a.style)
    }

    fn emit_str(&mut self, text: &str, style: u16) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.last_was_newline = text.ends_with('\n');
        if self.at_line_start {
            self.prefix_buf.push_str(text);
            self.maybe_set_wrap_indent();
            if !self.wrap_indent.is_empty()
                && self.prefix_buf.ends_with(' ')
                && !self.style.is_empty()
            {
                self.w.write_all(ANSI_RESET.as_bytes())?;
                self.style.clear();
            }
            if self.prefix_buf.contains(' ') && !is_line_prefix(self.prefix_buf.as_bytes()) {
                self.at_line_start = false;
            }
        }
        if self.styles.entries[style as usize] != self.style {
            if !self.style.is_empty() {
                self.w.write_all(ANSI_RESET.as_bytes())?;
            }
            self.style.clear();
            self.style.push_str(&self.styles.entries[style as usize]);
            if !self.style.is_empty() {
                self.w.write_all(self.style.as_bytes())?;
            }
        }
        self.w.write_all(text.as_bytes())?;
        self.line_width += printable_width(text);
        Ok(())
    }

    fn newline(&mut self, reset_style: bool) -> io::Result<()> {
        if reset_style && !self.style.is_empty() {
            self.w.write_all(ANSI_RESET.as_bytes())?;
            self.style.clear();
        }
        self.w.write_all(b"\n")?;
        self.line_width = 0;
        self.last_was_newline = true;
        if reset_style {
            self.at_line_start = true;
            self.wrap_indent.clear();
            self.prefix_buf.clear();
        } else {
            self.at_line_start = false;
        }
        Ok(())
    }

    fn emit_indent(&mut self) -> io::Result<()> {
        if self.wrap_indent.is_empty() {
            return Ok(());
        }
        self.w.write_all(self.wrap_indent.as_bytes())?;
        self.line_width += printable_width(&self.wrap_indent);
        self.at_line_start = false;
        Ok(())
    }

    // Captures the wrap indent from the bytes seen at line start, once a
    // complete marker-plus-space prefix is visible.
    fn maybe_set_wrap_indent(&mut self) {
        if let Some(indent) = task_list_wrap_indent(self.prefix_buf.as_bytes()) {
            self.wrap_indent.clear();
            push_spaces(&mut self.wrap_indent, indent);
            return;
        }
        if !self.wrap_indent.is_empty() {
            return;
        }
        let buf = self.prefix_buf.as_bytes();
        let Some(non_space) = buf.iter().position(|&b| b != b' ' && b != b'\t') else {
            return;
        };
        let Some(space_idx) = buf[non_space..]
            .iter()
            .position(|&b| b == b' ')
            .map(|i| i + non_space)
        else {
            return;
        };
        let prefix = &buf[..space_idx + 1];
        let trim = trim_spaces(prefix);
        if trim.is_empty() {
            return;
        }
        if trim[0] == b'#' {
            if trim.iter().all(|&b| b == b'#') {
                self.wrap_indent.clear();
                push_spaces(&mut self.wrap_indent, prefix.len());
            }
            return;
        }
        if trim.len() == 1 {
            match trim[0] {
                b'>' => {
                    self.wrap_indent.clear();
                    // the quote prefix itself repeats on wrapped lines
                    let copy: String = self.prefix_buf[..prefix.len()].to_string();
                    self.wrap_indent.push_str(&copy);
                }
                b'-' | b'*' | b'+' => {
                    self.wrap_indent.clear();
                    push_spaces(&mut self.wrap_indent, prefix.len());
                }
                _ => {}
            }
            return;
        }
        if trim[0].is_ascii_digit() {
            let digits = trim.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits < trim.len() && (trim[digits] == b'.' || trim[digits] == b')') {
                self.wrap_indent.clear();
                push_spaces(&mut self.wrap_indent, prefix.len());
            }
        }
    }

    fn line_has_only_whitespace_prefix(&self) -> bool {
        if self.line_width == 0 || self.prefix_buf.is_empty() {
            return false;
        }
        if self.prefix_buf.bytes().any(|b| b != b' ' && b != b'\t') {
            return false;
        }
        self.line_width == printable_width(&self.prefix_buf)
    }
}

impl<W: Write> TokenSink for StreamRenderer<W> {
    fn write_token(&mut self, tok: Token<'_>) -> io::Result<()> {
        if tok.kind == TokenKind::LinkStart || tok.kind == TokenKind::LinkEnd {
            return self.write_link_token(tok);
        }
        if tok.kind == TokenKind::ThematicBreak {
            if !self.pending.atoms.is_empty() {
                self.flush_word(Boundary::None)?;
            } else if !self.pending_spaces.is_empty() {
                self.flush_pending_spaces()?;
            }
            return Ok(());
        }
        if tok.text.is_empty() {
            return Ok(());
        }
        if tok.kind == TokenKind::Code
            && !self.pending.atoms.is_empty()
            && self.pending.kind != TokenKind::Code
            && !(self.pending.kind == TokenKind::Text && self.pending.ends_with_open_bracket())
        {
            self.flush_word(Boundary::None)?;
        }
        let style = self.styles.intern(tok.style);
        let count = if tok.delay > Duration::ZERO {
            tok.text.chars().count().max(1)
        } else {
            1
        };
        let per = tok.delay / count as u32;
        let rem = tok.delay - per * count as u32;
        let mut first = true;
        let mut chars = tok.text.chars().peekable();
        while let Some(r) = chars.next() {
            if is_control_rune(r) {
                continue;
            }
            let next = chars.peek().copied().unwrap_or('\0');
            let mut delay = per;
            if first {
                delay += rem;
                first = false;
            }
            let mut boundary = classify_boundary(r, next);
            if boundary == Boundary::Punct && next == '\0' {
                boundary = Boundary::PunctEnd;
            }
            self.process_atom(Atom {
                ch: r,
                style,
                kind: tok.kind,
                delay,
                boundary,
            })?;
        }
        if tok.kind == TokenKind::Code && tok.code_block {
            self.flush_word(Boundary::None)?;
            self.code_flush_pending = false;
        } else if tok.kind == TokenKind::Code {
            self.code_flush_pending = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.nbsp_buf.is_empty() {
            self.flush_nbsp_buf()?;
        }
        if self.punct_quote_pending {
            self.flush_word(Boundary::None)?;
            self.punct_quote_pending = false;
        }
        if !self.pending.atoms.is_empty() {
            self.flush_word(Boundary::None)?;
        } else if !self.pending_spaces.is_empty() {
            self.flush_pending_spaces()?;
        }
        if !self.style.is_empty() {
            self.w.write_all(ANSI_RESET.as_bytes())?;
            self.style.clear();
        }
        if !self.last_was_newline {
            self.w.write_all(b"\n")?;
            self.last_was_newline = true;
        }
        self.w.flush()
    }

    fn width(&self) -> usize {
        self.width
    }

    fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    fn set_wrap_indent(&mut self, indent: &str) {
        self.wrap_indent.clear();
        self.wrap_indent.push_str(indent);
    }
}

fn sleep(d: Duration) {
    if d > Duration::ZERO {
        std::thread::sleep(d);
    }
}

fn classify_boundary(r: char, next: char) -> Boundary {
    if r == '\n' {
        return Boundary::Newline;
    }
    if r == '\u{a0}' {
        return Boundary::None;
    }
    if r == ' ' || r == '\t' {
        return Boundary::Space;
    }
    if is_quote(r) {
        return Boundary::None;
    }
    if r == '.' {
        // sentence boundary only before an uppercase letter, so that
        // abbreviations and decimals stay whole
        if next.is_uppercase() {
            return Boundary::Punct;
        }
        return Boundary::None;
    }
    if matches!(r, ',' | ';' | ':' | '!' | '?') {
        if is_quote(next) {
            return Boundary::None;
        }
        return Boundary::Punct;
    }
    Boundary::None
}

fn is_quote(r: char) -> bool {
    matches!(r, '"' | '\'' | '“' | '”' | '‘' | '’')
}

fn is_nbsp_char(c: char) -> bool {
    matches!(
        c,
        '&' | '#'
            | ';'
            | '0'..='9'
            | 'n'
            | 'N'
            | 'b'
            | 'B'
            | 's'
            | 'S'
            | 'p'
            | 'P'
            | 'x'
            | 'X'
            | 'a'
            | 'A'
    )
}

fn is_nbsp_entity(atoms: &[Atom]) -> bool {
    if atoms.len() != 6 {
        return false;
    }
    let seq: String = atoms.iter().map(|a| a.ch.to_ascii_lowercase()).collect();
    matches!(seq.as_str(), "&nbsp;" | "&#160;" | "&#xa0;")
}

/// True while the accumulated line-start bytes are all whitespace and
/// recognized block markers.
fn is_line_prefix(buf: &[u8]) -> bool {
    let trim = trim_spaces(buf);
    if trim.is_empty() {
        return true;
    }
    let mut start = 0;
    while start < trim.len() {
        while start < trim.len() && (trim[start] == b' ' || trim[start] == b'\t') {
            start += 1;
        }
        if start >= trim.len() {
            break;
        }
        let mut end = start;
        while end < trim.len() && trim[end] != b' ' && trim[end] != b'\t' {
            end += 1;
        }
        if !is_prefix_token(&trim[start..end]) {
            return false;
        }
        start = end;
    }
    true
}

fn is_prefix_token(tok: &[u8]) -> bool {
    if tok.is_empty() {
        return true;
    }
    if tok[0] == b'#' {
        return tok.iter().all(|&b| b == b'#');
    }
    if tok.len() == 1 {
        return matches!(tok[0], b'>' | b'-' | b'*' | b'+');
    }
    if tok[0].is_ascii_digit() {
        let digits = tok.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == tok.len() {
            return true;
        }
        return digits + 1 == tok.len() && (tok[digits] == b'.' || tok[digits] == b')');
    }
    false
}

/// Column after the `[x] ` checkbox of a task-list prefix, if present.
fn task_list_wrap_indent(prefix: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < prefix.len() && (prefix[i] == b' ' || prefix[i] == b'\t') {
        i += 1;
    }
    if i >= prefix.len() {
        return None;
    }
    let mut j = i;
    if matches!(prefix[j], b'-' | b'+' | b'*') {
        j += 1;
    } else if prefix[j].is_ascii_digit() {
        while j < prefix.len() && prefix[j].is_ascii_digit() {
            j += 1;
        }
        if j >= prefix.len() || (prefix[j] != b'.' && prefix[j] != b')') {
            return None;
        }
        j += 1;
    } else {
        return None;
    }
    if j >= prefix.len() || prefix[j] != b' ' {
        return None;
    }
    j += 1;
    if j + 3 >= prefix.len() {
        return None;
    }
    if prefix[j] != b'['
        || prefix[j + 2] != b']'
        || !matches!(prefix[j + 1], b' ' | b'x' | b'X')
        || prefix[j + 3] != b' '
    {
        return None;
    }
    Some(j + 4)
}

fn trim_spaces(buf: &[u8]) -> &[u8] {
    let mut start = 0;
    while start < buf.len() && (buf[start] == b' ' || buf[start] == b'\t') {
        start += 1;
    }
    let mut end = buf.len();
    while end > start && buf[end - 1] == b' ' {
        end -= 1;
    }
    &buf[start..end]
}

fn push_spaces(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push(' ');
    }
}

/// Picks how many runes of `chunk` fit on the next piece of an overlong
/// text word.
fn split_point(chunk: &[char], limit: usize, soft_wrap: bool) -> usize {
    if chunk.len() <= limit {
        return chunk.len();
    }
    if soft_wrap {
        return limit.max(1);
    }
    // prefer an existing hyphen inside the window, keeping it on the left
    let mut best = None;
    for (i, &c) in chunk.iter().enumerate().take(limit) {
        if c == '-' && i + 1 < chunk.len() && i > 0 {
            best = Some(i + 1);
        }
    }
    if let Some(cut) = best {
        return cut;
    }
    // else a syllable-like vowel→consonant boundary, two runes a side
    let mut best = None;
    for i in 2..chunk.len().min(limit) {
        if chunk.len() - i < 2 {
            break;
        }
        if is_vowel(chunk[i - 1]) && !is_vowel(chunk[i]) && chunk[i].is_alphabetic() {
            best = Some(i);
        }
    }
    if let Some(cut) = best {
        return cut;
    }
    limit.max(1)
}

fn is_vowel(c: char) -> bool {
    matches!(
        c.to_ascii_lowercase(),
        'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'å' | 'ä' | 'ö' | 'é' | 'è'
    )
}

fn code_segments(text: &str) -> impl Iterator<Item = &str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, r) in text.char_indices() {
        if matches!(
            r,
            '(' | ')' | '{' | '}' | '[' | ']' | '<' | '>' | '.' | ',' | ';' | ':' | '/' | '\\'
        ) {
            let end = idx + r.len_utf8();
            segments.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }
    segments.into_iter()
}

fn code_segment_runes(segment: &str, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    if printable_width(segment) <= limit {
        return segment.chars().count();
    }
    if limit == 1 {
        return 1;
    }
    limit
}
