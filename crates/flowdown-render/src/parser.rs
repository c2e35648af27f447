//! The live parser: a rune-fed state machine that resolves block context
//! and inline spans as bytes arrive, emitting styled tokens to a sink.
//!
//! The parser holds the entire per-document parse state but never buffers
//! output. Block decisions are deferred until a line can be classified
//! safely, which keeps streaming latency at a single rune for ordinary
//! prose while still handling markers that only disambiguate later in the
//! line.

use std::io;
use std::mem;
use std::sync::LazyLock;

use flowdown_theme::Theme;
use flowdown_types::{Styles, Token, TokenKind, ANSI_RESET};

use crate::sink::TokenSink;

const HASH_MARKERS: [&str; 7] = ["", "# ", "## ", "### ", "#### ", "##### ", "###### "];
const MAX_ORDERED_MARKER: usize = 1024;
const MAX_ENTITY_LEN: usize = 32;

// 256 spaces; list prefixes and wrap indents are sliced out of it
const SPACES: &str = "                                                                                                                                                                                                                                                                ";

static ORDERED_DOT: LazyLock<Vec<String>> =
    LazyLock::new(|| (0..=MAX_ORDERED_MARKER).map(|i| format!("{i}.")).collect());
static ORDERED_PAREN: LazyLock<Vec<String>> =
    LazyLock::new(|| (0..=MAX_ORDERED_MARKER).map(|i| format!("{i})")).collect());

fn ordered_marker(num: usize, marker: char) -> Option<&'static str> {
    if num > MAX_ORDERED_MARKER {
        return None;
    }
    match marker {
        '.' => Some(&ORDERED_DOT[num]),
        ')' => Some(&ORDERED_PAREN[num]),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakMode {
    Space,
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, Default)]
struct ListFrame {
    indent: usize,
    ordered: bool,
    marker: char,
    next: usize,
    content_indent: usize,
    prefix_len: usize,
    item_indent_extra: usize,
}

#[derive(Debug, Default)]
struct InlineState {
    in_code: bool,
    code_fence: usize,
    code_buf: String,
    pending_backticks: usize,
    in_em: bool,
    in_strong: bool,
    in_link: bool,
    in_link_url: bool,
    in_auto_link: bool,
    in_entity: bool,
    pending_num_us: bool,
    last_was_digit: bool,
    pending_delim: Option<char>,
    pending_count: usize,
    pending_close: bool,
    link_text: String,
    link_url: String,
    auto_link: String,
    entity: String,
}

impl InlineState {
    fn reset(&mut self) {
        self.in_code = false;
        self.code_fence = 0;
        self.code_buf.clear();
        self.pending_backticks = 0;
        self.in_em = false;
        self.in_strong = false;
        self.in_link = false;
        self.in_link_url = false;
        self.in_auto_link = false;
        self.in_entity = false;
        self.pending_num_us = false;
        self.last_was_digit = false;
        self.pending_delim = None;
        self.pending_count = 0;
        self.pending_close = false;
        self.link_text.clear();
        self.link_url.clear();
        self.auto_link.clear();
        self.entity.clear();
    }
}

#[derive(Clone, Copy, Default)]
struct LinkDelims {
    in_em: bool,
    in_strong: bool,
    pending_delim: Option<char>,
    pending_count: usize,
}

impl LinkDelims {
    fn flush(&mut self) {
        if self.pending_count == 0 {
            return;
        }
        if self.pending_count >= 2 {
            self.in_strong = !self.in_strong;
            self.pending_count -= 2;
        }
        if self.pending_count >= 1 {
            self.in_em = !self.in_em;
            self.pending_count = 0;
        }
        self.pending_delim = None;
    }
}

/// Streaming Markdown parser; construct once and [`reset`](Self::reset)
/// between documents so buffers keep their high-water capacity.
pub struct LiveParser {
    styles: Styles,
    osc8: bool,

    line_buf: Vec<char>,
    line: String,
    line_decided: bool,
    line_emit_idx: usize,
    line_ignore_rest: bool,
    line_skip_break: bool,
    line_style: String,
    line_styled: bool,
    pending_breaks: usize,
    hard_break_pending: bool,
    immediate_spaces: Vec<char>,
    in_paragraph: bool,
    quote_depth: usize,
    quote_lazy: bool,
    last_quote_explicit: bool,
    prev_quote_depth: usize,
    quote_list_prefix_first: bool,
    pending_quote_blank: bool,
    pending_quote_explicit: bool,
    pending_quote_depth: usize,
    pending_quote_list_len: usize,
    pending_quote_list_first: bool,
    list_stack: Vec<ListFrame>,
    list_prefix_len: usize,
    list_lazy: bool,
    list_item_first_line: bool,
    seen_line: bool,
    line_has_non_space: bool,

    in_code_fence: bool,
    fence_marker: &'static str,
    pending_code_nl: bool,
    in_indent_code: bool,
    indent_code: usize,
    code_line_decided: bool,
    code_line_is_code: bool,
    post_code_break_single: bool,

    inline: InlineState,

    // UTF-8 carry for runes split across feed boundaries
    tail: Vec<u8>,
    // reusable staging buffers, retained across reset
    scratch: String,
    line_scratch: String,
    code_line_scratch: String,
    buf_scratch: Vec<char>,
    style_scratch: String,
    indent_scratch: String,
}

impl LiveParser {
    pub fn new(theme: &Theme, osc8: bool) -> Self {
        LiveParser {
            styles: theme.styles().clone(),
            osc8,
            line_buf: Vec::with_capacity(1024),
            line: String::with_capacity(4096),
            line_decided: false,
            line_emit_idx: 0,
            line_ignore_rest: false,
            line_skip_break: false,
            line_style: String::new(),
            line_styled: false,
            pending_breaks: 0,
            hard_break_pending: false,
            immediate_spaces: Vec::with_capacity(64),
            in_paragraph: false,
            quote_depth: 0,
            quote_lazy: false,
            last_quote_explicit: false,
            prev_quote_depth: 0,
            quote_list_prefix_first: false,
            pending_quote_blank: false,
            pending_quote_explicit: false,
            pending_quote_depth: 0,
            pending_quote_list_len: 0,
            pending_quote_list_first: false,
            list_stack: Vec::with_capacity(32),
            list_prefix_len: 0,
            list_lazy: false,
            list_item_first_line: false,
            seen_line: false,
            line_has_non_space: false,
            in_code_fence: false,
            fence_marker: "",
            pending_code_nl: false,
            in_indent_code: false,
            indent_code: 0,
            code_line_decided: false,
            code_line_is_code: false,
            post_code_break_single: false,
            inline: InlineState::default(),
            tail: Vec::with_capacity(4),
            scratch: String::with_capacity(256),
            line_scratch: String::with_capacity(1024),
            code_line_scratch: String::with_capacity(1024),
            buf_scratch: Vec::with_capacity(1024),
            style_scratch: String::with_capacity(64),
            indent_scratch: String::with_capacity(128),
        }
    }

    /// Clears all per-document state for reuse; buffers keep capacity.
    pub fn reset(&mut self, theme: &Theme, osc8: bool) {
        self.styles = theme.styles().clone();
        self.osc8 = osc8;
        self.line_buf.clear();
        self.line.clear();
        self.line_decided = false;
        self.line_emit_idx = 0;
        self.line_ignore_rest = false;
        self.line_skip_break = false;
        self.line_style.clear();
        self.line_styled = false;
        self.pending_breaks = 0;
        self.hard_break_pending = false;
        self.immediate_spaces.clear();
        self.in_paragraph = false;
        self.quote_depth = 0;
        self.quote_lazy = false;
        self.last_quote_explicit = false;
        self.prev_quote_depth = 0;
        self.quote_list_prefix_first = false;
        self.pending_quote_blank = false;
        self.pending_quote_explicit = false;
        self.pending_quote_depth = 0;
        self.pending_quote_list_len = 0;
        self.pending_quote_list_first = false;
        self.list_stack.clear();
        self.list_prefix_len = 0;
        self.list_lazy = false;
        self.list_item_first_line = false;
        self.seen_line = false;
        self.line_has_non_space = false;
        self.in_code_fence = false;
        self.fence_marker = "";
        self.pending_code_nl = false;
        self.in_indent_code = false;
        self.indent_code = 0;
        self.code_line_decided = false;
        self.code_line_is_code = false;
        self.post_code_break_single = false;
        self.inline.reset();
        self.tail.clear();
    }

    /// Feeds raw bytes. Invalid UTF-8 is dropped; a rune split across
    /// feed boundaries is carried in a small tail buffer.
    pub fn feed<S: TokenSink + ?Sized>(&mut self, sink: &mut S, bytes: &[u8]) -> io::Result<()> {
        let mut bytes = bytes;
        while !self.tail.is_empty() && !bytes.is_empty() {
            self.tail.push(bytes[0]);
            bytes = &bytes[1..];
            match std::str::from_utf8(&self.tail) {
                Ok(s) => {
                    if let Some(r) = s.chars().next() {
                        if !crate::validate::is_control_rune(r) {
                            self.feed_rune(sink, r)?;
                        }
                    }
                    self.tail.clear();
                    break;
                }
                Err(e) if e.error_len().is_some() => {
                    self.tail.clear();
                    break;
                }
                Err(_) => {
                    if self.tail.len() >= 4 {
                        self.tail.clear();
                        break;
                    }
                }
            }
        }
        let mut i = 0;
        while i < bytes.len() {
            match std::str::from_utf8(&bytes[i..]) {
                Ok(s) => {
                    self.feed_str(sink, s)?;
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&bytes[i..i + valid]) {
                        self.feed_str(sink, s)?;
                    }
                    i += valid;
                    match e.error_len() {
                        Some(n) => i += n,
                        None => {
                            self.tail.extend_from_slice(&bytes[i..]);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn feed_str<S: TokenSink + ?Sized>(&mut self, sink: &mut S, text: &str) -> io::Result<()> {
        for r in text.chars() {
            if crate::validate::is_control_rune(r) {
                continue;
            }
            self.feed_rune(sink, r)?;
        }
        Ok(())
    }

    fn feed_rune<S: TokenSink + ?Sized>(&mut self, sink: &mut S, r: char) -> io::Result<()> {
        if self.pending_quote_blank
            && !self.line_has_non_space
            && !self.pending_quote_explicit
            && r != ' '
            && r != '\t'
            && r != '\r'
        {
            if r == '>' {
                if self.pending_breaks == 0 {
                    self.pending_breaks = 1;
                }
                self.apply_pending_break(sink, BreakMode::Single)?;
                let mut list_indent = self.pending_quote_list_len;
                let (line_indent, _) = leading_indent_count(&self.line);
                if line_indent > 0 {
                    list_indent = line_indent;
                }
                if list_indent > 0 {
                    self.emit_list_prefix(sink, list_indent)?;
                }
                self.emit_quote_prefix_bare(sink, self.pending_quote_depth)?;
                sink.write_token(Token::styled("\n", ""))?;
                self.pending_breaks = 0;
                self.hard_break_pending = false;
                self.in_paragraph = false;
            } else {
                if self.pending_breaks == 0 {
                    self.pending_breaks = 1;
                }
                self.quote_depth = 0;
                self.quote_lazy = false;
                self.last_quote_explicit = false;
            }
            self.pending_quote_blank = false;
            self.pending_quote_explicit = false;
        }
        if self.in_code_fence {
            if r == '\n' {
                let mut line = mem::take(&mut self.line_scratch);
                line.clear();
                line.push_str(self.line.strip_suffix('\r').unwrap_or(&self.line));
                self.line_buf.clear();
                self.line.clear();
                self.seen_line = true;
                let res = self.process_code_fence_line(sink, &line);
                line.clear();
                self.line_scratch = line;
                return res;
            }
            self.line_buf.push(r);
            self.line.push(r);
            return Ok(());
        }
        if self.in_indent_code {
            if r == '\n' {
                if !self.code_line_decided {
                    self.maybe_decide_indent_code_line(sink, true)?;
                }
                if self.in_indent_code {
                    if self.code_line_decided && self.code_line_is_code {
                        sink.write_token(Token::styled("\n", ""))?;
                        self.pending_code_nl = false;
                    }
                    self.seen_line = true;
                    self.reset_line();
                }
                return Ok(());
            }
            self.line_buf.push(r);
            self.line.push(r);
            return self.maybe_decide_indent_code_line(sink, false);
        }
        if r == '\n' {
            if self.line.trim().is_empty() {
                if self.quote_depth > 0 && self.quote_lazy && self.last_quote_explicit {
                    let (line_indent, _) = leading_indent_count(&self.line);
                    self.pending_quote_blank = true;
                    self.pending_quote_explicit = false;
                    self.pending_quote_depth = self.quote_depth;
                    self.pending_quote_list_first = line_indent > 0;
                    self.pending_quote_list_len = if line_indent > 0 { line_indent } else { 0 };
                    self.hard_break_pending = false;
                    self.in_paragraph = false;
                    self.seen_line = true;
                    self.reset_line();
                    return Ok(());
                }
                if self.seen_line {
                    self.pending_breaks += 1;
                }
                self.hard_break_pending = false;
                self.in_paragraph = false;
                self.quote_depth = 0;
                self.quote_lazy = false;
                self.last_quote_explicit = false;
                self.list_lazy = false;
                self.list_item_first_line = false;
                self.seen_line = true;
                self.reset_line();
                return Ok(());
            }
            if !self.line_decided && !self.line_buf.is_empty() {
                self.maybe_decide_line(sink, true)?;
            }
            if self.line_decided {
                self.hard_break_pending = has_hard_line_break(&self.line);
                self.immediate_spaces.clear();
                self.flush_pending_backticks(sink)?;
                self.flush_pending_entity(sink)?;
                self.flush_pending_num_us(sink)?;
                self.flush_pending_delims();
                self.line_styled = false;
                if !self.line_skip_break {
                    self.pending_breaks += 1;
                }
                self.seen_line = true;
            } else {
                if self.seen_line {
                    self.pending_breaks += 1;
                }
                self.hard_break_pending = false;
                self.in_paragraph = false;
                self.quote_lazy = false;
                self.list_lazy = false;
                self.list_item_first_line = false;
                self.seen_line = true;
            }
            self.reset_line();
            return Ok(());
        }
        if self.line_decided {
            self.line_buf.push(r);
            self.line.push(r);
            if !self.line_ignore_rest {
                self.emit_inline(sink, r)?;
            }
            self.line_emit_idx = self.line_buf.len();
            return Ok(());
        }
        self.line_buf.push(r);
        self.line.push(r);
        if !self.line_has_non_space {
            if r == ' ' || r == '\t' {
                return Ok(());
            }
            self.line_has_non_space = true;
            if !is_potential_block_start(r) {
                return self.maybe_decide_line(sink, false);
            }
            return Ok(());
        }
        if r == ' ' || r == '\t' {
            return self.maybe_decide_line(sink, false);
        }
        if should_attempt_decision(&self.line_buf) {
            return self.maybe_decide_line(sink, false);
        }
        Ok(())
    }

    fn reset_line(&mut self) {
        self.line_buf.clear();
        self.line.clear();
        self.line_decided = false;
        self.line_emit_idx = 0;
        self.line_ignore_rest = false;
        self.line_skip_break = false;
        self.immediate_spaces.clear();
        self.line_has_non_space = false;
        self.code_line_decided = false;
        self.code_line_is_code = false;
        self.quote_list_prefix_first = false;
    }

    fn replay_line<S: TokenSink + ?Sized>(&mut self, sink: &mut S, line: &str) -> io::Result<()> {
        self.reset_line();
        for r in line.chars() {
            self.feed_rune(sink, r)?;
        }
        Ok(())
    }

    fn maybe_decide_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        force: bool,
    ) -> io::Result<()> {
        if self.line_decided {
            return Ok(());
        }
        let mut line = mem::take(&mut self.line_scratch);
        line.clear();
        line.push_str(&self.line);
        let mut buf = mem::take(&mut self.buf_scratch);
        buf.clear();
        buf.extend_from_slice(&self.line_buf);
        let res = self.decide_line(sink, &line, &buf, force);
        line.clear();
        buf.clear();
        self.line_scratch = line;
        self.buf_scratch = buf;
        res
    }

    fn decide_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        line: &str,
        buf: &[char],
        force: bool,
    ) -> io::Result<()> {
        self.prev_quote_depth = self.quote_depth;
        if self.pending_quote_blank && !force && line.trim() == ">" {
            return Ok(());
        }
        if line.trim().is_empty() {
            if force && self.quote_depth > 0 && self.quote_lazy && self.last_quote_explicit {
                if self.pending_breaks == 0 {
                    self.pending_breaks = 1;
                }
                self.apply_pending_break(sink, BreakMode::Single)?;
                if self.quote_list_prefix_first && self.list_prefix_len > 0 {
                    self.emit_list_prefix(sink, self.list_prefix_len)?;
                }
                self.emit_quote_prefix_bare(sink, self.quote_depth)?;
                sink.write_token(Token::styled("\n", ""))?;
                self.pending_breaks = 0;
                self.hard_break_pending = false;
                self.in_paragraph = false;
                self.line_decided = true;
                self.line_ignore_rest = true;
                self.line_skip_break = true;
            }
            return Ok(());
        }
        let (line_indent, _) = leading_indent_count(line);
        let (parsed_depth, rest, explicit) = parse_quote_prefix(line);
        let mut depth = parsed_depth;
        if explicit {
            self.quote_depth = depth;
            self.quote_lazy = true;
            self.last_quote_explicit = true;
        } else if self.pending_quote_blank {
            self.quote_depth = 0;
            depth = 0;
            self.quote_lazy = false;
            self.last_quote_explicit = false;
        } else if self.quote_depth > 0 && self.quote_lazy {
            depth = self.quote_depth;
            self.last_quote_explicit = false;
        } else {
            self.quote_depth = 0;
            depth = 0;
            self.quote_lazy = false;
            self.last_quote_explicit = false;
        }
        if self.pending_quote_blank {
            if depth > 0 {
                if self.pending_breaks == 0 {
                    self.pending_breaks = 1;
                }
                self.apply_pending_break(sink, BreakMode::Single)?;
                if self.pending_quote_list_first && self.pending_quote_list_len > 0 {
                    self.emit_list_prefix(sink, self.pending_quote_list_len)?;
                }
                self.emit_quote_prefix_bare(sink, self.pending_quote_depth)?;
                sink.write_token(Token::styled("\n", ""))?;
                self.pending_breaks = 0;
                self.hard_break_pending = false;
                self.in_paragraph = false;
            } else if self.pending_breaks == 0 {
                self.pending_breaks = 1;
            }
            self.pending_quote_blank = false;
            self.pending_quote_explicit = false;
        }
        self.quote_list_prefix_first =
            explicit && depth > 0 && self.list_prefix_len > 0 && line_indent > 0;
        if explicit && rest.trim().is_empty() && force {
            self.pending_quote_blank = true;
            self.pending_quote_explicit = true;
            self.pending_quote_depth = depth;
            self.pending_quote_list_first = self.quote_list_prefix_first;
            self.pending_quote_list_len = self.list_prefix_len;
            self.hard_break_pending = false;
            self.in_paragraph = false;
            self.quote_depth = depth;
            self.quote_lazy = true;
            self.list_lazy = false;
            self.list_item_first_line = false;
            self.line_decided = true;
            self.line_ignore_rest = true;
            self.line_skip_break = true;
            return Ok(());
        }
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() {
            return Ok(());
        }
        if (trimmed.starts_with('`') || trimmed.starts_with('~')) && !force {
            // could still become a fence; only line end disambiguates
            return Ok(());
        }
        if is_thematic_break(rest) {
            if self.pending_breaks == 0 {
                self.pending_breaks = 1;
            }
            self.line_decided = true;
            self.line_ignore_rest = true;
            self.line_skip_break = true;
            self.in_paragraph = false;
            self.list_lazy = false;
            self.list_item_first_line = false;
            self.quote_lazy = false;
            self.hard_break_pending = false;
            return sink.write_token(Token::rule());
        }
        if is_maybe_thematic_break(rest) && !force {
            return Ok(());
        }
        if is_maybe_fence(rest) && !force {
            return Ok(());
        }
        if let Some(fence) = fence_marker(rest) {
            self.apply_pending_break(sink, BreakMode::Double)?;
            self.in_code_fence = true;
            self.fence_marker = fence;
            self.pending_code_nl = false;
            self.in_paragraph = false;
            self.line_decided = true;
            self.line_ignore_rest = true;
            self.line_skip_break = true;
            return Ok(());
        }
        if trimmed.starts_with('#') {
            if let Some((level, content)) = parse_heading(trimmed) {
                self.list_lazy = false;
                self.list_item_first_line = false;
                self.clear_list_if_outdented(line_indent);
                self.apply_pending_break(sink, BreakMode::Double)?;
                self.emit_prefix(sink, depth, self.list_prefix_len)?;
                self.line_style.clear();
                self.line_style
                    .push_str(&self.styles.heading[level - 1].prefix);
                self.line_styled = true;
                sink.write_token(Token::styled(HASH_MARKERS[level], &self.line_style))?;
                self.in_paragraph = false;
                self.inline.reset();
                self.line_decided = true;
                self.line_skip_break = true;
                self.line_emit_idx = buf.len() - content.chars().count();
                self.pending_breaks += 1;
                return self.emit_inline_runes(sink, &buf[self.line_emit_idx..]);
            }
            let hashes = trimmed.chars().take_while(|&c| c == '#').count();
            if hashes > 0 && hashes < trimmed.len() && !trimmed[hashes..].starts_with(' ') {
                let quote_block_start = explicit
                    && depth > 0
                    && self.in_paragraph
                    && (self.prev_quote_depth != depth || self.list_lazy);
                return self.decide_paragraph(sink, depth, rest, buf, quote_block_start);
            }
            return Ok(());
        }
        if let Some(m) = parse_list_marker(trimmed) {
            if m.content.trim().is_empty() {
                return Ok(());
            }
            if m.content.starts_with('[') && m.content.len() < 4 {
                return Ok(());
            }
            if depth > 0 && self.in_paragraph && self.pending_breaks == 1 && !self.list_lazy {
                self.apply_pending_break(sink, BreakMode::Single)?;
                self.emit_quote_prefix_bare(sink, depth)?;
                sink.write_token(Token::styled("\n", ""))?;
                self.pending_breaks = 0;
                self.hard_break_pending = false;
                self.in_paragraph = false;
            }
            if self.in_paragraph && self.pending_breaks == 0 {
                self.pending_breaks = 1;
            }
            if depth > 0 && self.list_lazy && self.pending_breaks > 1 {
                self.pending_breaks = 1;
            }
            let prev_depth = self.list_stack.len();
            let prev_indent = self.list_stack.last().map(|s| s.indent).unwrap_or(0);
            let parent_ordered = self.list_stack.last().map(|s| s.ordered).unwrap_or(false);
            let parent_prefix_len = self.update_list(
                line_indent,
                m.ordered,
                m.marker,
                m.number,
                m.marker_len,
                m.padding,
            );
            let nested = self.list_stack.len() > prev_depth && line_indent > prev_indent;
            let mut mode = BreakMode::Double;
            if self.list_lazy && self.pending_breaks == 1 && (!nested || !parent_ordered) {
                mode = BreakMode::Single;
            }
            if depth > 0 && self.in_paragraph && self.pending_breaks == 1 && !self.list_lazy {
                mode = BreakMode::Double;
            }
            self.apply_pending_break(sink, mode)?;
            self.emit_prefix(sink, depth, parent_prefix_len)?;
            let marker_static;
            let marker_text: &str = if !m.ordered {
                "-"
            } else {
                let next = self.list_stack.last().map(|s| s.next).unwrap_or(m.number);
                if let Some(frame) = self.list_stack.last_mut() {
                    frame.next = next + 1;
                }
                match ordered_marker(next, m.marker) {
                    Some(text) => text,
                    None => {
                        use std::fmt::Write as _;
                        self.scratch.clear();
                        let _ = write!(self.scratch, "{}{}", next, m.marker);
                        marker_static = mem::take(&mut self.scratch);
                        &marker_static
                    }
                }
            };
            sink.write_token(Token::styled(marker_text, &self.styles.list_marker.prefix))?;
            sink.write_token(Token::styled(" ", &self.styles.text.prefix))?;
            let extra = task_list_extra_indent(m.content);
            if let Some(frame) = self.list_stack.last_mut() {
                frame.item_indent_extra = extra;
            }
            if depth > 0 {
                self.build_quote_wrap_indent(depth, self.list_prefix_len + extra, false);
            } else {
                self.build_spaces_indent(self.list_prefix_len + extra);
            }
            sink.set_wrap_indent(&self.indent_scratch);
            self.list_lazy = true;
            self.list_item_first_line = true;
            self.in_paragraph = true;
            self.inline.reset();
            self.line_decided = true;
            self.line_emit_idx = buf.len() - m.content.chars().count();
            return self.emit_inline_runes(sink, &buf[self.line_emit_idx..]);
        }
        let (indent, _) = leading_indent_count(rest);
        let mut code_indent = 4;
        if let Some(state) = self.list_stack.last() {
            code_indent = state.content_indent + state.item_indent_extra + 4;
        }
        if indent >= code_indent {
            self.in_indent_code = true;
            self.indent_code = code_indent;
            self.pending_code_nl = false;
            self.in_paragraph = false;
            self.hard_break_pending = false;
            return Ok(());
        }
        if is_maybe_list_start(trimmed) && !force {
            return Ok(());
        }
        let mut indent_for_list = indent;
        if explicit && depth > 0 && line_indent > 0 {
            indent_for_list = line_indent;
        }
        let quote_line_with_indent =
            line_indent > 0 && line.trim_start_matches([' ', '\t']).starts_with('>');
        if self.in_list_continuation(indent_for_list, trimmed, explicit, line_indent) {
            if explicit && depth > 0 && !self.list_stack.is_empty() && quote_line_with_indent {
                self.quote_list_prefix_first = true;
            }
            let new_paragraph = !self.in_paragraph;
            let first_continuation = self.list_item_first_line;
            self.list_item_first_line = false;
            let state = self.list_stack.last().copied().unwrap_or_default();
            let mut list_indent = self.list_prefix_len;
            if state.item_indent_extra > 0 {
                list_indent += state.item_indent_extra;
            }
            let mut wrap_indent = list_indent;
            if explicit && depth > 0 && quote_line_with_indent && indent_for_list > wrap_indent {
                wrap_indent = indent_for_list;
            }
            let mut force_quote_only = false;
            let mut force_line_break = false;
            if explicit
                && depth > 0
                && !self.list_stack.is_empty()
                && state.ordered
                && line_indent == 0
            {
                force_quote_only = true;
                force_line_break = first_continuation;
            }
            let mut mode = BreakMode::Double;
            if self.in_paragraph {
                mode = BreakMode::Space;
            }
            if mode == BreakMode::Space && self.hard_break_pending {
                mode = BreakMode::Single;
            }
            if quote_line_with_indent && mode == BreakMode::Space {
                mode = BreakMode::Single;
            }
            if force_line_break && mode == BreakMode::Space {
                mode = BreakMode::Single;
            }
            if force_line_break && self.pending_breaks == 0 {
                self.pending_breaks = 1;
            }
            self.apply_pending_break(sink, mode)?;
            let in_quoted_list = explicit
                && depth > 0
                && !self.list_stack.is_empty()
                && indent_for_list >= state.content_indent;
            if mode != BreakMode::Space {
                if force_quote_only {
                    self.emit_quote_prefix(sink, depth)?;
                } else if in_quoted_list {
                    if quote_line_with_indent || self.quote_list_prefix_first {
                        self.emit_list_prefix(sink, wrap_indent)?;
                        self.emit_quote_prefix(sink, depth)?;
                    } else {
                        self.emit_quote_prefix(sink, depth)?;
                        self.emit_list_prefix(sink, wrap_indent)?;
                    }
                } else {
                    self.emit_prefix(sink, depth, self.list_prefix_len)?;
                }
                if wrap_indent > 0 {
                    if depth > 0 {
                        if force_quote_only {
                            self.build_quote_wrap_indent(depth, 0, false);
                        } else if explicit && quote_line_with_indent {
                            self.build_quote_wrap_indent(depth, wrap_indent, true);
                        } else {
                            self.build_quote_wrap_indent(depth, wrap_indent, false);
                        }
                    } else {
                        self.build_spaces_indent(depth * 2 + wrap_indent);
                    }
                    sink.set_wrap_indent(&self.indent_scratch);
                }
            } else if in_quoted_list {
                if quote_line_with_indent {
                    self.build_quote_wrap_indent(depth, wrap_indent, true);
                } else {
                    self.build_quote_wrap_indent(depth, wrap_indent, false);
                }
                sink.set_wrap_indent(&self.indent_scratch);
            }
            let content = self.trim_list_indent(trimmed);
            self.in_paragraph = true;
            if new_paragraph {
                self.inline.reset();
            }
            self.line_decided = true;
            self.line_emit_idx = buf.len() - content.chars().count();
            return self.emit_inline_runes(sink, &buf[self.line_emit_idx..]);
        }
        let quote_block_start = explicit
            && depth > 0
            && self.in_paragraph
            && (self.prev_quote_depth != depth || self.list_lazy);
        self.list_lazy = false;
        self.list_item_first_line = false;
        let outdent_indent = if explicit && depth > 0 {
            line_indent
        } else {
            indent_for_list
        };
        self.clear_list_if_outdented(outdent_indent);
        self.decide_paragraph(sink, depth, rest, buf, quote_block_start)
    }

    fn decide_paragraph<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        depth: usize,
        rest: &str,
        buf: &[char],
        block_start: bool,
    ) -> io::Result<()> {
        let new_paragraph = !self.in_paragraph;
        let mut mode = BreakMode::Double;
        if self.in_paragraph {
            mode = BreakMode::Space;
            if block_start {
                mode = BreakMode::Single;
            }
            if mode == BreakMode::Space && self.hard_break_pending {
                mode = BreakMode::Single;
            }
        }
        let suppress_prefix = self.in_paragraph
            && self.hard_break_pending
            && depth == 0
            && self.list_prefix_len == 0
            && !block_start;
        self.apply_pending_break(sink, mode)?;
        if mode != BreakMode::Space && !suppress_prefix {
            self.emit_prefix(sink, depth, self.list_prefix_len)?;
        } else if suppress_prefix {
            sink.set_wrap_indent("");
        }
        self.in_paragraph = true;
        if new_paragraph {
            self.inline.reset();
        }
        let content = rest.trim_start_matches([' ', '\t']);
        self.line_decided = true;
        self.line_emit_idx = buf.len() - content.chars().count();
        self.emit_inline_runes(sink, &buf[self.line_emit_idx..])
    }

    fn maybe_decide_indent_code_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        force: bool,
    ) -> io::Result<()> {
        if self.code_line_decided {
            return Ok(());
        }
        let mut line = mem::take(&mut self.code_line_scratch);
        line.clear();
        line.push_str(self.line.strip_suffix('\r').unwrap_or(&self.line));
        let res = self.decide_indent_code_line(sink, &line, force);
        line.clear();
        self.code_line_scratch = line;
        res
    }

    fn decide_indent_code_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        line: &str,
        force: bool,
    ) -> io::Result<()> {
        if line.trim().is_empty() && !force {
            return Ok(());
        }
        let (parsed_depth, rest, explicit) = parse_quote_prefix(line);
        let mut depth = parsed_depth;
        if explicit {
            self.quote_depth = depth;
            self.quote_lazy = true;
            self.last_quote_explicit = true;
        } else if self.quote_depth > 0 && self.quote_lazy {
            depth = self.quote_depth;
            self.last_quote_explicit = false;
        }
        if self.pending_quote_blank {
            if explicit {
                self.quote_depth = depth;
                self.quote_lazy = true;
                self.last_quote_explicit = true;
            } else {
                self.quote_depth = 0;
                depth = 0;
                self.quote_lazy = false;
                self.last_quote_explicit = false;
            }
            if depth > 0 {
                if self.pending_breaks == 0 {
                    self.pending_breaks = 1;
                }
                self.apply_pending_break(sink, BreakMode::Single)?;
                if self.pending_quote_list_first && self.pending_quote_list_len > 0 {
                    self.emit_list_prefix(sink, self.pending_quote_list_len)?;
                }
                self.emit_quote_prefix_bare(sink, self.pending_quote_depth)?;
                sink.write_token(Token::styled("\n", ""))?;
                self.pending_breaks = 0;
                self.hard_break_pending = false;
                self.in_paragraph = false;
            } else if self.pending_breaks == 0 {
                self.pending_breaks = 1;
            }
            self.pending_quote_blank = false;
            self.pending_quote_explicit = false;
        }
        if rest.trim().is_empty() && !force {
            return Ok(());
        }
        let (indent, _) = leading_indent_count(rest);
        if indent >= self.indent_code {
            if !force {
                return Ok(());
            }
            if self.pending_breaks > 0 {
                self.apply_pending_break(sink, BreakMode::Double)?;
            }
            let stripped = trim_indent(rest, self.indent_code);
            self.emit_code_line(sink, stripped)?;
            self.code_line_decided = true;
            self.code_line_is_code = true;
            self.line_buf.clear();
            self.line.clear();
            self.line_has_non_space = false;
            return Ok(());
        }
        self.in_indent_code = false;
        self.pending_code_nl = false;
        if self.pending_breaks == 0 {
            self.pending_breaks = 1;
        }
        self.post_code_break_single = true;
        if !explicit {
            self.quote_depth = 0;
            self.quote_lazy = false;
            self.last_quote_explicit = false;
        }
        self.code_line_decided = false;
        self.code_line_is_code = false;
        self.replay_line(sink, line)
    }

    fn process_code_fence_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        line: &str,
    ) -> io::Result<()> {
        let (depth, rest, explicit) = parse_quote_prefix(line);
        if explicit {
            self.quote_depth = depth;
            self.quote_lazy = true;
            self.last_quote_explicit = true;
        } else if self.quote_depth > 0 && self.quote_lazy {
            self.last_quote_explicit = false;
        }
        let trim = rest.trim();
        if trim.starts_with(self.fence_marker)
            && trim[self.fence_marker.len()..].trim().is_empty()
        {
            self.in_code_fence = false;
            self.fence_marker = "";
            self.pending_code_nl = false;
            self.pending_breaks += 1;
            return Ok(());
        }
        self.emit_code_line(sink, rest)
    }

    fn emit_code_line<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        line: &str,
    ) -> io::Result<()> {
        if self.pending_code_nl {
            sink.write_token(Token::styled("\n", ""))?;
        }
        self.pending_code_nl = true;
        self.emit_prefix(sink, self.quote_depth, self.list_prefix_len)?;
        if line.is_empty() {
            return Ok(());
        }
        sink.write_token(Token::code(line, &self.styles.code_block.prefix, true))
    }

    fn update_list(
        &mut self,
        indent: usize,
        ordered: bool,
        marker: char,
        start: usize,
        marker_len: usize,
        padding: usize,
    ) -> usize {
        while self
            .list_stack
            .last()
            .is_some_and(|top| indent < top.indent)
        {
            self.pop_list();
        }
        let push = match self.list_stack.last() {
            None => true,
            Some(top) => {
                indent > top.indent
                    || top.ordered != ordered
                    || (ordered && top.marker != marker)
            }
        };
        if push {
            if self
                .list_stack
                .last()
                .is_some_and(|top| indent == top.indent)
            {
                self.pop_list();
            }
            let frame = ListFrame {
                indent,
                ordered,
                marker,
                next: start,
                content_indent: marker_len + padding,
                prefix_len: marker_len + 1,
                item_indent_extra: 0,
            };
            self.list_prefix_len += frame.prefix_len;
            self.list_stack.push(frame);
        }
        self.list_parent_prefix_len()
    }

    fn list_parent_prefix_len(&self) -> usize {
        match self.list_stack.last() {
            None => 0,
            Some(last) if self.list_prefix_len <= last.prefix_len => 0,
            Some(last) => self.list_prefix_len - last.prefix_len,
        }
    }

    fn pop_list(&mut self) {
        if let Some(last) = self.list_stack.pop() {
            self.list_prefix_len = self.list_prefix_len.saturating_sub(last.prefix_len);
        }
    }

    fn in_list_continuation(
        &self,
        indent: usize,
        trimmed: &str,
        explicit_quote: bool,
        line_indent: usize,
    ) -> bool {
        let Some(state) = self.list_stack.last() else {
            return false;
        };
        if explicit_quote && line_indent > 0 {
            return false;
        }
        if trimmed.trim_start_matches([' ', '\t']).starts_with('>') {
            return false;
        }
        if indent >= state.content_indent + state.item_indent_extra {
            return true;
        }
        self.list_lazy && !trimmed.trim().is_empty()
    }

    fn trim_list_indent<'a>(&self, text: &'a str) -> &'a str {
        if let Some(state) = self.list_stack.last() {
            let (indent, _) = leading_indent_count(text);
            let col = state.content_indent + state.item_indent_extra;
            if indent >= col {
                return trim_indent(text, col).trim_start_matches([' ', '\t']);
            }
        }
        text.trim_start_matches([' ', '\t'])
    }

    fn clear_list_if_outdented(&mut self, indent: usize) {
        if let Some(top) = self.list_stack.last() {
            if !self.list_lazy && indent <= top.indent {
                self.list_stack.clear();
                self.list_prefix_len = 0;
            }
        }
    }

    fn emit_prefix<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        quote_depth: usize,
        list_prefix_len: usize,
    ) -> io::Result<()> {
        if self.quote_list_prefix_first && quote_depth > 0 && list_prefix_len > 0 {
            self.emit_list_prefix(sink, list_prefix_len)?;
            self.emit_quote_prefix(sink, quote_depth)?;
        } else {
            self.emit_quote_prefix(sink, quote_depth)?;
            self.emit_list_prefix(sink, list_prefix_len)?;
        }
        if quote_depth > 0 {
            let list_first = self.quote_list_prefix_first && list_prefix_len > 0;
            self.build_quote_wrap_indent(quote_depth, list_prefix_len, list_first);
            sink.set_wrap_indent(&self.indent_scratch);
        }
        Ok(())
    }

    fn emit_quote_prefix<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        quote_depth: usize,
    ) -> io::Result<()> {
        for _ in 0..quote_depth {
            sink.write_token(Token::styled(">", &self.styles.quote.prefix))?;
            sink.write_token(Token::styled(" ", &self.styles.text.prefix))?;
        }
        Ok(())
    }

    fn emit_quote_prefix_bare<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        quote_depth: usize,
    ) -> io::Result<()> {
        for _ in 0..quote_depth {
            sink.write_token(Token::styled(">", &self.styles.quote.prefix))?;
        }
        Ok(())
    }

    fn emit_list_prefix<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        list_prefix_len: usize,
    ) -> io::Result<()> {
        let mut remaining = list_prefix_len;
        while remaining > 0 {
            let take = remaining.min(SPACES.len());
            sink.write_token(Token::styled(&SPACES[..take], &self.styles.text.prefix))?;
            remaining -= take;
        }
        Ok(())
    }

    fn build_spaces_indent(&mut self, count: usize) {
        self.indent_scratch.clear();
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(SPACES.len());
            self.indent_scratch.push_str(&SPACES[..take]);
            remaining -= take;
        }
    }

    fn build_quote_wrap_indent(&mut self, depth: usize, list_prefix_len: usize, list_first: bool) {
        self.indent_scratch.clear();
        if list_first && list_prefix_len > 0 {
            push_spaces(&mut self.indent_scratch, list_prefix_len);
        }
        for _ in 0..depth {
            if !self.styles.quote.prefix.is_empty() {
                self.indent_scratch.push_str(&self.styles.quote.prefix);
            }
            self.indent_scratch.push('>');
            if !self.styles.quote.prefix.is_empty() {
                self.indent_scratch.push_str(ANSI_RESET);
            }
            self.indent_scratch.push(' ');
        }
        if !list_first && list_prefix_len > 0 {
            push_spaces(&mut self.indent_scratch, list_prefix_len);
        }
    }

    fn apply_pending_break<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        mode: BreakMode,
    ) -> io::Result<()> {
        if self.pending_breaks == 0 {
            return Ok(());
        }
        let mut mode = mode;
        if self.pending_breaks >= 2 {
            mode = BreakMode::Double;
        }
        if self.hard_break_pending && mode == BreakMode::Space {
            mode = BreakMode::Single;
        }
        if self.post_code_break_single && mode == BreakMode::Double {
            mode = BreakMode::Single;
        }
        self.pending_breaks = 0;
        self.hard_break_pending = false;
        self.post_code_break_single = false;
        match mode {
            BreakMode::Double => sink.write_token(Token::styled("\n\n", "")),
            BreakMode::Single => sink.write_token(Token::styled("\n", "")),
            BreakMode::Space => {
                let kind = self.resolve_inline_style();
                sink.write_token(Token {
                    text: " ",
                    style: &self.style_scratch,
                    kind,
                    ..Token::default()
                })
            }
        }
    }

    fn emit_inline_runes<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        runes: &[char],
    ) -> io::Result<()> {
        let mut i = 0;
        while i < runes.len() {
            let r = runes[i];
            if r == '_'
                && i > 0
                && i + 1 < runes.len()
                && !self.inline.in_code
                && !self.inline.in_link
                && !self.inline.in_link_url
                && !self.inline.in_auto_link
                && runes[i - 1].is_ascii_digit()
                && runes[i + 1].is_ascii_digit()
            {
                self.emit_inline(sink, '\u{a0}')?;
                i += 1;
                continue;
            }
            if r == '&'
                && !self.inline.in_code
                && !self.inline.in_auto_link
                && !self.inline.in_link_url
                && i + 5 < runes.len()
                && is_nbsp_runes(&runes[i..i + 6])
            {
                self.emit_inline(sink, '\u{a0}')?;
                i += 6;
                continue;
            }
            self.emit_inline(sink, r)?;
            i += 1;
        }
        if self.inline.in_entity && !self.inline.entity.is_empty() {
            let mut entity = mem::take(&mut self.inline.entity);
            self.inline.in_entity = false;
            self.emit_styled_text(sink, &entity)?;
            entity.clear();
            self.inline.entity = entity;
        }
        self.line_emit_idx = self.line_buf.len();
        Ok(())
    }

    fn emit_inline<S: TokenSink + ?Sized>(&mut self, sink: &mut S, r: char) -> io::Result<()> {
        if self.inline.pending_num_us {
            self.inline.pending_num_us = false;
            let numeric = r.is_ascii_digit()
                && !self.inline.in_code
                && !self.inline.in_link
                && !self.inline.in_link_url
                && !self.inline.in_auto_link;
            let kind = self.resolve_inline_style();
            let text = if numeric { "\u{a0}" } else { "_" };
            sink.write_token(Token {
                text,
                style: &self.style_scratch,
                kind,
                ..Token::default()
            })?;
        }
        if self.inline.in_auto_link {
            match r {
                '>' => {
                    let mut link = mem::take(&mut self.inline.auto_link);
                    self.inline.in_auto_link = false;
                    let res = self.emit_auto_link(sink, &link);
                    link.clear();
                    self.inline.auto_link = link;
                    return res;
                }
                '\n' | ' ' | '\t' => {
                    let mut tmp = mem::take(&mut self.scratch);
                    tmp.clear();
                    tmp.push('<');
                    tmp.push_str(&self.inline.auto_link);
                    self.inline.auto_link.clear();
                    self.inline.in_auto_link = false;
                    let res = self.emit_styled_text(sink, &tmp);
                    tmp.clear();
                    self.scratch = tmp;
                    res?;
                    // the current rune continues through the normal path
                }
                _ => {
                    self.inline.last_was_digit = false;
                    self.inline.auto_link.push(r);
                    return Ok(());
                }
            }
        }
        if self.inline.in_entity {
            if r == ';' {
                self.inline.entity.push(';');
                self.inline.in_entity = false;
                let mut entity = mem::take(&mut self.inline.entity);
                let res = match decode_entity(&entity) {
                    Some(decoded) => {
                        let mut b = [0u8; 4];
                        let text: &str = decoded.encode_utf8(&mut b);
                        let kind = self.resolve_inline_style();
                        sink.write_token(Token {
                            text,
                            style: &self.style_scratch,
                            kind,
                            ..Token::default()
                        })
                    }
                    None => self.emit_styled_text(sink, &entity),
                };
                entity.clear();
                self.inline.entity = entity;
                return res;
            }
            if r == ' ' || r == '\t' || r == '\n' || self.inline.entity.len() >= MAX_ENTITY_LEN {
                let mut entity = mem::take(&mut self.inline.entity);
                self.inline.in_entity = false;
                let res = self.emit_styled_text(sink, &entity);
                entity.clear();
                self.inline.entity = entity;
                res?;
                // the current rune continues through the normal path
            } else {
                self.inline.entity.push(r);
                return Ok(());
            }
        }
        if self.inline.pending_count > 0 && Some(r) != self.inline.pending_delim {
            self.flush_pending_delims();
        }
        if self.inline.in_link && self.inline.pending_close && (r == ' ' || r == '\t') {
            self.inline.pending_close = false;
            self.emit_link_literal(sink, false)?;
        }
        if self.line_decided {
            if r == ' ' || r == '\t' {
                if self.inline.pending_backticks == 0
                    && !self.inline.in_code
                    && !self.inline.in_link
                    && !self.inline.in_link_url
                {
                    self.immediate_spaces.push(r);
                    return Ok(());
                }
            } else if !self.immediate_spaces.is_empty() {
                let spaces = mem::take(&mut self.immediate_spaces);
                let kind = self.resolve_inline_style();
                for &sp in &spaces {
                    let mut b = [0u8; 4];
                    sink.write_token(Token {
                        text: sp.encode_utf8(&mut b),
                        style: &self.style_scratch,
                        kind,
                        ..Token::default()
                    })?;
                }
                self.immediate_spaces = {
                    let mut s = spaces;
                    s.clear();
                    s
                };
            }
        }
        if r == '`' {
            self.inline.pending_backticks += 1;
            return Ok(());
        }
        if self.inline.pending_backticks > 0 {
            let count = self.inline.pending_backticks;
            self.inline.pending_backticks = 0;
            self.emit_inline_backticks(sink, count)?;
        }
        if r == '&'
            && !self.inline.in_code
            && !self.inline.in_auto_link
            && !self.inline.in_link_url
        {
            self.inline.in_entity = true;
            self.inline.entity.clear();
            self.inline.entity.push('&');
            return Ok(());
        }
        if r == '_'
            && self.inline.last_was_digit
            && !self.inline.in_code
            && !self.inline.in_link
            && !self.inline.in_link_url
            && !self.inline.in_auto_link
        {
            self.inline.pending_num_us = true;
            self.inline.last_was_digit = false;
            return Ok(());
        }
        if self.inline.in_code {
            self.inline.code_buf.push(r);
            self.inline.last_was_digit = false;
            return Ok(());
        }
        match r {
            '*' | '_' => {
                if !self.inline.in_link {
                    if self.inline.pending_delim == Some(r) {
                        self.inline.pending_count += 1;
                    } else {
                        self.inline.pending_delim = Some(r);
                        self.inline.pending_count = 1;
                    }
                    return Ok(());
                }
            }
            '[' => {
                if !self.inline.in_link {
                    self.inline.in_link = true;
                    self.inline.link_text.clear();
                    self.inline.link_url.clear();
                    return Ok(());
                }
            }
            ']' => {
                if self.inline.in_link {
                    self.inline.pending_close = true;
                    return Ok(());
                }
            }
            '(' => {
                if self.inline.in_link && self.inline.pending_close {
                    self.inline.pending_close = false;
                    self.inline.in_link_url = true;
                    return Ok(());
                }
            }
            ')' => {
                if self.inline.in_link && self.inline.in_link_url {
                    return self.emit_link(sink);
                }
            }
            '<' => {
                if self.inline.in_link
                    && !self.inline.in_link_url
                    && !self.inline.pending_close
                    && self.inline.link_text.is_empty()
                {
                    sink.write_token(Token::styled("[", &self.styles.text.prefix))?;
                    self.inline.in_link = false;
                    self.inline.link_text.clear();
                    self.inline.link_url.clear();
                    self.inline.in_auto_link = true;
                    self.inline.auto_link.clear();
                    return Ok(());
                }
                if !self.inline.in_link {
                    self.inline.in_auto_link = true;
                    self.inline.auto_link.clear();
                    return Ok(());
                }
            }
            _ => {}
        }
        if self.inline.in_link {
            if self.inline.pending_close {
                self.inline.pending_close = false;
                if r != '(' {
                    self.emit_link_literal(sink, false)?;
                }
            }
            if self.inline.in_link && self.inline.in_link_url {
                self.inline.last_was_digit = false;
                self.inline.link_url.push(r);
                return Ok(());
            }
            if self.inline.in_link {
                self.inline.last_was_digit = false;
                self.inline.link_text.push(r);
                return Ok(());
            }
        }
        let kind = self.resolve_inline_style();
        self.inline.last_was_digit = r.is_ascii_digit();
        let mut b = [0u8; 4];
        sink.write_token(Token {
            text: r.encode_utf8(&mut b),
            style: &self.style_scratch,
            kind,
            ..Token::default()
        })
    }

    /// Resolves the active inline style into `style_scratch` and returns
    /// the token kind; inline emphasis layers over the line style.
    fn resolve_inline_style(&mut self) -> TokenKind {
        let mut kind = TokenKind::Text;
        let styles = &self.styles;
        let base: &str = if self.inline.in_code {
            kind = TokenKind::Code;
            &styles.code_inline.prefix
        } else if self.inline.in_em && self.inline.in_strong {
            &styles.emphasis_strong.prefix
        } else if self.inline.in_strong {
            &styles.strong.prefix
        } else if self.inline.in_em {
            &styles.emphasis.prefix
        } else if self.line_styled {
            &self.line_style
        } else {
            &styles.text.prefix
        };
        self.style_scratch.clear();
        if self.line_styled && base != self.line_style && base != styles.text.prefix {
            self.style_scratch.push_str(&self.line_style);
        }
        self.style_scratch.push_str(base);
        kind
    }

    fn emit_styled_text<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        text: &str,
    ) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let kind = self.resolve_inline_style();
        let mut rest = text;
        while !rest.is_empty() {
            if kind != TokenKind::Code {
                if let Some(head) = rest.get(..6) {
                    if head.eq_ignore_ascii_case("&nbsp;") {
                        sink.write_token(Token {
                            text: "\u{a0}",
                            style: &self.style_scratch,
                            kind,
                            ..Token::default()
                        })?;
                        rest = &rest[6..];
                        continue;
                    }
                }
            }
            let mut chars = rest.chars();
            let Some(r) = chars.next() else { break };
            let mut b = [0u8; 4];
            sink.write_token(Token {
                text: r.encode_utf8(&mut b),
                style: &self.style_scratch,
                kind,
                ..Token::default()
            })?;
            rest = chars.as_str();
        }
        Ok(())
    }

    fn emit_auto_link<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        text: &str,
    ) -> io::Result<()> {
        if text.is_empty() {
            return self.emit_styled_text(sink, "<>");
        }
        let email = is_email_autolink(text);
        if !email && !is_scheme_autolink(text) {
            let mut tmp = mem::take(&mut self.scratch);
            tmp.clear();
            tmp.push('<');
            tmp.push_str(text);
            tmp.push('>');
            let res = self.emit_styled_text(sink, &tmp);
            tmp.clear();
            self.scratch = tmp;
            return res;
        }
        if self.osc8 {
            if email {
                let mut tmp = mem::take(&mut self.scratch);
                tmp.clear();
                tmp.push_str("mailto:");
                tmp.push_str(text);
                sink.write_token(Token::link_start(&tmp))?;
                tmp.clear();
                self.scratch = tmp;
            } else {
                sink.write_token(Token::link_start(text))?;
            }
        }
        for r in text.chars() {
            let mut b = [0u8; 4];
            sink.write_token(Token::url(
                r.encode_utf8(&mut b),
                &self.styles.link_text.prefix,
            ))?;
        }
        if self.osc8 {
            return sink.write_token(Token::link_end());
        }
        Ok(())
    }

    fn emit_inline_backticks<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        count: usize,
    ) -> io::Result<()> {
        if self.inline.pending_count > 0 && self.inline.pending_delim != Some('`') {
            self.flush_pending_delims();
        }
        if !self.inline.in_code {
            self.inline.in_code = true;
            self.inline.code_fence = count;
            self.inline.code_buf.clear();
            return Ok(());
        }
        if count == self.inline.code_fence {
            self.inline.in_code = false;
            self.inline.code_fence = 0;
            let mut buf = mem::take(&mut self.inline.code_buf);
            let text: &str = if buf.len() >= 2 && buf.starts_with(' ') && buf.ends_with(' ') {
                &buf[1..buf.len() - 1]
            } else {
                &buf
            };
            let res = if text.is_empty() {
                Ok(())
            } else {
                sink.write_token(Token::code(text, &self.styles.code_inline.prefix, false))
            };
            buf.clear();
            self.inline.code_buf = buf;
            return res;
        }
        for _ in 0..count {
            self.inline.code_buf.push('`');
        }
        Ok(())
    }

    /// Emits the literal `[text]` (and optionally `](url…`) of a link
    /// that failed to complete.
    fn emit_link_literal<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        with_url: bool,
    ) -> io::Result<()> {
        sink.write_token(Token::styled("[", &self.styles.text.prefix))?;
        let mut text = mem::take(&mut self.inline.link_text);
        let res = self.emit_plain_text(sink, &text);
        text.clear();
        self.inline.link_text = text;
        res?;
        if with_url && self.inline.in_link_url && !self.inline.link_url.is_empty() {
            sink.write_token(Token::styled("](", &self.styles.text.prefix))?;
            let mut url = mem::take(&mut self.inline.link_url);
            let res = self.emit_plain_text(sink, &url);
            url.clear();
            self.inline.link_url = url;
            res?;
            sink.write_token(Token::styled(")", &self.styles.text.prefix))?;
        } else {
            sink.write_token(Token::styled("]", &self.styles.text.prefix))?;
        }
        self.inline.in_link = false;
        self.inline.in_link_url = false;
        self.inline.link_text.clear();
        self.inline.link_url.clear();
        Ok(())
    }

    fn emit_plain_text<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        text: &str,
    ) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        sink.write_token(Token::styled(text, &self.styles.text.prefix))
    }

    fn emit_link<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        let mut text = mem::take(&mut self.inline.link_text);
        let mut url = mem::take(&mut self.inline.link_url);
        self.inline.in_link = false;
        self.inline.in_link_url = false;
        self.inline.pending_close = false;
        let res = self.emit_link_parts(sink, &text, &url);
        text.clear();
        url.clear();
        self.inline.link_text = text;
        self.inline.link_url = url;
        res
    }

    fn emit_link_parts<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        text: &str,
        url: &str,
    ) -> io::Result<()> {
        if self.osc8 && !url.is_empty() {
            sink.write_token(Token::link_start(url))?;
            self.emit_link_text(sink, text)?;
            return sink.write_token(Token::link_end());
        }
        self.emit_link_text(sink, text)?;
        if !url.is_empty() {
            sink.write_token(Token::styled(" (", &self.styles.text.prefix))?;
            sink.write_token(Token::url(url, &self.styles.link_url.prefix))?;
            sink.write_token(Token::styled(")", &self.styles.text.prefix))?;
        }
        Ok(())
    }

    // Link text carries its own emphasis toggles, layered between the
    // line style and the link style.
    fn emit_link_text<S: TokenSink + ?Sized>(
        &mut self,
        sink: &mut S,
        text: &str,
    ) -> io::Result<()> {
        let mut state = LinkDelims::default();
        let base_em = self.inline.in_em;
        let base_strong = self.inline.in_strong;
        for r in text.chars() {
            if r == '*' || r == '_' {
                if state.pending_delim == Some(r) {
                    state.pending_count += 1;
                } else {
                    state.flush();
                    state.pending_delim = Some(r);
                    state.pending_count = 1;
                }
                continue;
            }
            if state.pending_count > 0 && state.pending_delim != Some(r) {
                state.flush();
            }
            self.style_scratch.clear();
            if self.line_styled {
                self.style_scratch.push_str(&self.line_style);
            }
            let outer = emphasis_style(&self.styles, base_em, base_strong);
            self.style_scratch.push_str(outer);
            self.style_scratch.push_str(&self.styles.link_text.prefix);
            let inner = emphasis_style(&self.styles, state.in_em, state.in_strong);
            self.style_scratch.push_str(inner);
            let mut b = [0u8; 4];
            sink.write_token(Token {
                text: r.encode_utf8(&mut b),
                style: &self.style_scratch,
                kind: TokenKind::Text,
                ..Token::default()
            })?;
        }
        state.flush();
        Ok(())
    }

    fn flush_pending_backticks<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        if self.inline.pending_backticks == 0 {
            return Ok(());
        }
        let count = self.inline.pending_backticks;
        self.inline.pending_backticks = 0;
        self.emit_inline_backticks(sink, count)
    }

    fn flush_pending_delims(&mut self) {
        if self.inline.pending_count == 0 {
            return;
        }
        if self.inline.pending_count >= 2 {
            self.inline.in_strong = !self.inline.in_strong;
            self.inline.pending_count -= 2;
        }
        if self.inline.pending_count >= 1 {
            self.inline.in_em = !self.inline.in_em;
            self.inline.pending_count = 0;
        }
        self.inline.pending_delim = None;
    }

    fn flush_pending_entity<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        if !self.inline.in_entity || self.inline.entity.is_empty() {
            return Ok(());
        }
        self.inline.in_entity = false;
        let mut entity = mem::take(&mut self.inline.entity);
        let res = self.emit_styled_text(sink, &entity);
        entity.clear();
        self.inline.entity = entity;
        res
    }

    fn flush_pending_num_us<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        if !self.inline.pending_num_us {
            return Ok(());
        }
        self.inline.pending_num_us = false;
        let kind = self.resolve_inline_style();
        sink.write_token(Token {
            text: "_",
            style: &self.style_scratch,
            kind,
            ..Token::default()
        })
    }

    /// Commits any partial line and closes open inline spans with their
    /// literal fallback text.
    pub fn finalize<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        if !self.line_buf.is_empty() {
            if self.line_decided {
                let mut buf = mem::take(&mut self.buf_scratch);
                buf.clear();
                buf.extend_from_slice(&self.line_buf);
                let idx = self.line_emit_idx.min(buf.len());
                let res = self.emit_inline_runes(sink, &buf[idx..]);
                buf.clear();
                self.buf_scratch = buf;
                res?;
                self.flush_pending_backticks(sink)?;
                self.flush_pending_entity(sink)?;
                self.flush_pending_num_us(sink)?;
                self.flush_pending_delims();
                self.line_styled = false;
            } else if self.in_indent_code {
                self.maybe_decide_indent_code_line(sink, true)?;
                if self.code_line_decided && self.code_line_is_code {
                    self.reset_line();
                }
            } else {
                self.maybe_decide_line(sink, true)?;
                if self.line_decided && self.line_emit_idx < self.line_buf.len() {
                    let mut buf = mem::take(&mut self.buf_scratch);
                    buf.clear();
                    buf.extend_from_slice(&self.line_buf);
                    let idx = self.line_emit_idx.min(buf.len());
                    let res = self.emit_inline_runes(sink, &buf[idx..]);
                    buf.clear();
                    self.buf_scratch = buf;
                    res?;
                    self.flush_pending_backticks(sink)?;
                    self.flush_pending_entity(sink)?;
                    self.flush_pending_num_us(sink)?;
                    self.flush_pending_delims();
                    self.line_styled = false;
                }
            }
            self.reset_line();
        }
        if self.in_code_fence {
            self.in_code_fence = false;
            self.fence_marker = "";
            self.pending_code_nl = false;
        }
        if self.in_indent_code {
            self.in_indent_code = false;
        }
        if self.inline.in_link {
            self.emit_link_literal(sink, true)?;
        }
        if self.inline.in_auto_link {
            let mut tmp = mem::take(&mut self.scratch);
            tmp.clear();
            tmp.push('<');
            tmp.push_str(&self.inline.auto_link);
            self.inline.in_auto_link = false;
            self.inline.auto_link.clear();
            let res = self.emit_styled_text(sink, &tmp);
            tmp.clear();
            self.scratch = tmp;
            res?;
        }
        Ok(())
    }
}

fn emphasis_style(styles: &Styles, in_em: bool, in_strong: bool) -> &str {
    match (in_em, in_strong) {
        (true, true) => &styles.emphasis_strong.prefix,
        (false, true) => &styles.strong.prefix,
        (true, false) => &styles.emphasis.prefix,
        (false, false) => "",
    }
}

fn push_spaces(out: &mut String, count: usize) {
    let mut remaining = count;
    while remaining > 0 {
        let take = remaining.min(SPACES.len());
        out.push_str(&SPACES[..take]);
        remaining -= take;
    }
}

fn is_potential_block_start(r: char) -> bool {
    matches!(r, '#' | '-' | '+' | '*' | '`' | '~' | '>') || r.is_ascii_digit()
}

fn should_attempt_decision(line: &[char]) -> bool {
    if line.len() < 2 {
        return false;
    }
    let last = line[line.len() - 1];
    if last == ' ' || last == '\t' {
        return true;
    }
    !is_potential_block_start(last)
}

/// Parses leading `>` markers: returns depth, the remaining line, and
/// whether any marker was actually present.
fn parse_quote_prefix(line: &str) -> (usize, &str, bool) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    let mut j = i;
    let mut depth = 0;
    while j < bytes.len() && bytes[j] == b'>' {
        depth += 1;
        j += 1;
        if j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
    }
    if depth == 0 {
        return (0, line, false);
    }
    (depth, &line[j..], true)
}

struct ListMarker<'a> {
    ordered: bool,
    marker: char,
    number: usize,
    marker_len: usize,
    padding: usize,
    content: &'a str,
}

fn parse_list_marker(text: &str) -> Option<ListMarker<'_>> {
    let bytes = text.as_bytes();
    match bytes.first()? {
        b'-' | b'+' | b'*' => {
            if bytes.len() < 2 || !is_space(bytes[1]) {
                return None;
            }
            let (padding, idx) = count_spaces(&text[1..]);
            if padding == 0 {
                return None;
            }
            Some(ListMarker {
                ordered: false,
                marker: bytes[0] as char,
                number: 0,
                marker_len: 1,
                padding,
                content: &text[1 + idx..],
            })
        }
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits >= bytes.len() {
                return None;
            }
            let delim = bytes[digits];
            if delim != b'.' && delim != b')' {
                return None;
            }
            if digits + 1 >= bytes.len() || !is_space(bytes[digits + 1]) {
                return None;
            }
            let number = text[..digits].parse::<usize>().unwrap_or(0);
            let (padding, idx) = count_spaces(&text[digits + 1..]);
            if padding == 0 {
                return None;
            }
            Some(ListMarker {
                ordered: true,
                marker: delim as char,
                number,
                marker_len: digits + 1,
                padding,
                content: &text[digits + 1 + idx..],
            })
        }
        _ => None,
    }
}

fn parse_heading(text: &str) -> Option<(usize, &str)> {
    if !text.starts_with('#') {
        return None;
    }
    let level = text.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    if !text[level..].starts_with(' ') {
        return None;
    }
    Some((level, text[level + 1..].trim()))
}

fn fence_marker(text: &str) -> Option<&'static str> {
    let trim = text.trim();
    if trim.starts_with("```") {
        return Some("```");
    }
    if trim.starts_with("~~~") {
        return Some("~~~");
    }
    None
}

fn is_maybe_fence(text: &str) -> bool {
    let trim = text.trim();
    if trim.is_empty() || trim.len() >= 3 {
        return false;
    }
    let ch = trim.as_bytes()[0];
    (ch == b'`' || ch == b'~') && trim.bytes().all(|b| b == ch)
}

fn is_thematic_break(text: &str) -> bool {
    let trim = text.trim();
    if trim.len() < 3 {
        return false;
    }
    let ch = trim.as_bytes()[0];
    (ch == b'-' || ch == b'*' || ch == b'_') && trim.bytes().all(|b| b == ch)
}

fn is_maybe_thematic_break(text: &str) -> bool {
    let trim = text.trim();
    if trim.is_empty() || trim.len() >= 3 {
        return false;
    }
    let ch = trim.as_bytes()[0];
    (ch == b'-' || ch == b'*' || ch == b'_') && trim.bytes().all(|b| b == ch)
}

fn is_maybe_list_start(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b'-' | b'+' | b'*') => bytes.len() == 1 || is_space(bytes[1]),
        Some(b'0'..=b'9') => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == bytes.len() {
                return true;
            }
            if bytes[digits] == b'.' || bytes[digits] == b')' {
                return digits + 1 == bytes.len() || is_space(bytes[digits + 1]);
            }
            false
        }
        _ => false,
    }
}

/// Counts leading indentation, tabs as four columns; also returns the
/// byte offset of the first non-indent byte.
fn leading_indent_count(s: &str) -> (usize, usize) {
    let mut count = 0;
    let mut i = 0;
    for b in s.bytes() {
        match b {
            b' ' => count += 1,
            b'\t' => count += 4,
            _ => break,
        }
        i += 1;
    }
    (count, i)
}

fn trim_indent(s: &str, mut count: usize) -> &str {
    let mut i = 0;
    for b in s.bytes() {
        if count == 0 {
            break;
        }
        match b {
            b' ' => count -= 1,
            b'\t' => count = count.saturating_sub(4),
            _ => break,
        }
        i += 1;
    }
    &s[i..]
}

fn count_spaces(s: &str) -> (usize, usize) {
    let mut count = 0;
    for b in s.bytes() {
        if !is_space(b) {
            break;
        }
        count += 1;
    }
    (count, count)
}

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn has_hard_line_break(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b' ').count() >= 2
}

fn task_list_extra_indent(content: &str) -> usize {
    let bytes = content.as_bytes();
    if bytes.len() < 4 {
        return 0;
    }
    if bytes[0] != b'[' || bytes[2] != b']' || bytes[3] != b' ' {
        return 0;
    }
    match bytes[1] {
        b' ' | b'x' | b'X' => 4,
        _ => 0,
    }
}

fn is_nbsp_runes(runes: &[char]) -> bool {
    if runes.len() != 6 {
        return false;
    }
    runes[0] == '&'
        && runes[5] == ';'
        && runes[1].eq_ignore_ascii_case(&'n')
        && runes[2].eq_ignore_ascii_case(&'b')
        && runes[3].eq_ignore_ascii_case(&'s')
        && runes[4].eq_ignore_ascii_case(&'p')
}

fn decode_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('&')?.strip_suffix(';')?;
    if body.is_empty() {
        return None;
    }
    if let Some(num) = body.strip_prefix('#') {
        let (digits, radix) = match num.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16),
            None => (num, 10),
        };
        if digits.is_empty() {
            return None;
        }
        let value = u32::from_str_radix(digits, radix).ok()?;
        if value == 160 {
            return Some('\u{a0}');
        }
        return char::from_u32(value);
    }
    if body.eq_ignore_ascii_case("nbsp") {
        return Some('\u{a0}');
    }
    None
}

fn is_email_autolink(text: &str) -> bool {
    if text.is_empty() || text.contains([' ', '\t', '\r', '\n']) {
        return false;
    }
    if text.contains(':') {
        return false;
    }
    let at = match text.find('@') {
        Some(idx) => idx,
        None => return false,
    };
    at > 0 && at < text.len() - 1 && text.matches('@').count() == 1
}

fn is_scheme_autolink(text: &str) -> bool {
    if text.is_empty() || text.contains([' ', '\t', '\r', '\n']) {
        return false;
    }
    match text.find(':') {
        Some(colon) if colon > 0 => is_scheme(&text[..colon]),
        _ => false,
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_parse() {
        assert_eq!(parse_heading("# Title"), Some((1, "Title")));
        assert_eq!(parse_heading("### Sub"), Some((3, "Sub")));
        assert_eq!(parse_heading("###### Six"), Some((6, "Six")));
        assert_eq!(parse_heading("####### Seven"), None);
        assert_eq!(parse_heading("#nospace"), None);
        assert_eq!(parse_heading("plain"), None);
    }

    #[test]
    fn list_markers_parse() {
        let m = parse_list_marker("- item").expect("dash marker");
        assert!(!m.ordered);
        assert_eq!(m.marker, '-');
        assert_eq!(m.content, "item");
        assert_eq!(m.marker_len, 1);
        assert_eq!(m.padding, 1);

        let m = parse_list_marker("12. twelfth").expect("ordered marker");
        assert!(m.ordered);
        assert_eq!(m.number, 12);
        assert_eq!(m.marker, '.');
        assert_eq!(m.marker_len, 3);
        assert_eq!(m.content, "twelfth");

        let m = parse_list_marker("3) third").expect("paren marker");
        assert_eq!(m.marker, ')');
        assert_eq!(m.number, 3);

        assert!(parse_list_marker("-nospace").is_none());
        assert!(parse_list_marker("1.nospace").is_none());
        assert!(parse_list_marker("word").is_none());
    }

    #[test]
    fn quote_prefix_parses_depth() {
        let (depth, rest, explicit) = parse_quote_prefix("> quoted");
        assert_eq!((depth, rest, explicit), (1, "quoted", true));

        let (depth, rest, explicit) = parse_quote_prefix(">> nested");
        assert_eq!((depth, rest, explicit), (2, "nested", true));

        let (depth, _, explicit) = parse_quote_prefix("plain");
        assert_eq!((depth, explicit), (0, false));

        let (depth, rest, _) = parse_quote_prefix("  > indented");
        assert_eq!((depth, rest), (1, "indented"));
    }

    #[test]
    fn thematic_break_detection() {
        assert!(is_thematic_break("---"));
        assert!(is_thematic_break("*****"));
        assert!(is_thematic_break("___"));
        assert!(!is_thematic_break("--"));
        assert!(!is_thematic_break("-*-"));
        assert!(is_maybe_thematic_break("--"));
        assert!(!is_maybe_thematic_break("---"));
    }

    #[test]
    fn fence_markers_detect() {
        assert_eq!(fence_marker("```"), Some("```"));
        assert_eq!(fence_marker("```rust"), Some("```"));
        assert_eq!(fence_marker("~~~"), Some("~~~"));
        assert_eq!(fence_marker("``"), None);
        assert!(is_maybe_fence("``"));
        assert!(!is_maybe_fence("```"));
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_entity("&nbsp;"), Some('\u{a0}'));
        assert_eq!(decode_entity("&NBSP;"), Some('\u{a0}'));
        assert_eq!(decode_entity("&#160;"), Some('\u{a0}'));
        assert_eq!(decode_entity("&#xA0;"), Some('\u{a0}'));
        assert_eq!(decode_entity("&#65;"), Some('A'));
        assert_eq!(decode_entity("&amp;"), None);
        assert_eq!(decode_entity("&#;"), None);
        assert_eq!(decode_entity("&#x;"), None);
    }

    #[test]
    fn nbsp_rune_window() {
        let runes: Vec<char> = "&nbsp;".chars().collect();
        assert!(is_nbsp_runes(&runes));
        let runes: Vec<char> = "&NbSp;".chars().collect();
        assert!(is_nbsp_runes(&runes));
        let runes: Vec<char> = "&nbsp".chars().collect();
        assert!(!is_nbsp_runes(&runes));
    }

    #[test]
    fn autolink_classification() {
        assert!(is_email_autolink("user@example.com"));
        assert!(!is_email_autolink("not an email"));
        assert!(!is_email_autolink("two@@example.com"));
        assert!(!is_email_autolink("mailto:user@example.com"));
        assert!(is_scheme_autolink("https://example.com"));
        assert!(is_scheme_autolink("ftp://host"));
        assert!(!is_scheme_autolink("://nope"));
        assert!(!is_scheme_autolink("no-colon"));
    }

    #[test]
    fn indent_counting_treats_tabs_as_four() {
        assert_eq!(leading_indent_count("    x"), (4, 4));
        assert_eq!(leading_indent_count("\tx"), (4, 1));
        assert_eq!(leading_indent_count(" \t x"), (6, 3));
        assert_eq!(trim_indent("    code", 4), "code");
        assert_eq!(trim_indent("\tcode", 4), "code");
    }

    #[test]
    fn hard_break_requires_two_trailing_spaces() {
        assert!(has_hard_line_break("line  "));
        assert!(has_hard_line_break("line   "));
        assert!(!has_hard_line_break("line "));
        assert!(!has_hard_line_break("line"));
    }

    #[test]
    fn task_list_indent_extra() {
        assert_eq!(task_list_extra_indent("[ ] task"), 4);
        assert_eq!(task_list_extra_indent("[x] done"), 4);
        assert_eq!(task_list_extra_indent("[X] done"), 4);
        assert_eq!(task_list_extra_indent("[y] nope"), 0);
        assert_eq!(task_list_extra_indent("task"), 0);
    }

    #[test]
    fn maybe_list_start_detection() {
        assert!(is_maybe_list_start("-"));
        assert!(is_maybe_list_start("- x"));
        assert!(is_maybe_list_start("12"));
        assert!(is_maybe_list_start("12."));
        assert!(is_maybe_list_start("12. x"));
        assert!(!is_maybe_list_start("-x"));
        assert!(!is_maybe_list_start("12x"));
        assert!(!is_maybe_list_start("word"));
    }

    #[test]
    fn ordered_marker_table_round_trips() {
        assert_eq!(ordered_marker(1, '.'), Some("1."));
        assert_eq!(ordered_marker(42, ')'), Some("42)"));
        assert_eq!(ordered_marker(1024, '.'), Some("1024."));
        assert_eq!(ordered_marker(1025, '.'), None);
    }
}
