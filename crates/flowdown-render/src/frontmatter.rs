//! Start-of-stream front-matter stripping.
//!
//! The filter buffers the head of the byte stream until it can tell
//! whether the document opens with a metadata block (`---`, `+++`, or
//! `;;;` fenced). A recognized block is dropped through its closing
//! delimiter; everything else is forwarded untouched. After the first
//! decision the filter is a passthrough for the rest of the document.

const MAX_PROBE_BYTES: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct FrontMatterFilter {
    passthrough: bool,
    probe: Vec<u8>,
    // probe contents were handed out on the previous call; clear lazily
    // because the returned slice borrowed them
    drained: bool,
}

enum Decision {
    Undecided,
    Forward,
    Body(usize),
}

impl FrontMatterFilter {
    pub fn new() -> Self {
        FrontMatterFilter::default()
    }

    pub fn reset(&mut self) {
        self.passthrough = false;
        self.probe.clear();
        self.drained = false;
    }

    /// Feeds a chunk and returns the bytes that may flow to the parser.
    ///
    /// While probing, the returned slice is empty; once decided it is the
    /// buffered head (minus any stripped front matter) followed by all
    /// later chunks verbatim.
    pub fn process<'a>(&'a mut self, chunk: &'a [u8]) -> &'a [u8] {
        if self.drained {
            self.probe.clear();
            self.drained = false;
        }
        if self.passthrough || chunk.is_empty() {
            return chunk;
        }
        self.probe.extend_from_slice(chunk);
        match self.decide(false) {
            Decision::Body(start) => {
                tracing::debug!(dropped = start, "stripped front matter");
                self.passthrough = true;
                self.drained = true;
                &self.probe[start..]
            }
            Decision::Forward => {
                self.passthrough = true;
                self.drained = true;
                &self.probe
            }
            Decision::Undecided => {
                if self.probe.len() > MAX_PROBE_BYTES {
                    self.passthrough = true;
                    self.drained = true;
                    &self.probe
                } else {
                    &[]
                }
            }
        }
    }

    /// Flushes whatever is still buffered at end of stream.
    pub fn finish(&mut self) -> &[u8] {
        if self.drained {
            self.probe.clear();
            self.drained = false;
        }
        if self.passthrough || self.probe.is_empty() {
            return &[];
        }
        self.passthrough = true;
        self.drained = true;
        match self.decide(true) {
            Decision::Body(start) => {
                tracing::debug!(dropped = start, "stripped front matter");
                &self.probe[start..]
            }
            _ => &self.probe,
        }
    }

    fn decide(&self, eof: bool) -> Decision {
        let Some((open_line, open_next)) = next_line(&self.probe, 0, eof) else {
            return Decision::Undecided;
        };
        let Some(delim) = parse_opening_delimiter(open_line) else {
            return Decision::Forward;
        };
        let Some((second_line, second_next)) = next_line(&self.probe, open_next, eof) else {
            return Decision::Undecided;
        };
        if !metadata_likely(second_line) {
            return Decision::Forward;
        }
        match find_closing_delimiter(&self.probe, second_next, delim, eof) {
            Some(close_next) => Decision::Body(close_next),
            None if eof => Decision::Forward,
            None => Decision::Undecided,
        }
    }
}

fn next_line(src: &[u8], start: usize, eof: bool) -> Option<(&[u8], usize)> {
    if start > src.len() {
        return None;
    }
    if start == src.len() {
        return eof.then_some((&src[start..], start));
    }
    match src[start..].iter().position(|&b| b == b'\n') {
        Some(i) => Some((trim_cr(&src[start..start + i]), start + i + 1)),
        None if eof => Some((trim_cr(&src[start..]), src.len())),
        None => None,
    }
}

fn parse_opening_delimiter(line: &[u8]) -> Option<&'static [u8]> {
    match trim_bom(line).trim_ascii() {
        b"---" => Some(b"---"),
        b"+++" => Some(b"+++"),
        b";;;" => Some(b";;;"),
        _ => None,
    }
}

fn metadata_likely(line: &[u8]) -> bool {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.starts_with(b"{")
        || trimmed.starts_with(b"[")
        || trimmed.contains(&b':')
        || trimmed.contains(&b'=')
}

fn find_closing_delimiter(src: &[u8], start: usize, delim: &[u8], eof: bool) -> Option<usize> {
    let mut idx = start;
    while idx <= src.len() {
        let (line, next) = next_line(src, idx, eof)?;
        if line.trim_ascii() == delim {
            return Some(next);
        }
        if next == idx {
            return None;
        }
        idx = next;
        if idx == src.len() && !eof {
            return None;
        }
    }
    None
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(&[0xef, 0xbb, 0xbf][..]).unwrap_or(line)
}
