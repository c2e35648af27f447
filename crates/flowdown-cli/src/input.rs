//! Input acquisition: stdin, files, and http(s) URLs, concatenated in
//! argument order. Each source is opened lazily when reading reaches it.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

enum Source {
    Stdin,
    File(PathBuf),
    Url(String),
}

/// A reader that concatenates several lazily-opened sources.
pub struct MultiReader {
    sources: Vec<Source>,
    next: usize,
    current: Option<Box<dyn Read>>,
}

impl Read for MultiReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.current.is_none() {
                if self.next >= self.sources.len() {
                    return Ok(0);
                }
                let source = &self.sources[self.next];
                self.next += 1;
                self.current = Some(open_source(source).map_err(io::Error::other)?);
            }
            if let Some(reader) = self.current.as_mut() {
                let n = reader.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
                self.current = None;
            }
        }
    }
}

/// Builds a reader over all inputs; stdin when none are given.
pub fn open_inputs(args: &[String]) -> Result<MultiReader> {
    if args.is_empty() {
        return Ok(MultiReader {
            sources: vec![Source::Stdin],
            next: 0,
            current: None,
        });
    }
    let mut sources = Vec::with_capacity(args.len());
    for raw in args {
        sources.push(classify_input(raw)?);
    }
    Ok(MultiReader {
        sources,
        next: 0,
        current: None,
    })
}

fn classify_input(raw: &str) -> Result<Source> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("empty input argument");
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(Source::Url(trimmed.to_string()));
    }
    if let Some(path) = lower.strip_prefix("file://") {
        let path = &trimmed[trimmed.len() - path.len()..];
        return Ok(Source::File(normalize_path(path)));
    }
    Ok(Source::File(normalize_path(trimmed)))
}

fn open_source(source: &Source) -> Result<Box<dyn Read>> {
    match source {
        Source::Stdin => Ok(Box::new(io::stdin().lock())),
        Source::File(path) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            Ok(Box::new(file))
        }
        Source::Url(url) => {
            tracing::debug!(url, "fetching input over http");
            let response = reqwest::blocking::get(url)
                .with_context(|| format!("fetch {url}"))?
                .error_for_status()
                .with_context(|| format!("fetch {url}"))?;
            Ok(Box::new(response))
        }
    }
}

/// Throttles an inner reader to simulate streamed delivery: each read is
/// capped at `max_chunk` bytes and followed by a fixed delay.
///
/// The document still flows through the full render pipeline; only the
/// arrival pace changes.
pub struct SlowReader<R> {
    inner: R,
    max_chunk: usize,
    delay: Duration,
}

impl<R: Read> SlowReader<R> {
    pub fn new(inner: R, max_chunk: usize, delay: Duration) -> Self {
        SlowReader {
            inner,
            max_chunk,
            delay,
        }
    }
}

impl<R: Read> Read for SlowReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let buf = if self.max_chunk > 0 && buf.len() > self.max_chunk {
            &mut buf[..self.max_chunk]
        } else {
            buf
        };
        let n = self.inner.read(buf)?;
        if n > 0 && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(n)
    }
}

fn normalize_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn no_args_reads_stdin() {
        let reader = open_inputs(&[]).unwrap();
        assert_eq!(reader.sources.len(), 1);
        assert!(matches!(reader.sources[0], Source::Stdin));
    }

    #[test]
    fn urls_and_paths_are_classified() {
        let args = vec![
            "https://example.com/doc.md".to_string(),
            "README.md".to_string(),
            "file:///tmp/doc.md".to_string(),
        ];
        let reader = open_inputs(&args).unwrap();
        assert!(matches!(reader.sources[0], Source::Url(_)));
        assert!(matches!(reader.sources[1], Source::File(_)));
        assert!(matches!(reader.sources[2], Source::File(_)));
    }

    #[test]
    fn empty_argument_is_rejected() {
        assert!(open_inputs(&["  ".to_string()]).is_err());
    }

    #[test]
    fn files_concatenate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.md");
        let second = dir.path().join("b.md");
        std::fs::File::create(&first)
            .unwrap()
            .write_all(b"alpha\n")
            .unwrap();
        std::fs::File::create(&second)
            .unwrap()
            .write_all(b"beta\n")
            .unwrap();
        let mut reader = open_inputs(&[
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ])
        .unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "alpha\nbeta\n");
    }

    #[test]
    fn missing_file_surfaces_as_read_error() {
        let mut reader = open_inputs(&["/no/such/file.md".to_string()]).unwrap();
        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).is_err());
    }

    #[test]
    fn slow_reader_caps_chunk_size() {
        let mut reader = SlowReader::new(&b"abcdefgh"[..], 3, Duration::ZERO);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn slow_reader_delivers_everything() {
        let mut reader = SlowReader::new(&b"hello world"[..], 4, Duration::ZERO);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn slow_reader_zero_chunk_leaves_reads_unbounded() {
        let mut reader = SlowReader::new(&b"abcdefgh"[..], 0, Duration::ZERO);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 8);
    }
}
