// Line cursor over the concatenated input streams.
// The driver and the schema parser share one cursor: peek() looks at the next
// line without consuming it, advance() consumes it.

use crate::error::{ConvertError, Location, Result};
use indicatif::ProgressBar;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

pub const STDIN_NAME: &str = "<stdin>";

const READ_BUFFER: usize = 1024 * 1024;

// One input line with its line terminator removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub at: Location,
}

enum Source {
    Path(String),
    Reader(String, Box<dyn BufRead>),
}

pub struct LineCursor {
    pending: VecDeque<Source>,
    current: Option<(String, Box<dyn BufRead>)>,
    line_no: usize,
    peeked: Option<Line>,
    lines_read: u64,
    buf: String,
    bar: Option<ProgressBar>,
}

impl LineCursor {
    // Files are opened lazily in argument order; "-" or an empty list means stdin.
    pub fn from_paths(paths: &[String]) -> Self {
        let mut pending = VecDeque::new();
        if paths.is_empty() {
            pending.push_back(stdin_source());
        }
        for path in paths {
            if path == "-" {
                pending.push_back(stdin_source());
            } else {
                pending.push_back(Source::Path(path.clone()));
            }
        }
        Self::with_sources(pending)
    }

    // Build a cursor over already-open readers, each labelled for error messages.
    #[cfg(test)]
    pub fn from_readers<I, R>(readers: I) -> Self
    where
        I: IntoIterator<Item = (String, R)>,
        R: BufRead + 'static,
    {
        let pending = readers
            .into_iter()
            .map(|(name, r)| Source::Reader(name, Box::new(r) as Box<dyn BufRead>))
            .collect();
        Self::with_sources(pending)
    }

    fn with_sources(pending: VecDeque<Source>) -> Self {
        Self {
            pending,
            current: None,
            line_no: 0,
            peeked: None,
            lines_read: 0,
            buf: String::new(),
            bar: None,
        }
    }

    // Attach a byte progress bar advanced as lines are read.
    pub fn with_progress(mut self, bar: Option<ProgressBar>) -> Self {
        self.bar = bar;
        self
    }

    pub fn peek(&mut self) -> Result<Option<&Line>> {
        if self.peeked.is_none() {
            self.peeked = self.read_next()?;
        }
        Ok(self.peeked.as_ref())
    }

    pub fn advance(&mut self) -> Result<Option<Line>> {
        match self.peeked.take() {
            Some(line) => Ok(Some(line)),
            None => self.read_next(),
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }

    fn read_next(&mut self) -> Result<Option<Line>> {
        loop {
            if self.current.is_none() {
                match self.pending.pop_front() {
                    Some(source) => {
                        self.current = Some(open_source(source)?);
                        self.line_no = 0;
                    }
                    None => return Ok(None),
                }
            }
            let Some((name, reader)) = self.current.as_mut() else {
                continue;
            };

            self.buf.clear();
            let next_line = self.line_no + 1;
            let n = reader
                .read_line(&mut self.buf)
                .map_err(|source| ConvertError::Read {
                    at: Location {
                        source: name.clone(),
                        line: next_line,
                    },
                    source,
                })?;
            if n == 0 {
                tracing::debug!("finished reading {} after {} lines", name, self.line_no);
                self.current = None;
                continue;
            }
            if let Some(bar) = &self.bar {
                bar.inc(n as u64);
            }
            self.line_no += 1;
            self.lines_read += 1;

            let text = strip_line_terminator(&self.buf).to_string();
            return Ok(Some(Line {
                text,
                at: Location {
                    source: name.clone(),
                    line: self.line_no,
                },
            }));
        }
    }
}

fn stdin_source() -> Source {
    Source::Reader(
        STDIN_NAME.to_string(),
        Box::new(BufReader::with_capacity(READ_BUFFER, io::stdin())),
    )
}

fn open_source(source: Source) -> Result<(String, Box<dyn BufRead>)> {
    match source {
        Source::Path(path) => {
            tracing::debug!("opening input {}", path);
            let file = File::open(&path).map_err(|e| ConvertError::OpenInput {
                path: path.clone(),
                source: e,
            })?;
            Ok((path, Box::new(BufReader::with_capacity(READ_BUFFER, file))))
        }
        Source::Reader(name, reader) => Ok((name, reader)),
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
