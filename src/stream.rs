use std::ops::ControlFlow;

use async_std::io::{self, prelude::*, BufRead};

use crate::{error::Error, source::ByteSource, Result};

/// The line terminator of the indexed data. Lines are always split at `\n`, `CrLf` additionally
/// strips the `\r` in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LineEnding {
    #[default]
    Lf,
    #[value(name = "crlf")]
    CrLf,
}

impl LineEnding {
    /// Amount of bytes a terminator takes up in the data
    #[inline]
    pub fn width(self) -> usize {
        match self {
            LineEnding::Lf => 1,
            LineEnding::CrLf => 2,
        }
    }
}

/// A single line emitted by a `LineStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// The lines text without its terminator
    pub text: &'a [u8],
    /// Amount of bytes read from the source for this line, including the terminator
    pub consumed: usize,
    /// `false` for a final line which is not followed by a terminator
    pub terminated: bool,
}

/// Splits a reader into lines, starting at an arbitrary byte offset of the underlying source.
/// The stream is finite and can't be restarted. Dropping it ends the scan.
#[derive(Debug)]
pub struct LineStream<R> {
    reader: R,
    ending: LineEnding,
    position: u64,
    buf: Vec<u8>,
}

impl<R: BufRead + Unpin> LineStream<R> {
    /// Wraps `reader` which must be positioned at byte `start` of its source.
    pub fn new(reader: R, start: u64, ending: LineEnding) -> LineStream<R> {
        Self {
            reader,
            ending,
            position: start,
            buf: Vec::with_capacity(1000),
        }
    }

    /// Byte position of the next line within the source
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next line. Returns `None` at the end of the source.
    pub async fn next_line(&mut self) -> io::Result<Option<Line<'_>>> {
        self.buf.clear();
        let consumed = self.reader.read_until(b'\n', &mut self.buf).await?;
        if consumed == 0 {
            return Ok(None);
        }
        self.position += consumed as u64;

        let mut text: &[u8] = &self.buf;
        let terminated = text.last() == Some(&b'\n');
        if terminated {
            text = &text[..text.len() - 1];
            if self.ending == LineEnding::CrLf {
                text = text.strip_suffix(b"\r").unwrap_or(text);
            }
        }

        Ok(Some(Line {
            text,
            consumed,
            terminated,
        }))
    }
}

impl<R: BufRead + Unpin> LineStream<R> {
    /// Opens a new stream on `source` starting at byte `start`.
    pub async fn open<S>(source: &S, start: u64, ending: LineEnding) -> Result<LineStream<R>>
    where
        S: ByteSource<Reader = R> + ?Sized,
    {
        let reader = source
            .open_at(start)
            .await
            .map_err(|e| unavailable(source, e))?;
        Ok(LineStream::new(reader, start, ending))
    }
}

/// Result of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Amount of lines passed to the callback
    pub lines: usize,
    /// Amount of bytes read from the source
    pub bytes: u64,
    /// `true` if the callback ended the scan before the end of the source
    pub stopped: bool,
}

/// Scans `source` from byte `start` and calls `on_line` for each line in order. Returning
/// `ControlFlow::Break` from `on_line` stops the scan right away.
///
/// Any io error is reported as `Error::SourceUnavailable`.
pub async fn scan<S, F>(
    source: &S,
    start: u64,
    ending: LineEnding,
    mut on_line: F,
) -> Result<ScanSummary>
where
    S: ByteSource + ?Sized,
    F: FnMut(Line<'_>) -> ControlFlow<()> + Send,
{
    let mut stream = LineStream::open(source, start, ending).await?;
    let mut lines = 0;

    loop {
        let line = match stream.next_line().await.map_err(|e| unavailable(source, e))? {
            Some(line) => line,
            None => break,
        };
        lines += 1;

        if on_line(line).is_break() {
            return Ok(ScanSummary {
                lines,
                bytes: stream.position() - start,
                stopped: true,
            });
        }
    }

    Ok(ScanSummary {
        lines,
        bytes: stream.position() - start,
        stopped: false,
    })
}

fn unavailable<S: ByteSource + ?Sized>(source: &S, err: io::Error) -> Error {
    Error::SourceUnavailable {
        name: source.name().to_string(),
        source: err,
    }
}
