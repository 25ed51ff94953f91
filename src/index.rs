use std::{fmt, ops::ControlFlow, time::Instant};

use itertools::Itertools;

use crate::{
    config::IndexConfig,
    error::Error,
    source::ByteSource,
    stream::{self, LineEnding},
    Result,
};

/// Marks that line `line` begins at byte `byte` of the indexed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    pub line: usize,
    pub byte: u64,
}

impl Checkpoint {
    /// The first line always starts at the first byte
    pub const ORIGIN: Checkpoint = Checkpoint { line: 0, byte: 0 };

    #[inline]
    pub const fn new(line: usize, byte: u64) -> Checkpoint {
        Checkpoint { line, byte }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(line {}, byte {})", self.line, self.byte)
    }
}

/// A sparse in-memory line index. Instead of the offset of every line, only a checkpoint every
/// `sample_distance` bytes is kept. A lookup seeks to the nearest checkpoint and reads forward,
/// which reads at most `sample_distance` bytes plus one line.
///
/// The index is built once for a fixed snapshot of the data and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Sorted by line and byte, the first entry is always `Checkpoint::ORIGIN`
    checkpoints: Vec<Checkpoint>,
    total_lines: usize,
    sample_distance: u64,
    line_ending: LineEnding,
}

impl Index {
    /// Build a new index over all lines of `source` by scanning it once from the start.
    pub async fn build<S: ByteSource + ?Sized>(source: &S, config: &IndexConfig) -> Result<Index> {
        config.validate()?;

        let sample_distance = config.sample_distance;
        let ending = config.line_ending;
        let width = ending.width();

        tracing::info!("Preprocessing {}...", source.name());
        let start = Instant::now();

        let mut checkpoints = vec![Checkpoint::ORIGIN];
        let mut last_checkpoint_byte = 0;
        let mut current_line = 0;
        let mut current_byte: u64 = 0;
        let mut mismatch = None;

        let summary = stream::scan(source, 0, ending, |line| {
            if current_byte - last_checkpoint_byte >= sample_distance {
                checkpoints.push(Checkpoint::new(current_line, current_byte));
                last_checkpoint_byte = current_byte;
            }

            let line_len = line.text.len() + width;

            // Offsets are only correct if every terminator is as wide as configured
            if line.terminated && line.consumed != line_len {
                mismatch = Some(Error::LineEndingMismatch {
                    line: current_line,
                    byte: current_byte,
                });
                return ControlFlow::Break(());
            }

            current_line += 1;
            current_byte += line_len as u64;
            ControlFlow::Continue(())
        })
        .await?;

        if let Some(err) = mismatch {
            tracing::error!("Preprocessing of {} failed: {}", source.name(), err);
            return Err(err);
        }

        let index = Index {
            checkpoints,
            total_lines: current_line,
            sample_distance,
            line_ending: ending,
        };

        tracing::info!(
            "Preprocessing of {} complete with {} lines ({} bytes) and {} checkpoints in {:.3} seconds",
            source.name(),
            index.total_lines,
            summary.bytes,
            index.checkpoints.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(index)
    }

    /// Returns the checkpoint with the greatest line at or before `line`. Falls back to
    /// `Checkpoint::ORIGIN`. Lines past the end are not rejected here but resolve to the last
    /// checkpoint.
    pub fn nearest_checkpoint_before(&self, line: usize) -> Checkpoint {
        let pos = self.checkpoints.partition_point(|c| c.line <= line);
        pos.checked_sub(1)
            .and_then(|pos| self.checkpoints.get(pos))
            .copied()
            .unwrap_or(Checkpoint::ORIGIN)
    }

    /// Returns the amount of lines of the indexed data.
    #[inline]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Returns `true` if the indexed data has no lines
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_lines == 0
    }

    /// All checkpoints, sorted by line
    #[inline]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Amount of checkpoints. This is always at least one.
    #[inline]
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// The line ending the offsets were computed with
    #[inline]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Approximate amount of memory the checkpoints take up
    pub fn len_bytes(&self) -> usize {
        self.checkpoints.len() * std::mem::size_of::<Checkpoint>()
    }

    /// Checks the ordering and spacing invariants of the checkpoints. Always `true` for a built
    /// index.
    pub fn is_well_formed(&self) -> bool {
        self.checkpoints.first() == Some(&Checkpoint::ORIGIN)
            && self
                .checkpoints
                .iter()
                .tuple_windows()
                .all(|(a, b)| {
                    a.line < b.line && a.byte < b.byte && b.byte - a.byte >= self.sample_distance
                })
            && self
                .checkpoints
                .last()
                .map_or(true, |c| c.line == 0 || c.line < self.total_lines)
    }
}
