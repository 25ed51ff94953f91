use std::{ops::ControlFlow, sync::Arc};

use async_trait::async_trait;

use crate::{
    config::IndexConfig, error::Error, index::Index, source::ByteSource, stream, Indexable,
    ReadByLine, Result,
};

/// Resolves line numbers to their text using a sparse `Index` over a `ByteSource`.
///
/// Cloning is cheap: source and index are shared. Every lookup opens its own reader on the
/// source, so a resolver can be used from many tasks at once.
#[derive(Debug)]
pub struct LineResolver<S> {
    source: Arc<S>,
    index: Arc<Index>,
}

impl<S: ByteSource> LineResolver<S> {
    /// Builds the index for `source` and returns a resolver using it.
    pub async fn build(source: S, config: &IndexConfig) -> Result<LineResolver<S>> {
        let index = Index::build(&source, config).await?;
        Ok(Self::new(Arc::new(source), Arc::new(index)))
    }

    /// Creates a resolver from an existing index. Expects the index to be built from `source`,
    /// otherwise lookups fail with `Error::IndexInconsistency` or return wrong lines.
    #[inline]
    pub fn new(source: Arc<S>, index: Arc<Index>) -> LineResolver<S> {
        Self { source, index }
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Reads line `line` into `out` without its terminator and returns the amount of bytes read.
    pub async fn resolve_raw(&self, line: usize, out: &mut Vec<u8>) -> Result<usize> {
        let total_lines = self.index.total_lines();
        if line >= total_lines {
            return Err(Error::OutOfBounds { line, total_lines });
        }

        let checkpoint = self.index.nearest_checkpoint_before(line);
        tracing::debug!("Retrieving line {} starting at {}", line, checkpoint);

        let mut current_line = checkpoint.line;
        let mut len = 0;

        let summary = stream::scan(
            &*self.source,
            checkpoint.byte,
            self.index.line_ending(),
            |text| {
                if current_line == line {
                    out.extend_from_slice(text.text);
                    len = text.text.len();
                    return ControlFlow::Break(());
                }
                current_line += 1;
                ControlFlow::Continue(())
            },
        )
        .await?;

        if summary.stopped {
            return Ok(len);
        }

        // The source ended before the line the index promised
        let err = Error::IndexInconsistency {
            line,
            checkpoint,
            scanned: summary.lines,
        };
        tracing::error!("{} no longer matches its index: {}", self.source.name(), err);
        Err(err)
    }

    /// Reads line `line` as `String`.
    #[inline]
    pub async fn resolve(&self, line: usize) -> Result<String> {
        self.read_line(line).await
    }
}

impl<S> Clone for LineResolver<S> {
    /// Does not clone the source or the index but the Arc references to them
    #[inline]
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            index: Arc::clone(&self.index),
        }
    }
}

impl<S> Indexable for LineResolver<S> {
    #[inline]
    fn get_index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl<S: ByteSource> ReadByLine for LineResolver<S> {
    #[inline]
    async fn read_line_raw(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        self.resolve_raw(line, buf).await
    }
}
