use std::path::Path;

use async_trait::async_trait;

use crate::{
    config::IndexConfig,
    error::LookupError,
    index::Index,
    resolver::LineResolver,
    source::{ByteSource, FileSource},
    Indexable, ReadByLine, Result,
};

/// A preprocessed source, ready to serve lines.
///
/// A `LineService` can only be created by completing the index build, so holding one means
/// lookups can be served. It is cheap to clone and meant to be shared by all request handlers.
#[derive(Debug, Clone)]
pub struct LineService<S = FileSource> {
    filename: String,
    resolver: LineResolver<S>,
}

impl LineService<FileSource> {
    /// Open the file at `path` and build its index.
    ///
    /// Returns an error if the file can't be read.
    pub async fn open<P: AsRef<Path>>(path: P, config: &IndexConfig) -> Result<Self> {
        Self::preprocess(FileSource::new(path), config).await
    }
}

impl<S: ByteSource> LineService<S> {
    /// Build the index of `source`. Completes only after the whole source has been scanned.
    pub async fn preprocess(source: S, config: &IndexConfig) -> Result<LineService<S>> {
        let filename = source.name().to_string();
        let resolver = LineResolver::build(source, config).await?;
        Ok(Self { filename, resolver })
    }

    /// Name of the served source
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the text of `line`. Expects `line < total_lines()`.
    #[inline]
    pub async fn resolve(&self, line: usize) -> Result<String> {
        self.resolver.resolve(line).await
    }

    /// Parses a requested line number and checks it against the amount of lines.
    #[inline]
    pub fn parse_line(&self, param: &str) -> std::result::Result<usize, LookupError> {
        parse_line(param, self.total_lines())
    }

    /// Parses `param` and returns the text of the requested line.
    pub async fn lookup(&self, param: &str) -> std::result::Result<String, LookupError> {
        let line = self.parse_line(param)?;
        Ok(self.resolve(line).await?)
    }

    /// Parses `param` and reads the requested line into `buf`.
    pub async fn lookup_raw(
        &self,
        param: &str,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<usize, LookupError> {
        let line = self.parse_line(param)?;
        Ok(self.resolver.resolve_raw(line, buf).await?)
    }
}

impl<S: ByteSource> From<LineResolver<S>> for LineService<S> {
    fn from(resolver: LineResolver<S>) -> Self {
        Self {
            filename: resolver.source().name().to_string(),
            resolver,
        }
    }
}

impl<S> Indexable for LineService<S> {
    #[inline]
    fn get_index(&self) -> &Index {
        self.resolver.get_index()
    }
}

#[async_trait]
impl<S: ByteSource> ReadByLine for LineService<S> {
    #[inline]
    async fn read_line_raw(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        self.resolver.resolve_raw(line, buf).await
    }
}

/// Parses a line number given by a client. Only plain decimal numbers are accepted, anything
/// else is `InvalidLineNumber`. Numbers not below `total_lines`, including ones too large for
/// `usize`, are `LineOutOfRange`.
pub fn parse_line(param: &str, total_lines: usize) -> std::result::Result<usize, LookupError> {
    if param.is_empty() || !param.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::InvalidLineNumber(param.to_string()));
    }

    // `param` only holds digits, so parsing can only fail on overflow
    match param.parse::<usize>() {
        Ok(line) if line < total_lines => Ok(line),
        _ => Err(LookupError::LineOutOfRange {
            requested: param.to_string(),
            total_lines,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, source::MemSource, stream::LineEnding};
    use std::io::Write;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("0", 5).unwrap(), 0);
        assert_eq!(parse_line("4", 5).unwrap(), 4);
        assert_eq!(parse_line("007", 10).unwrap(), 7);

        for invalid in &["", "abc", "-1", "+1", "1.5", " 1", "1 ", "12abc", "0x10"] {
            assert!(
                matches!(
                    parse_line(invalid, 5),
                    Err(LookupError::InvalidLineNumber(_))
                ),
                "{:?} should be invalid",
                invalid
            );
        }

        assert!(matches!(
            parse_line("5", 5),
            Err(LookupError::LineOutOfRange { total_lines: 5, .. })
        ));
        assert!(matches!(
            parse_line("0", 0),
            Err(LookupError::LineOutOfRange { .. })
        ));
        assert!(matches!(
            parse_line("99999999999999999999999999", 5),
            Err(LookupError::LineOutOfRange { .. })
        ));
    }

    #[async_std::test]
    async fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alpha\nbeta\ngamma\n").unwrap();

        let service = LineService::open(file.path(), &IndexConfig::default())
            .await
            .unwrap();
        assert_eq!(service.filename(), file.path().to_string_lossy());
        assert_eq!(service.total_lines(), 3);
        assert_eq!(service.lookup("1").await.unwrap(), "beta");
        assert_eq!(service.read_line(2).await.unwrap(), "gamma");
    }

    #[async_std::test]
    async fn test_open_missing_file() {
        let res = LineService::open("./does/not/exist", &IndexConfig::default()).await;
        assert!(matches!(res, Err(Error::SourceUnavailable { .. })));
    }

    #[async_std::test]
    async fn test_lookup_raw() {
        let config = IndexConfig::new(1, LineEnding::Lf);
        let service = LineService::preprocess(MemSource::from(vec![b'x', b'\n', 0xc3]), &config)
            .await
            .unwrap();

        let mut buf = Vec::new();
        assert_eq!(service.lookup_raw("1", &mut buf).await.unwrap(), 1);
        assert_eq!(buf, vec![0xc3]);
        assert!(matches!(
            service.lookup("1").await,
            Err(LookupError::Core(Error::Utf8(_)))
        ));
    }
}
