//!Serve single lines of large, immutable text files by their line number, using a sparse
//!in-memory index.
//!
//! The index stores a checkpoint (line number and byte offset) every `sample_distance` bytes
//! instead of the offset of each line. Looking up a line seeks to the nearest checkpoint at or
//! before it and reads forward, so a lookup never reads much more than `sample_distance` bytes
//! while the index stays small even for files far larger than memory.
//!
//! ```no_run
//! use indexed_line_server::{IndexConfig, Indexable, LineService};
//!
//! #[async_std::main]
//! async fn main() -> indexed_line_server::Result<()> {
//!     let service = LineService::open("data.txt", &IndexConfig::default()).await?;
//!     println!("{} has {} lines", service.filename(), service.total_lines());
//!     println!("{}", service.resolve(30).await?);
//!     Ok(())
//! }
//! ```

/// Configuration of the index and the server
pub mod config;
pub mod error;
/// The sparse line index
pub mod index;
/// Resolving lines using the index
pub mod resolver;
/// Transport independent request handling
pub mod route;
/// The HTTP frontend
pub mod server;
/// The object handed to the request layer
pub mod service;
/// Byte sources the index can be built on
pub mod source;
/// Splitting sources into lines
pub mod stream;

pub use config::{IndexConfig, ServerConfig};
pub use index::{Checkpoint, Index};
pub use resolver::LineResolver;
pub use service::LineService;
pub use source::{ByteSource, FileSource, MemSource};
pub use stream::LineEnding;

use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, error::Error>;

pub trait Indexable {
    /// Returns a reference to the index.
    fn get_index(&self) -> &Index;

    /// Returns the total amount of lines in the indexed data.
    #[inline]
    fn total_lines(&self) -> usize {
        self.get_index().total_lines()
    }

    /// Returns the approximate memory used by the index
    #[inline]
    fn get_index_byte_len(&self) -> usize {
        self.get_index().len_bytes()
    }
}

/// A trait defining behavior for reading certain lines directly from indexed data.
#[async_trait]
pub trait ReadByLine: Indexable + Sync {
    /// Reads the given line into `buf`, omitting its terminator. Returns the amount of bytes read.
    async fn read_line_raw(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize>;

    /// Reads the given line
    async fn read_line(&self, line: usize) -> Result<String> {
        let mut read_data = Vec::new();
        self.read_line_raw(line, &mut read_data).await?;
        Ok(String::from_utf8(read_data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LookupError,
        route::{self, Route},
    };
    use axum::http::StatusCode;
    use std::io::{prelude::*, BufReader};

    const FIVE_LINES: &str = "a\nbb\nccc\ndddd\neeeee\n";

    async fn service(data: &str, sample_distance: u64) -> LineService<MemSource<String>> {
        let config = IndexConfig::new(sample_distance, LineEnding::Lf);
        LineService::preprocess(MemSource::new("five.txt", data.to_string()), &config)
            .await
            .unwrap()
    }

    /// Every line read through the index must match a plain top to bottom read.
    async fn test_against_naive<L: ReadByLine>(reader: &L, data: &str) {
        let naive: Vec<String> = BufReader::new(data.as_bytes())
            .lines()
            .map(|l| l.unwrap())
            .collect();

        assert_eq!(reader.total_lines(), naive.len());
        for (line, original) in naive.iter().enumerate() {
            assert_eq!(*original, reader.read_line(line).await.unwrap());
        }
    }

    #[async_std::test]
    async fn test_round_trip() {
        let data = "first\n\nthird line\n  indented\nunicode äöü 日本語\nlast";
        for sample_distance in 1..=data.len() as u64 + 1 {
            test_against_naive(&service(data, sample_distance).await, data).await;
        }
    }

    #[async_std::test]
    async fn test_scenario_single_checkpoint() {
        let service = service(FIVE_LINES, 1_000_000).await;
        assert_eq!(service.get_index().checkpoints(), &[Checkpoint::ORIGIN]);
        assert_eq!(service.total_lines(), 5);
        assert_eq!(service.resolve(2).await.unwrap(), "ccc");
    }

    #[async_std::test]
    async fn test_scenario_dense_checkpoints() {
        let sparse = service(FIVE_LINES, 1_000_000).await;
        let dense = service(FIVE_LINES, 1).await;
        assert_eq!(dense.resolve(4).await.unwrap(), "eeeee");
        assert_eq!(
            dense.resolve(4).await.unwrap(),
            sparse.resolve(4).await.unwrap()
        );
    }

    #[async_std::test]
    async fn test_scenario_out_of_range() {
        let service = service(FIVE_LINES, 1).await;
        assert!(service.lookup("4").await.is_ok());
        assert!(matches!(
            service.lookup("5").await,
            Err(LookupError::LineOutOfRange { total_lines: 5, .. })
        ));

        let response = route::respond(&service, &Route::Line("5".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[async_std::test]
    async fn test_scenario_invalid_input() {
        let service = service(FIVE_LINES, 1).await;
        assert!(matches!(
            service.lookup("abc").await,
            Err(LookupError::InvalidLineNumber(_))
        ));

        let response = route::respond(&service, &Route::Line("abc".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[async_std::test]
    async fn test_idempotent_reads() {
        let service = service(FIVE_LINES, 3).await;
        let first: Vec<_> = read_all_lines(&service).await;
        let second: Vec<_> = read_all_lines(&service).await;
        assert_eq!(first, second);
    }

    async fn read_all_lines(service: &LineService<MemSource<String>>) -> Vec<String> {
        let mut out = Vec::new();
        for line in (0..service.total_lines()).rev() {
            out.push(service.resolve(line).await.unwrap());
        }
        out
    }
}
