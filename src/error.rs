use std::{net::SocketAddr, path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

use crate::index::Checkpoint;

/// Errors raised by the line index core.
#[derive(Debug, Error)]
pub enum Error {
    /// The byte source could not be opened or failed mid-scan
    #[error("could not read {name}: {source}")]
    SourceUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A scan ran out of lines before reaching a line the index claims exists. The source no longer
    /// matches the snapshot the index was built from.
    #[error("index inconsistency: line {line} not reached from checkpoint {checkpoint} (scanned {scanned} lines)")]
    IndexInconsistency {
        line: usize,
        checkpoint: Checkpoint,
        scanned: usize,
    },

    /// A terminated line did not end with the configured line ending
    #[error("line {line} at byte {byte} does not end with the configured line ending")]
    LineEndingMismatch { line: usize, byte: u64 },

    /// The sampling distance must be at least one byte
    #[error("sample distance must be at least 1 byte")]
    InvalidSampleDistance,

    /// On request for a line past the end of the indexed source
    #[error("line {line} is out of bounds ({total_lines} lines)")]
    OutOfBounds { line: usize, total_lines: usize },

    #[error("line is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

impl Error {
    /// Returns `true` if the error means the served source can't be trusted anymore and the
    /// process should stop serving.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable { .. }
                | Error::IndexInconsistency { .. }
                | Error::LineEndingMismatch { .. }
        )
    }
}

/// Errors of the request boundary. Invalid input is rejected here and never reaches the resolver.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("'{0}' is not a valid line number")]
    InvalidLineNumber(String),

    #[error("line {requested} is out of range ({total_lines} lines)")]
    LineOutOfRange {
        requested: String,
        total_lines: usize,
    },

    #[error(transparent)]
    Core(#[from] Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error(transparent)]
    Index(#[from] Error),
}

/// Errors ending the server loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("fatal error while serving: {0}")]
    Fatal(#[from] Error),
}
