//! Configuration of the index and the server.
//!
//! The server is configured via CLI arguments, with environment variables (`LINE_SERVER_*`) as
//! fallback and defaults for everything but the served file.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

use crate::{
    error::{ConfigError, Error},
    stream::LineEnding,
    Result,
};

/// Default minimum distance in bytes between two checkpoints
pub const DEFAULT_SAMPLE_DISTANCE: u64 = 1_000_000;

/// Parameters of an index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Minimum amount of bytes between two checkpoints. Trades memory for lookup latency.
    pub sample_distance: u64,
    pub line_ending: LineEnding,
}

impl IndexConfig {
    pub fn new(sample_distance: u64, line_ending: LineEnding) -> IndexConfig {
        Self {
            sample_distance,
            line_ending,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_distance == 0 {
            return Err(Error::InvalidSampleDistance);
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_DISTANCE, LineEnding::default())
    }
}

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "indexed-line-server",
    about = "Serve lines of a large text file by their line number",
    version
)]
pub struct ServerConfig {
    /// The text file to serve
    pub file: PathBuf,

    /// Address to listen on
    #[arg(long, env = "LINE_SERVER_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Minimum distance in bytes between two index checkpoints
    #[arg(
        long,
        env = "LINE_SERVER_SAMPLE_DISTANCE",
        default_value_t = DEFAULT_SAMPLE_DISTANCE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sample_distance: u64,

    /// Line terminator used by the file
    #[arg(long, env = "LINE_SERVER_LINE_ENDING", value_enum, default_value_t = LineEnding::Lf)]
    pub line_ending: LineEnding,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    #[inline]
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(self.sample_distance, self.line_ending)
    }

    /// Validate configuration.
    ///
    /// Returns `ConfigError` if the file doesn't exist or isn't a regular file, or if the index
    /// parameters are invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.file.exists() {
            return Err(ConfigError::MissingFile(self.file.clone()));
        }

        if !self.file.is_file() {
            return Err(ConfigError::NotAFile(self.file.clone()));
        }

        self.index_config().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_index_config() {
        let config = IndexConfig::default();
        assert_eq!(config.sample_distance, 1_000_000);
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert!(config.validate().is_ok());

        let config = IndexConfig::new(0, LineEnding::Lf);
        assert!(matches!(config.validate(), Err(Error::InvalidSampleDistance)));
    }

    #[test]
    fn test_parse_args() {
        let config = ServerConfig::try_parse_from(["indexed-line-server", "data.txt"]).unwrap();
        assert_eq!(config.file, PathBuf::from("data.txt"));
        assert_eq!(config.sample_distance, DEFAULT_SAMPLE_DISTANCE);
        assert_eq!(config.line_ending, LineEnding::Lf);

        let config = ServerConfig::try_parse_from([
            "indexed-line-server",
            "data.txt",
            "--bind",
            "127.0.0.1:8080",
            "--sample-distance",
            "4096",
            "--line-ending",
            "crlf",
        ])
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.index_config(), IndexConfig::new(4096, LineEnding::CrLf));
    }

    #[test]
    fn test_reject_zero_sample_distance() {
        let res =
            ServerConfig::try_parse_from(["indexed-line-server", "data.txt", "--sample-distance", "0"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_validate() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let config = ServerConfig::try_parse_from([
            OsStr::new("indexed-line-server"),
            file.path().as_os_str(),
        ])
        .unwrap();
        assert!(config.validate().is_ok());

        let config = ServerConfig::try_parse_from([
            OsStr::new("indexed-line-server"),
            dir.path().as_os_str(),
        ])
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NotAFile(_))));

        let config =
            ServerConfig::try_parse_from(["indexed-line-server", "./does/not/exist"]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingFile(_))));
    }
}
