use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_std::{
    fs,
    io::{self, prelude::*, BufRead, BufReader, Cursor},
};
use async_trait::async_trait;

/// Buffer size of readers handed out by `FileSource`
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A seekable, read-only byte source. Every call to `open_at` hands out an independent reader
/// with its own cursor, so concurrent scans never share position state.
#[async_trait]
pub trait ByteSource: Send + Sync {
    type Reader: BufRead + Unpin + Send;

    /// An identifier of the source, used for logging and error messages.
    fn name(&self) -> &str;

    /// Open a new reader positioned at `start`. A `start` past the end yields an empty reader.
    async fn open_at(&self, start: u64) -> io::Result<Self::Reader>;
}

/// A file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> FileSource {
        let path = path.as_ref().to_path_buf();
        let name = path.to_string_lossy().into_owned();
        Self { path, name }
    }
}

#[async_trait]
impl ByteSource for FileSource {
    type Reader = BufReader<fs::File>;

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_at(&self, start: u64) -> io::Result<Self::Reader> {
        let mut file = fs::File::open(async_std::path::Path::new(self.path.as_os_str())).await?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(BufReader::with_capacity(READ_BUFFER_SIZE, file))
    }
}

// little shortcut
pub trait Bytes: AsRef<[u8]> + Send + Sync {}
impl<T: AsRef<[u8]> + Send + Sync> Bytes for T {}

/// A wrapper around Arc<T> to allow using shared data as reader for Cursor<SharedBytes<T>>
#[derive(Debug)]
pub struct SharedBytes<T: Bytes>(Arc<T>);

impl<T: Bytes> Clone for SharedBytes<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Bytes> AsRef<[u8]> for SharedBytes<T> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref().as_ref()
    }
}

/// Data held in memory.
#[derive(Debug)]
pub struct MemSource<T: Bytes> {
    data: SharedBytes<T>,
    name: String,
}

impl<T: Bytes> Clone for MemSource<T> {
    /// Does not clone the data but the Arc reference to it
    #[inline]
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Bytes> MemSource<T> {
    pub fn new<N: Into<String>>(name: N, data: T) -> MemSource<T> {
        Self {
            data: SharedBytes(Arc::new(data)),
            name: name.into(),
        }
    }

    /// Length of the data in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for MemSource<String> {
    #[inline]
    fn from(s: &str) -> Self {
        MemSource::new("<memory>", s.to_owned())
    }
}

impl From<String> for MemSource<String> {
    #[inline]
    fn from(s: String) -> Self {
        MemSource::new("<memory>", s)
    }
}

impl From<Vec<u8>> for MemSource<Vec<u8>> {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        MemSource::new("<memory>", v)
    }
}

#[async_trait]
impl<T: Bytes + 'static> ByteSource for MemSource<T> {
    type Reader = Cursor<SharedBytes<T>>;

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_at(&self, start: u64) -> io::Result<Self::Reader> {
        let mut cursor = Cursor::new(self.data.clone());
        cursor.set_position(start);
        Ok(cursor)
    }
}
