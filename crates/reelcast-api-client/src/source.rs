//! Byte sources that parts are read from.
//!
//! Parts are read on demand, one range at a time, so an upload never holds
//! more than the in-flight parts in memory.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use reelcast_core::Part;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[async_trait]
pub trait PartSource: Send + Sync {
    /// Total length of the source in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly the bytes of `part`.
    async fn read_part(&self, part: &Part) -> std::io::Result<Bytes>;
}

/// A file on disk, opened per read so concurrent parts never share a cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            path,
            len: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PartSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    async fn read_part(&self, part: &Part) -> std::io::Result<Bytes> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(part.start)).await?;

        let mut buffer = vec![0u8; part.len() as usize];
        file.read_exact(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }
}

/// An in-memory buffer; slicing is zero-copy.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl PartSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_part(&self, part: &Part) -> std::io::Result<Bytes> {
        if part.end > self.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("part {} extends past end of source", part.part_number),
            ));
        }
        Ok(self.data.slice(part.start as usize..part.end as usize))
    }
}
