//! File blob abstraction over byte sources.
//!
//! Ingestion never owns its input: a [`FileBlob`] is borrowed for the
//! duration of one attempt and read exactly once. The trait exposes the three
//! read capabilities the pipeline needs — whole-file text, whole-file bytes,
//! and a byte-range slice for the chunked streaming path.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// An opaque, read-only byte source with a name and a known size.
#[async_trait]
pub trait FileBlob: Send + Sync {
    /// Source filename, used for format sniffing and entry labels.
    fn name(&self) -> &str;

    /// Total size in bytes.
    fn size(&self) -> u64;

    /// Read the entire content as UTF-8 text.
    async fn read_text(&self) -> io::Result<String>;

    /// Read the entire content as bytes.
    async fn read_bytes(&self) -> io::Result<Bytes>;

    /// Read the byte range `start..end`. `end` is clamped to the size.
    async fn slice(&self, start: u64, end: u64) -> io::Result<Bytes>;
}

/// A blob backed by a file on disk, read through `tokio::fs`.
///
/// The size is captured at open time; the file is reopened per read so the
/// blob stays shareable across concurrent tasks.
#[derive(Debug, Clone)]
pub struct PathBlob {
    path: PathBuf,
    name: String,
    size: u64,
}

impl PathBlob {
    /// Open a path, capturing its current size.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path,
            name,
            size: meta.len(),
        })
    }
}

#[async_trait]
impl FileBlob for PathBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_text(&self) -> io::Result<String> {
        fs::read_to_string(&self.path).await
    }

    async fn read_bytes(&self) -> io::Result<Bytes> {
        Ok(Bytes::from(fs::read(&self.path).await?))
    }

    async fn slice(&self, start: u64, end: u64) -> io::Result<Bytes> {
        let end = end.min(self.size);
        if start >= end {
            return Ok(Bytes::new());
        }
        let mut file = fs::File::open(&self.path).await?;
        file.seek(io::SeekFrom::Start(start)).await?;
        let mut buf = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

/// A blob held entirely in memory. Slices are zero-copy.
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    name: String,
    bytes: Bytes,
}

impl MemoryBlob {
    /// Wrap a named byte buffer.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl FileBlob for MemoryBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read_text(&self) -> io::Result<String> {
        String::from_utf8(self.bytes.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn read_bytes(&self) -> io::Result<Bytes> {
        Ok(self.bytes.clone())
    }

    async fn slice(&self, start: u64, end: u64) -> io::Result<Bytes> {
        let end = (end as usize).min(self.bytes.len());
        let start = (start as usize).min(end);
        Ok(self.bytes.slice(start..end))
    }
}
