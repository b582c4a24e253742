use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, span, warn, Level};

use crate::chunked_reader::ChunkedReader;
use crate::error::StoreError;
use crate::filelister;
use crate::lazy_seeker::LazySeeker;

/// Metadata of a stored object, as known when it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl ObjectInfo {
    pub fn name(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn is_dir(&self) -> bool {
        false
    }
}

/// An opened object: lazily seekable contents plus the metadata they came with.
pub struct ObjectFile<R> {
    seeker: Option<LazySeeker<R>>,
    info: ObjectInfo,
}

impl<R: Read> ObjectFile<R> {
    pub fn new(reader: R, info: ObjectInfo) -> Self {
        ObjectFile {
            seeker: Some(LazySeeker::new(reader, info.size)),
            info,
        }
    }

    pub fn stat(&self) -> &ObjectInfo {
        &self.info
    }

    /// Objects are leaves, there is never anything to list.
    pub fn read_dir(&self) -> Vec<ObjectInfo> {
        Vec::new()
    }

    pub fn is_materialized(&self) -> bool {
        self.seeker
            .as_ref()
            .is_some_and(|s| s.is_materialized())
    }

    pub fn materialize(&mut self) -> io::Result<()> {
        self.seeker()?.materialize()
    }

    pub fn is_closed(&self) -> bool {
        self.seeker.is_none()
    }

    /// Drops the underlying stream. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.seeker.take().is_some() {
            debug!("Closed {}", self.info.key);
        }
    }

    fn seeker(&mut self) -> io::Result<&mut LazySeeker<R>> {
        self.seeker.as_mut().ok_or_else(|| {
            io::Error::new(
                ErrorKind::NotConnected,
                format!("{} is already closed", self.info.key),
            )
        })
    }
}

impl<R: Read> Read for ObjectFile<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.seeker()?.read(buf)
    }
}

impl<R: Read> Seek for ObjectFile<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeker()?.seek(pos)
    }
}

pub trait ObjectStore {
    type Reader: Read;

    fn open(&self, name: &str) -> Result<ObjectFile<Self::Reader>, StoreError>;

    fn list(&self) -> Result<Vec<String>, StoreError>;
}

/// Turns a caller supplied name into a slash separated object key.
///
/// The store root itself and names escaping it are refused.
pub fn normalize_key(name: &str) -> Result<String, StoreError> {
    let unified = name.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(StoreError::PermissionDenied(name.to_string())),
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        return Err(StoreError::PermissionDenied(name.to_string()));
    }

    Ok(parts.join("/"))
}

fn key_of(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    Some(parts?.join("/"))
}

fn map_open_err(err: io::Error, key: &str) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
        ErrorKind::PermissionDenied => StoreError::PermissionDenied(key.to_string()),
        _ => StoreError::Io(err),
    }
}

/// Object store backed by a local directory.
///
/// Bodies are handed out in `chunk_size` pieces so callers see the same short
/// reads a network body would give them.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    chunk_size: usize,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>, chunk_size: usize) -> Self {
        DirStore {
            root: root.into(),
            chunk_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for DirStore {
    type Reader = ChunkedReader<File>;

    fn open(&self, name: &str) -> Result<ObjectFile<Self::Reader>, StoreError> {
        let o_span = span!(Level::DEBUG, "open", key = name);
        let _g = o_span.enter();

        let key = normalize_key(name).inspect_err(|e| warn!("Refusing {:?}: {}", name, e))?;
        let path = self.root.join(&key);

        let file = File::open(&path).map_err(|e| map_open_err(e, &key))?;
        let meta = file.metadata()?;
        if meta.is_dir() {
            return Err(StoreError::NotFound(key));
        }

        let info = ObjectInfo {
            key,
            size: meta.len(),
            modified: meta.modified().ok(),
        };
        info!("Opened {} ({} bytes)", info.key, info.size);

        Ok(ObjectFile::new(
            ChunkedReader::new(file, self.chunk_size),
            info,
        ))
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let keys = filelister::list_files(&self.root, |p| key_of(&self.root, p))?;
        Ok(keys.into_iter().flatten().collect())
    }
}
