use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, error, span, Level};

use crate::error::LazySeekError;
use crate::inmem_file::InMemFile;

// Upper bound for trusting the declared size when preallocating the drain buffer.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Where a caller stands before the stream has been materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimPosition {
    AtStart,
    AtLogicalEnd,
}

/// Observable state of a [`LazySeeker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekerState {
    AtStart,
    AtLogicalEnd,
    Materialized,
    Poisoned,
}

enum Source<R> {
    Raw { reader: R, position: ShimPosition },
    Materialized(InMemFile),
    Poisoned,
}

/// Turns a one-shot sequential reader of known length into a `Read + Seek`.
///
/// The raw reader is passed through untouched as long as callers only read
/// forward, rewind to the start before reading, or probe the length with
/// `SeekFrom::End(0)`. Any other seek, or a raw read that comes back short of
/// the declared size, drains the raw reader into memory once and serves every
/// later call from that copy.
///
/// `SeekFrom::End(0)` answers `declared_size - 1` without touching the raw
/// reader. Callers that expect the total length from that probe must add one.
///
/// Note that `Seek::stream_position` is implemented as `SeekFrom::Current(0)`
/// and therefore materializes the stream.
pub struct LazySeeker<R> {
    source: Source<R>,
    declared_size: u64,
}

impl<R: Read> LazySeeker<R> {
    pub fn new(reader: R, declared_size: u64) -> Self {
        LazySeeker {
            source: Source::Raw {
                reader,
                position: ShimPosition::AtStart,
            },
            declared_size,
        }
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.source, Source::Materialized(_))
    }

    pub fn state(&self) -> SeekerState {
        match &self.source {
            Source::Raw {
                position: ShimPosition::AtStart,
                ..
            } => SeekerState::AtStart,
            Source::Raw {
                position: ShimPosition::AtLogicalEnd,
                ..
            } => SeekerState::AtLogicalEnd,
            Source::Materialized(_) => SeekerState::Materialized,
            Source::Poisoned => SeekerState::Poisoned,
        }
    }

    /// Drains the raw reader now instead of waiting for a seek to require it.
    ///
    /// The logical position is kept: a stream parked at its logical end stays
    /// at the end of the buffer. Afterwards `SeekFrom::End(0)` reports the real
    /// length.
    pub fn materialize(&mut self) -> io::Result<()> {
        let at_end = self.state() == SeekerState::AtLogicalEnd;
        let file = self.materialized(&[])?;
        if at_end {
            file.seek(SeekFrom::End(0))?;
        }
        Ok(())
    }

    /// Returns the buffered bytes if the stream has been materialized.
    pub fn into_materialized(self) -> Option<Vec<u8>> {
        match self.source {
            Source::Materialized(file) => Some(file.into_inner()),
            _ => None,
        }
    }

    /// Returns the in-memory copy, draining the raw reader first if needed.
    ///
    /// `seed` holds bytes already pulled off the raw reader; they are placed in
    /// front of whatever is left in it.
    fn materialized(&mut self, seed: &[u8]) -> io::Result<&mut InMemFile> {
        if let Source::Raw { reader, .. } = &mut self.source {
            let u_span = span!(Level::DEBUG, "materialize", seeded = seed.len());
            let _g = u_span.enter();

            match drain(reader, seed, self.declared_size) {
                Ok(bytes) => {
                    debug!(
                        "Materialized {} bytes (declared {})",
                        bytes.len(),
                        self.declared_size
                    );
                    self.source = Source::Materialized(InMemFile::new(bytes));
                }
                Err(e) => {
                    error!("Draining raw stream failed: {}", e);
                    self.source = Source::Poisoned;
                    return Err(e.into());
                }
            }
        }

        match &mut self.source {
            Source::Materialized(file) => Ok(file),
            _ => Err(LazySeekError::Poisoned.into()),
        }
    }
}

fn drain<R: Read>(
    reader: &mut R,
    seed: &[u8],
    declared_size: u64,
) -> Result<Vec<u8>, LazySeekError> {
    let capacity = usize::try_from(declared_size)
        .unwrap_or(MAX_PREALLOC)
        .clamp(seed.len(), MAX_PREALLOC.max(seed.len()));

    let mut bytes = Vec::with_capacity(capacity);
    bytes.extend_from_slice(seed);

    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LazySeekError::Drain {
            seeded: seed.len(),
            source,
        })?;

    Ok(bytes)
}

impl<R: Read> Read for LazySeeker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let reader = match &mut self.source {
            Source::Materialized(file) => return file.read(buf),
            Source::Poisoned => return Err(LazySeekError::Poisoned.into()),
            Source::Raw {
                position: ShimPosition::AtLogicalEnd,
                ..
            } => return Ok(0),
            Source::Raw { reader, .. } => reader,
        };

        let n = reader.read(buf)?;

        // A short read means the raw reader hands out data in pieces. Take the
        // copy now so later seeks stay possible; this only happens once.
        if n > 0 && (n as u64) < self.declared_size {
            debug!(
                "Short read of {} bytes (declared {}), materializing",
                n, self.declared_size
            );
            self.materialized(&buf[..n])?
                .seek(SeekFrom::Start(n as u64))?;
        }

        Ok(n)
    }
}

impl<R: Read> Seek for LazySeeker<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if let Source::Raw { position, .. } = &mut self.source {
            match pos {
                SeekFrom::Start(0) => {
                    *position = ShimPosition::AtStart;
                    return Ok(0);
                }
                SeekFrom::End(0) => {
                    *position = ShimPosition::AtLogicalEnd;
                    return Ok(self.declared_size.saturating_sub(1));
                }
                _ => debug!("{:?} needs random access, materializing", pos),
            }
        }

        self.materialized(&[])?.seek(pos)
    }
}

impl<R> fmt::Debug for LazySeeker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.source {
            Source::Raw { position, .. } => format!("Raw({position:?})"),
            Source::Materialized(file) => {
                format!("Materialized(pos={}, len={})", file.position(), file.len())
            }
            Source::Poisoned => String::from("Poisoned"),
        };

        f.debug_struct("LazySeeker")
            .field("source", &state)
            .field("declared_size", &self.declared_size)
            .finish()
    }
}
