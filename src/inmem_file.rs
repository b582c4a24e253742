use std::io::{self, Read, Seek, SeekFrom};

/// Owned, fully buffered random-access stream.
///
/// Seeking past the end is allowed; reads from there return 0 bytes.
#[derive(Debug, Default)]
pub struct InMemFile {
    pos: u64,
    buf: Vec<u8>,
}

impl InMemFile {
    pub fn new(buf: Vec<u8>) -> Self {
        InMemFile { pos: 0, buf }
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn offset_from(base: u64, delta: i64, whence: &'static str) -> io::Result<u64> {
        base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{whence}: invalid seek to a negative or overflowing position"),
            )
        })
    }
}

impl Seek for InMemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(delta) => Self::offset_from(self.len(), delta, "SeekFrom::End")?,
            SeekFrom::Current(delta) => {
                Self::offset_from(self.pos, delta, "SeekFrom::Current")?
            }
        };
        Ok(self.pos)
    }
}

impl Read for InMemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len() {
            return Ok(0);
        }

        let start = self.pos as usize;
        let l = (self.buf.len() - start).min(buf.len());
        buf[..l].copy_from_slice(&self.buf[start..start + l]);
        self.pos += l as u64;
        Ok(l)
    }
}
