use std::io::{self, Read};

/// Caps every `read` at `chunk_size` bytes, the way a network body hands out
/// whatever has arrived so far. A `chunk_size` of 0 disables the cap.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(inner: R, chunk_size: usize) -> Self {
        ChunkedReader { inner, chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let l = match self.chunk_size {
            0 => buf.len(),
            c => c.min(buf.len()),
        };
        self.inner.read(&mut buf[..l])
    }
}
