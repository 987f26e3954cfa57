use std::io::{BufRead, ErrorKind};

use crate::error::WireError;

/// A forward-only supply of bytes for [`BinaryCursor`](crate::BinaryCursor).
///
/// Sources never rewind. Offsets reported in errors are counted from the
/// first byte the source handed out, so a windowed slice reports offsets
/// relative to the window start.
///
/// ```text
/// ┌────────────────┬──────────────────────────────────────────┐
/// │ Implementation │ Backing                                  │
/// ├────────────────┼──────────────────────────────────────────┤
/// │ SliceSource    │ in-memory buffer, optionally windowed    │
/// │ ReaderSource   │ any std::io::BufRead (files, sockets...) │
/// └────────────────┴──────────────────────────────────────────┘
/// ```
pub trait ByteSource {
    /// Read a single byte.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] when no byte remains.
    fn read_u8(&mut self) -> Result<u8, WireError>;

    /// Fill `buf` completely.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] when fewer than `buf.len()` bytes remain.
    /// The offset is where the input ran out.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WireError>;

    /// Whether every byte has been consumed.
    ///
    /// # Errors
    ///
    /// Streaming sources may fail while probing for more input.
    fn at_end(&mut self) -> Result<bool, WireError>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;
}

/// In-memory byte source over a borrowed slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// A source over `data[offset..offset + len]`.
    ///
    /// Returns `None` when the window does not fit inside `data`.
    #[must_use]
    pub fn window(data: &'a [u8], offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        data.get(offset..end).map(Self::new)
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_u8(&mut self) -> Result<u8, WireError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(WireError::UnexpectedEof { offset: self.data.len() })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let end = self.pos + buf.len();
        let src = self
            .data
            .get(self.pos..end)
            .ok_or(WireError::UnexpectedEof { offset: self.data.len() })?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn at_end(&mut self) -> Result<bool, WireError> {
        Ok(self.pos >= self.data.len())
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Streaming byte source over any buffered reader.
///
/// Bytes are pulled from the reader's internal buffer on demand, so only
/// the reader's buffer is ever resident. Wrap unbuffered readers in
/// [`std::io::BufReader`] first.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    pos: usize,
}

impl<R: BufRead> ReaderSource<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }

    /// Borrow the reader's buffered bytes, retrying on `Interrupted`.
    fn fill(&mut self) -> Result<&[u8], WireError> {
        loop {
            match self.reader.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(WireError::Io(e)),
            }
        }
        // Already buffered: this call returns without touching the reader.
        self.reader.fill_buf().map_err(WireError::Io)
    }
}

impl<R: BufRead> ByteSource for ReaderSource<R> {
    fn read_u8(&mut self) -> Result<u8, WireError> {
        let offset = self.pos;
        let byte = *self
            .fill()?
            .first()
            .ok_or(WireError::UnexpectedEof { offset })?;
        self.reader.consume(1);
        self.pos += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WireError> {
        let mut filled = 0;
        while filled < buf.len() {
            let offset = self.pos;
            let available = self.fill()?;
            if available.is_empty() {
                return Err(WireError::UnexpectedEof { offset });
            }
            let n = available.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&available[..n]);
            self.reader.consume(n);
            self.pos += n;
            filled += n;
        }
        Ok(())
    }

    fn at_end(&mut self) -> Result<bool, WireError> {
        Ok(self.fill()?.is_empty())
    }

    fn position(&self) -> usize {
        self.pos
    }
}
