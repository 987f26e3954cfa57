use std::io::{self, BufRead, ErrorKind, Read};

/// A buffered reader over `data` that fails with `kind` once `fail_at`
/// bytes have been consumed, `failures` times in a row, then carries on.
///
/// Buffers never straddle `fail_at`, so the failure is hit exactly there.
#[derive(Debug)]
pub struct FlakyReader {
    data: Vec<u8>,
    pos: usize,
    fail_at: usize,
    kind: ErrorKind,
    failures: usize,
}

impl FlakyReader {
    pub fn new(data: Vec<u8>, fail_at: usize, kind: ErrorKind, failures: usize) -> Self {
        Self {
            data,
            pos: 0,
            fail_at,
            kind,
            failures,
        }
    }

    /// A reader that fails at `fail_at` on every attempt.
    pub fn broken(data: Vec<u8>, fail_at: usize, kind: ErrorKind) -> Self {
        Self::new(data, fail_at, kind, usize::MAX)
    }
}

impl Read for FlakyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = {
            let available = self.fill_buf()?;
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for FlakyReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.fail_at && self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::from(self.kind));
        }
        let end = if self.pos < self.fail_at {
            self.fail_at.min(self.data.len())
        } else {
            self.data.len()
        };
        Ok(&self.data[self.pos..end])
    }

    fn consume(&mut self, amt: usize) {
        self.pos += amt;
    }
}
