use super::report::Position;
use std::collections::VecDeque;
use std::io::{self, BufRead, Read};

/// Byte reader that remembers where lines start, so a tokenizer's byte
/// offset can be turned into a line and column.
///
/// Only line starts at or after the last [`forget_before`](Self::forget_before)
/// mark are retained.
pub(crate) struct LineTrackingReader<R> {
    inner: R,
    consumed: usize,
    line_starts: VecDeque<usize>,
    forgotten_lines: usize,
    forgotten_start: usize,
}

impl<R: BufRead> LineTrackingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            line_starts: VecDeque::new(),
            forgotten_lines: 0,
            forgotten_start: 0,
        }
    }

    /// Position of the byte at `offset`. Columns count bytes from 1.
    pub(crate) fn locate(&self, offset: usize) -> Position {
        let known = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = match known {
            0 => self.forgotten_start,
            n => self.line_starts[n - 1],
        };
        Position {
            line: self.forgotten_lines + known + 1,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Drops line bookkeeping for everything before `offset`; later calls to
    /// [`locate`](Self::locate) must not ask about earlier bytes.
    pub(crate) fn forget_before(&mut self, offset: usize) {
        let stale = self.line_starts.partition_point(|&start| start <= offset);
        if stale == 0 {
            return;
        }
        self.forgotten_start = self.line_starts[stale - 1];
        self.forgotten_lines += stale;
        self.line_starts.drain(..stale);
    }
}

impl<R: BufRead> Read for LineTrackingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = {
            let available = self.fill_buf()?;
            let n = available.len().min(out.len());
            out[..n].copy_from_slice(&available[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for LineTrackingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let Ok(buf) = self.inner.fill_buf() {
            for (i, byte) in buf.iter().take(amt).enumerate() {
                if *byte == b'\n' {
                    self.line_starts.push_back(self.consumed + i + 1);
                }
            }
        }
        self.consumed += amt;
        self.inner.consume(amt);
    }
}
