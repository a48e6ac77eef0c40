//! Newline-delimited framing.
//!
//! [`LineFramer`] is a pure buffer: bytes go in as they arrive, complete
//! lines come out in order, and a trailing partial line stays buffered until
//! its delimiter shows up. It never touches I/O.

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Incremental splitter for newline-delimited messages.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
    /// Bytes of `buf` already known not to contain a delimiter.
    scanned: usize,
}

impl LineFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete frame, without its delimiter.
    ///
    /// A `\r` directly before the delimiter is stripped as well.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let Some(pos) = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == DELIMITER)
            .map(|p| p + self.scanned)
        else {
            self.scanned = self.buf.len();
            return None;
        };

        let mut frame: Vec<u8> = self.buf.drain(..=pos).collect();
        self.scanned = 0;

        frame.pop();
        if frame.last() == Some(&b'\r') {
            frame.pop();
        }
        Some(frame)
    }

    /// Number of buffered bytes not yet returned as a frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Takes whatever partial frame is left, emptying the buffer.
    pub fn take_remainder(&mut self) -> Vec<u8> {
        self.scanned = 0;
        std::mem::take(&mut self.buf)
    }
}
