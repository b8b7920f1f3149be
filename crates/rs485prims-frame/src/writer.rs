use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
///
/// Every frame is stamped with the writer's own source address.
pub struct FrameWriter<T> {
    inner: T,
    source: u8,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer that sends as `source`.
    pub fn new(inner: T, source: u8) -> Self {
        Self {
            inner,
            source,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Encode and send a command to `destination`.
    pub fn send(&mut self, destination: u8, command: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(destination, self.source, command, payload, &mut self.buf)?;
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}
