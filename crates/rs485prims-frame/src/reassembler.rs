use tracing::trace;

use crate::codec::{decode_frame, Frame, FRAME_OVERHEAD, HEADER_SIZE, MAX_FRAME_SIZE, START_MARKER};
use crate::error::{FrameError, Result};

/// Hard limit on buffered bytes without a completed frame.
pub const MAX_BUFFERED: usize = MAX_FRAME_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding bytes until a start marker shows up.
    Searching,
    /// Collecting a frame. `expected` is known once the length byte arrives.
    Accumulating { expected: Option<usize> },
}

/// Rebuilds frames from an arbitrarily chunked byte stream.
///
/// State depends only on buffered content, so feeding a stream one byte at a
/// time or in bursts yields the same frames. A frame that fails validation is
/// dropped whole and scanning resumes after it.
#[derive(Debug)]
pub struct Reassembler {
    buf: Vec<u8>,
    state: State,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_FRAME_SIZE),
            state: State::Searching,
        }
    }

    /// Feed a chunk of received bytes.
    ///
    /// Returns one entry per completed frame candidate: the decoded frame, or
    /// the reason it was discarded.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Result<Frame>> {
        data.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    /// Feed a single byte.
    pub fn push(&mut self, byte: u8) -> Option<Result<Frame>> {
        match self.state {
            State::Searching => {
                if byte == START_MARKER {
                    self.buf.push(byte);
                    self.state = State::Accumulating { expected: None };
                } else {
                    trace!(byte, "discarding byte outside frame");
                }
                None
            }
            State::Accumulating { expected } => {
                self.buf.push(byte);

                if self.buf.len() > MAX_BUFFERED {
                    let len = self.buf.len();
                    self.reset();
                    return Some(Err(FrameError::Overflow { len }));
                }

                let expected = match expected {
                    Some(expected) => expected,
                    None if self.buf.len() == HEADER_SIZE => {
                        let expected = FRAME_OVERHEAD + self.buf[HEADER_SIZE - 1] as usize;
                        self.state = State::Accumulating {
                            expected: Some(expected),
                        };
                        expected
                    }
                    None => return None,
                };

                if self.buf.len() < expected {
                    return None;
                }

                let result = decode_frame(&self.buf);
                self.reset();
                Some(result)
            }
        }
    }

    /// Drop any partial frame and go back to searching for a start marker.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = State::Searching;
    }

    /// Number of bytes held for the frame in progress.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// True while no frame is in progress.
    pub fn is_searching(&self) -> bool {
        self.state == State::Searching
    }
}
