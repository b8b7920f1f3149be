//! In-memory duplex link.
//!
//! Behaves like a serial port with a read timeout: reads block until bytes
//! arrive or the timeout elapses (`ErrorKind::TimedOut`). Clones share the
//! same pipes, like `try_clone` on a real port.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::serial::DEFAULT_READ_POLL_INTERVAL;

#[derive(Default)]
struct Pipe {
    bytes: Mutex<VecDeque<u8>>,
    ready: Condvar,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One end of an in-memory duplex byte link.
#[derive(Clone)]
pub struct MemoryLink {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    timeout: Duration,
}

impl MemoryLink {
    /// Create two connected ends. Bytes written to one are read from the other.
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Pipe::default());
        let b = Arc::new(Pipe::default());
        (
            Self {
                rx: Arc::clone(&a),
                tx: Arc::clone(&b),
                timeout: DEFAULT_READ_POLL_INTERVAL,
            },
            Self {
                rx: b,
                tx: a,
                timeout: DEFAULT_READ_POLL_INTERVAL,
            },
        )
    }

    /// Set how long a read waits for data.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Discard unread bytes.
    pub fn clear_input(&self) {
        self.rx.lock().clear();
    }

    /// Bytes waiting to be read on this end.
    pub fn pending(&self) -> usize {
        self.rx.lock().len()
    }
}

impl Read for MemoryLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now() + self.timeout;
        let mut bytes = self.rx.lock();
        while bytes.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            bytes = self
                .rx
                .ready
                .wait_timeout(bytes, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }

        let n = buf.len().min(bytes.len());
        for (slot, byte) in buf.iter_mut().zip(bytes.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tx.lock().extend(buf);
        self.tx.ready.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
