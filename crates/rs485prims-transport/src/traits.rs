use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::Result;
use crate::memory::MemoryLink;

/// A connected bus stream: serial port or in-memory link.
///
/// This is the fundamental I/O type returned by transport operations.
/// Reads wait at most the configured timeout and then fail with
/// `ErrorKind::TimedOut`, so a reader thread can poll a stop flag.
pub struct BusStream {
    inner: BusStreamInner,
}

enum BusStreamInner {
    Serial(Box<dyn SerialPort>),
    Memory(MemoryLink),
}

impl Read for BusStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.read(buf),
            BusStreamInner::Memory(link) => link.read(buf),
        }
    }
}

impl Write for BusStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.write(buf),
            BusStreamInner::Memory(link) => link.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.flush(),
            BusStreamInner::Memory(link) => link.flush(),
        }
    }
}

impl BusStream {
    /// Wrap an opened serial port.
    pub(crate) fn from_serial(port: Box<dyn SerialPort>) -> Self {
        Self {
            inner: BusStreamInner::Serial(port),
        }
    }

    /// Set the read/write timeout on the underlying stream.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            BusStreamInner::Serial(port) => port.set_timeout(timeout).map_err(Into::into),
            BusStreamInner::Memory(link) => {
                link.set_timeout(timeout);
                Ok(())
            }
        }
    }

    /// Discard bytes received but not yet read.
    pub fn clear_input(&self) -> Result<()> {
        match &self.inner {
            BusStreamInner::Serial(port) => port.clear(ClearBuffer::Input).map_err(Into::into),
            BusStreamInner::Memory(link) => {
                link.clear_input();
                Ok(())
            }
        }
    }

    /// Try to clone this stream (a second handle to the same port).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            BusStreamInner::Serial(port) => Ok(Self::from_serial(port.try_clone()?)),
            BusStreamInner::Memory(link) => Ok(Self::from(link.clone())),
        }
    }

    /// Port name, if the stream is backed by a named device.
    pub fn name(&self) -> Option<String> {
        match &self.inner {
            BusStreamInner::Serial(port) => port.name(),
            BusStreamInner::Memory(_) => None,
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            BusStreamInner::Serial(_) => "serial",
            BusStreamInner::Memory(_) => "memory",
        }
    }
}

impl From<MemoryLink> for BusStream {
    fn from(link: MemoryLink) -> Self {
        Self {
            inner: BusStreamInner::Memory(link),
        }
    }
}

impl std::fmt::Debug for BusStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            BusStreamInner::Serial(port) => f
                .debug_struct("BusStream")
                .field("type", &"serial")
                .field("port", &port.name())
                .finish(),
            BusStreamInner::Memory(_) => f
                .debug_struct("BusStream")
                .field("type", &"memory")
                .finish(),
        }
    }
}
