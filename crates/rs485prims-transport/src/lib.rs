//! Serial transport abstraction.
//!
//! Provides a unified byte stream over:
//! - A serial port (USB-RS485 adapter or on-board UART), opened 8N1
//! - An in-memory duplex link, for simulated peers and tests
//!
//! This is the lowest layer of rs485prims. Everything else builds on top of
//! the [`BusStream`] type provided here.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryLink;
pub use serial::{open, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_POLL_INTERVAL};
pub use traits::BusStream;
