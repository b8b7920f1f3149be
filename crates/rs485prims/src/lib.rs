//! Framed request/response messaging with RS485 I/O controllers.
//!
//! rs485prims talks to a small family of controller boards (analog input,
//! digital input, digital output) sharing one half-duplex RS485 bus with a
//! host. Frames are addressed and CRC-16 protected; the host issues one
//! request at a time and matches each answer to the peer that sent it.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial port and in-memory byte streams
//! - [`frame`]: frame codec, checksum and stream reassembly
//! - [`session`]: request/response sessions, typed commands and health polling
//!   (behind the `session` feature)
//!
//! ```no_run
//! # #[cfg(feature = "session")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rs485prims::frame::DIGITAL_OUTPUT;
//! use rs485prims::session::{connect, DigitalChannels};
//!
//! let session = connect("/dev/ttyUSB0", 115_200)?;
//! if session.ping(DIGITAL_OUTPUT)? {
//!     session.write_digital_outputs(DIGITAL_OUTPUT, &DigitalChannels::from_active(&[0, 5]))?;
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "session"))]
//! # fn main() {}
//! ```

/// Re-export transport types.
pub mod transport {
    pub use rs485prims_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rs485prims_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use rs485prims_session::*;
}
