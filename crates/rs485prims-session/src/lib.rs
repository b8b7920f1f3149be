//! Request/response sessions with RS485 I/O controllers.
//!
//! This is the "just works" layer. Open a port, then ping, read and drive
//! the analog input, digital input and digital output boards by address.
//! A background thread reassembles incoming frames and hands each response
//! to the caller waiting on that peer.

pub mod commands;
pub mod connector;
pub mod error;
pub mod monitor;
pub mod payload;
pub mod session;
pub mod slots;

pub use connector::{connect, connect_with_config};
pub use error::{Result, SessionError};
pub use monitor::{HealthEvent, HealthMonitor, HealthSink, MonitorConfig};
pub use payload::{
    decode_analog, encode_analog, AnalogKind, AnalogReading, AnalogSnapshot, DeviceStatus,
    DeviceVersion, DigitalChannels, ErrorCode, ErrorReport, Heartbeat, DIGITAL_CHANNELS,
};
pub use session::{Session, SessionConfig, SessionStats, FRAME_LOG_TARGET};
