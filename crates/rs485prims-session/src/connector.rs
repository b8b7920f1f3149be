use rs485prims_transport::{open, SerialConfig};

use crate::error::Result;
use crate::session::{Session, SessionConfig};

/// Open `port` at `baud_rate` with default session settings.
pub fn connect(port: &str, baud_rate: u32) -> Result<Session> {
    let config = SessionConfig {
        serial: SerialConfig::with_baud_rate(baud_rate),
        ..SessionConfig::default()
    };
    connect_with_config(port, config)
}

/// Open `port` with explicit configuration.
pub fn connect_with_config(port: &str, config: SessionConfig) -> Result<Session> {
    let stream = open(port, &config.serial)?;
    Session::from_stream(stream, config)
}
