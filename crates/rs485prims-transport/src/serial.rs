use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::BusStream;

/// Bit rate used by the controller firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a read waits before giving the caller a chance to re-check state.
pub const DEFAULT_READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Serial line settings.
///
/// Framing is fixed at 8 data bits, no parity, 1 stop bit, no flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Read timeout; bounds how long the receive loop blocks per read.
    pub read_poll_interval: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_poll_interval: DEFAULT_READ_POLL_INTERVAL,
        }
    }
}

impl SerialConfig {
    /// Default settings at a different bit rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

/// Open a serial port (`COM3`, `/dev/ttyUSB0`, ...) as a bus stream.
///
/// Stale bytes already sitting in the driver's input buffer are discarded.
pub fn open(port: &str, config: &SerialConfig) -> Result<BusStream> {
    let serial = serialport::new(port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_poll_interval)
        .open()
        .map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })?;

    let stream = BusStream::from_serial(serial);
    if let Err(err) = stream.clear_input() {
        debug!(port, error = %err, "could not clear serial input buffer");
    }

    info!(port, baud = config.baud_rate, "opened serial port");
    Ok(stream)
}
