//! Typed controller commands.
//!
//! Each command is a `send_and_wait` plus a response-code check plus payload
//! decoding. Silence, a wrong response code, an `ERROR_RESPONSE` or an
//! undecodable payload all come back as an absent result; only misuse and
//! I/O failures are errors.

use std::time::Duration;

use rs485prims_frame::{address_name, command, command_name, response_code, Frame};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::payload::{
    decode_analog, AnalogKind, AnalogReading, AnalogSnapshot, DeviceStatus, DeviceVersion,
    DigitalChannels, ErrorReport, Heartbeat,
};
use crate::session::Session;

impl Session {
    /// Send `request` and return the response only if it carries the paired response code.
    pub fn request(
        &self,
        destination: u8,
        request: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Option<Frame>> {
        let expected = response_code(request);
        let frame = match self.send_and_wait(destination, request, payload, timeout) {
            Ok(frame) => frame,
            Err(SessionError::Timeout(_)) => return Ok(None),
            Err(err) => return Err(err),
        };

        if Some(frame.command) == expected {
            return Ok(Some(frame));
        }

        if frame.command == command::ERROR_RESPONSE {
            let report = ErrorReport::from_bytes(&frame.payload);
            warn!(
                destination,
                peer = address_name(destination),
                request = command_name(request),
                ?report,
                "peer rejected request"
            );
        } else {
            debug!(
                destination,
                request = command_name(request),
                response = command_name(frame.command),
                "unexpected response code"
            );
        }
        Ok(None)
    }

    fn request_default(&self, destination: u8, request: u8) -> Result<Option<Frame>> {
        self.request(destination, request, &[], self.config().default_timeout)
    }

    /// True if the peer answered with `PING_RESPONSE`.
    pub fn ping(&self, address: u8) -> Result<bool> {
        Ok(self.request_default(address, command::PING)?.is_some())
    }

    pub fn get_version(&self, address: u8) -> Result<Option<DeviceVersion>> {
        let frame = self.request_default(address, command::GET_VERSION)?;
        decoded(address, "version", frame, DeviceVersion::from_bytes)
    }

    pub fn get_status(&self, address: u8) -> Result<Option<DeviceStatus>> {
        let frame = self.request_default(address, command::GET_STATUS)?;
        decoded(address, "status", frame, DeviceStatus::from_bytes)
    }

    /// Cheap liveness check: peer id and health percentage.
    pub fn heartbeat(&self, address: u8) -> Result<Option<Heartbeat>> {
        let frame = self.request_default(address, command::HEARTBEAT)?;
        decoded(address, "heartbeat", frame, Heartbeat::from_bytes)
    }

    pub fn read_digital_inputs(&self, address: u8) -> Result<Option<DigitalChannels>> {
        let frame = self.request_default(address, command::READ_DI)?;
        decoded(address, "inputs", frame, DigitalChannels::from_bytes)
    }

    pub fn read_digital_outputs(&self, address: u8) -> Result<Option<DigitalChannels>> {
        let frame = self.request_default(address, command::READ_DO)?;
        decoded(address, "outputs", frame, DigitalChannels::from_bytes)
    }

    /// Drive all outputs to `outputs`. True once the peer acknowledges.
    pub fn write_digital_outputs(&self, address: u8, outputs: &DigitalChannels) -> Result<bool> {
        let frame = self.request(
            address,
            command::WRITE_DO,
            outputs.as_bytes(),
            self.config().write_timeout,
        )?;
        Ok(frame.is_some())
    }

    /// Read one analog group. Missing trailing channels are simply absent from the list.
    pub fn read_analog_channels(
        &self,
        address: u8,
        kind: AnalogKind,
    ) -> Result<Option<Vec<AnalogReading>>> {
        let frame = self.request_default(address, kind.request_code())?;
        Ok(frame.map(|f| decode_analog(&f.payload, kind.channels())))
    }

    /// Read every analog group in one exchange.
    pub fn read_all_analog(&self, address: u8) -> Result<Option<AnalogSnapshot>> {
        let frame = self.request_default(address, command::READ_ALL_ANALOG)?;
        decoded(address, "analog", frame, AnalogSnapshot::from_bytes)
    }
}

fn decoded<T>(
    address: u8,
    what: &str,
    frame: Option<Frame>,
    decode: fn(&[u8]) -> Option<T>,
) -> Result<Option<T>> {
    let Some(frame) = frame else {
        return Ok(None);
    };
    let value = decode(&frame.payload);
    if value.is_none() {
        debug!(address, what, "short payload");
    }
    Ok(value)
}
