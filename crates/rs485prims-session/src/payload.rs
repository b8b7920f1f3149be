//! Typed response payloads.
//!
//! Multi-byte fields are little-endian. Decoders accept trailing bytes and
//! reject payloads shorter than the fixed layout.

use std::fmt;

use rs485prims_frame::command;
use serde::Serialize;

/// Size of a status payload.
pub const STATUS_PAYLOAD_LEN: usize = 16;

/// Size of a version payload.
pub const VERSION_PAYLOAD_LEN: usize = 5;

/// Size of a heartbeat payload.
pub const HEARTBEAT_PAYLOAD_LEN: usize = 2;

/// Digital channels per controller.
pub const DIGITAL_CHANNELS: usize = 56;

/// Bytes in a packed digital channel array.
pub const DIGITAL_PAYLOAD_LEN: usize = DIGITAL_CHANNELS / 8;

/// Bytes per channel in the simple analog layout (`f32`).
pub const ANALOG_SIMPLE_STRIDE: usize = 4;

/// Bytes per channel in the extended analog layout (`u16` raw + `f32`).
pub const ANALOG_EXTENDED_STRIDE: usize = 6;

/// Health snapshot reported by `GET_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub peer_id: u8,
    /// 0-100.
    pub health: u8,
    pub uptime_secs: u32,
    pub error_count: u32,
    pub rx_packets: u32,
    pub tx_packets: u16,
}

impl DeviceStatus {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < STATUS_PAYLOAD_LEN {
            return None;
        }
        Some(Self {
            peer_id: data[0],
            health: data[1],
            uptime_secs: u32_le(&data[2..6]),
            error_count: u32_le(&data[6..10]),
            rx_packets: u32_le(&data[10..14]),
            tx_packets: u16::from_le_bytes([data[14], data[15]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; STATUS_PAYLOAD_LEN] {
        let mut out = [0u8; STATUS_PAYLOAD_LEN];
        out[0] = self.peer_id;
        out[1] = self.health;
        out[2..6].copy_from_slice(&self.uptime_secs.to_le_bytes());
        out[6..10].copy_from_slice(&self.error_count.to_le_bytes());
        out[10..14].copy_from_slice(&self.rx_packets.to_le_bytes());
        out[14..16].copy_from_slice(&self.tx_packets.to_le_bytes());
        out
    }

    /// Uptime as `HH:MM:SS`. Hours are not wrapped at 24.
    pub fn uptime_hms(&self) -> String {
        let secs = self.uptime_secs;
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Firmware version reported by `GET_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub build: u8,
    pub peer_id: u8,
}

impl DeviceVersion {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        match data {
            [major, minor, patch, build, peer_id, ..] => Some(Self {
                major: *major,
                minor: *minor,
                patch: *patch,
                build: *build,
                peer_id: *peer_id,
            }),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> [u8; VERSION_PAYLOAD_LEN] {
        [self.major, self.minor, self.patch, self.build, self.peer_id]
    }
}

impl fmt::Display for DeviceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Lightweight liveness answer to `HEARTBEAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    pub peer_id: u8,
    pub health: u8,
}

impl Heartbeat {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        match data {
            [peer_id, health, ..] => Some(Self {
                peer_id: *peer_id,
                health: *health,
            }),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEARTBEAT_PAYLOAD_LEN] {
        [self.peer_id, self.health]
    }
}

/// 56 digital channels packed LSB-first: channel `i` is bit `i % 8` of byte `i / 8`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitalChannels([u8; DIGITAL_PAYLOAD_LEN]);

impl DigitalChannels {
    /// All channels off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels listed in `active` on, the rest off. Out-of-range indices are ignored.
    pub fn from_active(active: &[usize]) -> Self {
        let mut channels = Self::new();
        for &ch in active {
            channels.set(ch, true);
        }
        channels
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..DIGITAL_PAYLOAD_LEN)?;
        let mut out = [0u8; DIGITAL_PAYLOAD_LEN];
        out.copy_from_slice(bytes);
        Some(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; DIGITAL_PAYLOAD_LEN] {
        &self.0
    }

    /// State of channel `ch`; out-of-range channels read as off.
    pub fn get(&self, ch: usize) -> bool {
        ch < DIGITAL_CHANNELS && self.0[ch / 8] & (1 << (ch % 8)) != 0
    }

    pub fn set(&mut self, ch: usize, on: bool) {
        if ch >= DIGITAL_CHANNELS {
            return;
        }
        if on {
            self.0[ch / 8] |= 1 << (ch % 8);
        } else {
            self.0[ch / 8] &= !(1 << (ch % 8));
        }
    }

    /// Indices of channels that are on, ascending.
    pub fn active(&self) -> Vec<usize> {
        (0..DIGITAL_CHANNELS).filter(|&ch| self.get(ch)).collect()
    }

    /// Number of channels that are on.
    pub fn count_active(&self) -> usize {
        self.0.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl Serialize for DigitalChannels {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.active().serialize(serializer)
    }
}

/// Analog channel groups on the analog-input controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalogKind {
    /// 4-20 mA current loops.
    Current,
    /// 0-10 V inputs.
    Voltage,
    /// NTC thermistors.
    Temperature,
}

impl AnalogKind {
    pub const ALL: [AnalogKind; 3] = [
        AnalogKind::Current,
        AnalogKind::Voltage,
        AnalogKind::Temperature,
    ];

    pub fn channels(self) -> usize {
        match self {
            AnalogKind::Current => 26,
            AnalogKind::Voltage => 6,
            AnalogKind::Temperature => 4,
        }
    }

    pub fn request_code(self) -> u8 {
        match self {
            AnalogKind::Current => command::READ_ANALOG_CURRENT,
            AnalogKind::Voltage => command::READ_ANALOG_VOLTAGE,
            AnalogKind::Temperature => command::READ_NTC,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            AnalogKind::Current => "mA",
            AnalogKind::Voltage => "V",
            AnalogKind::Temperature => "°C",
        }
    }
}

/// One analog channel reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalogReading {
    /// Raw ADC count; only present in the extended layout.
    pub raw: Option<u16>,
    /// Engineering value in the kind's unit.
    pub value: f32,
}

/// Decode up to `channels` readings.
///
/// The layout is inferred from length: `channels * 6` bytes or more is the
/// extended layout, anything shorter is the simple one. A trailing partial
/// channel is dropped.
pub fn decode_analog(data: &[u8], channels: usize) -> Vec<AnalogReading> {
    if data.len() >= channels * ANALOG_EXTENDED_STRIDE {
        data.chunks_exact(ANALOG_EXTENDED_STRIDE)
            .take(channels)
            .map(|c| AnalogReading {
                raw: Some(u16::from_le_bytes([c[0], c[1]])),
                value: f32::from_le_bytes([c[2], c[3], c[4], c[5]]),
            })
            .collect()
    } else {
        data.chunks_exact(ANALOG_SIMPLE_STRIDE)
            .take(channels)
            .map(|c| AnalogReading {
                raw: None,
                value: f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
            })
            .collect()
    }
}

/// Encode readings, extended layout if any reading carries a raw count.
pub fn encode_analog(readings: &[AnalogReading]) -> Vec<u8> {
    let extended = readings.iter().any(|r| r.raw.is_some());
    let mut out = Vec::with_capacity(readings.len() * ANALOG_EXTENDED_STRIDE);
    for r in readings {
        if extended {
            out.extend_from_slice(&r.raw.unwrap_or(0).to_le_bytes());
        }
        out.extend_from_slice(&r.value.to_le_bytes());
    }
    out
}

/// All analog groups from one `READ_ALL_ANALOG` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalogSnapshot {
    pub current: Vec<AnalogReading>,
    pub voltage: Vec<AnalogReading>,
    pub temperature: Vec<AnalogReading>,
}

impl AnalogSnapshot {
    /// Decode the concatenated current, voltage and temperature groups.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let total: usize = AnalogKind::ALL.iter().map(|k| k.channels()).sum();
        let stride = if data.len() >= total * ANALOG_EXTENDED_STRIDE {
            ANALOG_EXTENDED_STRIDE
        } else if data.len() >= total * ANALOG_SIMPLE_STRIDE {
            ANALOG_SIMPLE_STRIDE
        } else {
            return None;
        };

        let mut offset = 0;
        let mut groups = AnalogKind::ALL.iter().map(|kind| {
            let len = kind.channels() * stride;
            let group = decode_analog(&data[offset..offset + len], kind.channels());
            offset += len;
            group
        });
        Some(Self {
            current: groups.next()?,
            voltage: groups.next()?,
            temperature: groups.next()?,
        })
    }

    pub fn group(&self, kind: AnalogKind) -> &[AnalogReading] {
        match kind {
            AnalogKind::Current => &self.current,
            AnalogKind::Voltage => &self.voltage,
            AnalogKind::Temperature => &self.temperature,
        }
    }
}

/// Error codes carried by `ERROR_RESPONSE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    None,
    InvalidChecksum,
    InvalidAddress,
    InvalidCommand,
    InvalidLength,
    Timeout,
    Busy,
    Unknown(u8),
}

impl From<u8> for ErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x00 => ErrorCode::None,
            0x01 => ErrorCode::InvalidChecksum,
            0x02 => ErrorCode::InvalidAddress,
            0x03 => ErrorCode::InvalidCommand,
            0x04 => ErrorCode::InvalidLength,
            0x05 => ErrorCode::Timeout,
            0x06 => ErrorCode::Busy,
            other => ErrorCode::Unknown(other),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::None => 0x00,
            ErrorCode::InvalidChecksum => 0x01,
            ErrorCode::InvalidAddress => 0x02,
            ErrorCode::InvalidCommand => 0x03,
            ErrorCode::InvalidLength => 0x04,
            ErrorCode::Timeout => 0x05,
            ErrorCode::Busy => 0x06,
            ErrorCode::Unknown(other) => other,
        }
    }
}

/// A peer's refusal of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    /// Address of the peer that raised the error, when it says.
    pub reporter: Option<u8>,
}

impl ErrorReport {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let code = ErrorCode::from(*data.first()?);
        Some(Self {
            code,
            reporter: data.get(1).copied(),
        })
    }
}

fn u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_layout() {
        let status = DeviceStatus {
            peer_id: 0x02,
            health: 97,
            uptime_secs: 3_725,
            error_count: 3,
            rx_packets: 70_000,
            tx_packets: 65_000,
        };
        let bytes = status.to_bytes();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], 97);
        assert_eq!(&bytes[2..6], &3_725u32.to_le_bytes());
        assert_eq!(&bytes[14..16], &65_000u16.to_le_bytes());
        assert_eq!(DeviceStatus::from_bytes(&bytes), Some(status));
        assert_eq!(status.uptime_hms(), "01:02:05");
    }

    #[test]
    fn status_too_short() {
        assert_eq!(DeviceStatus::from_bytes(&[0u8; 15]), None);
    }

    #[test]
    fn version_display_and_trailing_bytes() {
        let v = DeviceVersion::from_bytes(&[1, 4, 2, 17, 0x03, 0, 0, 0]).unwrap();
        assert_eq!(v.to_string(), "v1.4.2.17");
        assert_eq!(v.peer_id, 0x03);
        assert_eq!(DeviceVersion::from_bytes(&[1, 2, 3, 4]), None);
    }

    #[test]
    fn heartbeat_decode() {
        assert_eq!(
            Heartbeat::from_bytes(&[0x01, 88]),
            Some(Heartbeat {
                peer_id: 0x01,
                health: 88
            })
        );
        assert_eq!(Heartbeat::from_bytes(&[0x01]), None);
    }

    #[test]
    fn digital_first_and_last_channel() {
        let channels = DigitalChannels::from_active(&[0, 55]);
        assert_eq!(channels.as_bytes(), &[0x01, 0, 0, 0, 0, 0, 0x80]);

        let decoded = DigitalChannels::from_bytes(&[0x01, 0, 0, 0, 0, 0, 0x80]).unwrap();
        for ch in 0..DIGITAL_CHANNELS {
            assert_eq!(decoded.get(ch), ch == 0 || ch == 55, "channel {ch}");
        }
        assert_eq!(decoded.active(), vec![0, 55]);
        assert_eq!(decoded.count_active(), 2);
    }

    #[test]
    fn digital_set_clear_and_bounds() {
        let mut channels = DigitalChannels::new();
        channels.set(9, true);
        assert_eq!(channels.as_bytes()[1], 0x02);
        channels.set(9, false);
        assert_eq!(channels, DigitalChannels::new());
        channels.set(56, true);
        assert!(!channels.get(56));
        assert_eq!(channels.count_active(), 0);
        assert_eq!(DigitalChannels::from_bytes(&[0u8; 6]), None);
    }

    #[test]
    fn analog_simple_layout() {
        let readings: Vec<AnalogReading> = (0..6)
            .map(|i| AnalogReading {
                raw: None,
                value: i as f32 * 1.5,
            })
            .collect();
        let bytes = encode_analog(&readings);
        assert_eq!(bytes.len(), 6 * ANALOG_SIMPLE_STRIDE);
        assert_eq!(decode_analog(&bytes, 6), readings);
    }

    #[test]
    fn analog_extended_layout() {
        let readings: Vec<AnalogReading> = (0..4)
            .map(|i| AnalogReading {
                raw: Some(1000 + i),
                value: 20.0 + i as f32,
            })
            .collect();
        let bytes = encode_analog(&readings);
        assert_eq!(bytes.len(), 4 * ANALOG_EXTENDED_STRIDE);
        assert_eq!(decode_analog(&bytes, 4), readings);
    }

    #[test]
    fn analog_partial_channel_dropped() {
        let mut bytes = 12.5f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0]);
        let out = decode_analog(&bytes, 26);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 12.5);
    }

    #[test]
    fn all_analog_extended() {
        let mut data = Vec::new();
        for kind in AnalogKind::ALL {
            let group: Vec<AnalogReading> = (0..kind.channels())
                .map(|i| AnalogReading {
                    raw: Some(i as u16),
                    value: kind.channels() as f32,
                })
                .collect();
            data.extend(encode_analog(&group));
        }
        assert_eq!(data.len(), 216);

        let snapshot = AnalogSnapshot::from_bytes(&data).unwrap();
        assert_eq!(snapshot.current.len(), 26);
        assert_eq!(snapshot.voltage.len(), 6);
        assert_eq!(snapshot.temperature.len(), 4);
        assert_eq!(snapshot.group(AnalogKind::Voltage)[5].raw, Some(5));
        assert_eq!(snapshot.temperature[0].value, 4.0);
        assert_eq!(AnalogSnapshot::from_bytes(&data[..100]), None);
    }

    #[test]
    fn error_report() {
        let report = ErrorReport::from_bytes(&[0x03, 0x02]).unwrap();
        assert_eq!(report.code, ErrorCode::InvalidCommand);
        assert_eq!(report.reporter, Some(0x02));
        assert_eq!(
            ErrorReport::from_bytes(&[0x42]).unwrap().code,
            ErrorCode::Unknown(0x42)
        );
        assert_eq!(u8::from(ErrorCode::Busy), 0x06);
        assert_eq!(ErrorReport::from_bytes(&[]), None);
    }

    #[test]
    fn digital_serializes_as_active_list() {
        let json = serde_json::to_string(&DigitalChannels::from_active(&[3, 4])).unwrap();
        assert_eq!(json, "[3,4]");
    }
}
