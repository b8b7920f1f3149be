//! Command codes.
//!
//! Requests and their responses use distinct codes. `READ_DO` shares the
//! `DO_RESPONSE` family with `WRITE_DO`, and any request may be answered with
//! `ERROR_RESPONSE`.

pub const PING: u8 = 0x01;
pub const PING_RESPONSE: u8 = 0x02;
pub const GET_VERSION: u8 = 0x03;
pub const VERSION_RESPONSE: u8 = 0x04;
pub const HEARTBEAT: u8 = 0x05;
pub const HEARTBEAT_RESPONSE: u8 = 0x06;
pub const GET_STATUS: u8 = 0x10;
pub const STATUS_RESPONSE: u8 = 0x11;
pub const READ_DI: u8 = 0x20;
pub const DI_RESPONSE: u8 = 0x21;
pub const WRITE_DO: u8 = 0x30;
pub const DO_RESPONSE: u8 = 0x31;
pub const READ_DO: u8 = 0x32;
pub const READ_ANALOG_CURRENT: u8 = 0x40;
pub const ANALOG_CURRENT_RESPONSE: u8 = 0x41;
pub const READ_ANALOG_VOLTAGE: u8 = 0x42;
pub const ANALOG_VOLTAGE_RESPONSE: u8 = 0x43;
pub const READ_NTC: u8 = 0x44;
pub const NTC_RESPONSE: u8 = 0x45;
pub const READ_ALL_ANALOG: u8 = 0x46;
pub const ALL_ANALOG_RESPONSE: u8 = 0x47;
pub const ERROR_RESPONSE: u8 = 0xFF;

/// The response code a well-behaved peer answers `request` with.
pub fn response_code(request: u8) -> Option<u8> {
    match request {
        PING => Some(PING_RESPONSE),
        GET_VERSION => Some(VERSION_RESPONSE),
        HEARTBEAT => Some(HEARTBEAT_RESPONSE),
        GET_STATUS => Some(STATUS_RESPONSE),
        READ_DI => Some(DI_RESPONSE),
        WRITE_DO | READ_DO => Some(DO_RESPONSE),
        READ_ANALOG_CURRENT => Some(ANALOG_CURRENT_RESPONSE),
        READ_ANALOG_VOLTAGE => Some(ANALOG_VOLTAGE_RESPONSE),
        READ_NTC => Some(NTC_RESPONSE),
        READ_ALL_ANALOG => Some(ALL_ANALOG_RESPONSE),
        _ => None,
    }
}

/// Returns a human-readable name for a command code.
pub fn command_name(code: u8) -> &'static str {
    match code {
        PING => "PING",
        PING_RESPONSE => "PING_RESPONSE",
        GET_VERSION => "GET_VERSION",
        VERSION_RESPONSE => "VERSION_RESPONSE",
        HEARTBEAT => "HEARTBEAT",
        HEARTBEAT_RESPONSE => "HEARTBEAT_RESPONSE",
        GET_STATUS => "GET_STATUS",
        STATUS_RESPONSE => "STATUS_RESPONSE",
        READ_DI => "READ_DI",
        DI_RESPONSE => "DI_RESPONSE",
        WRITE_DO => "WRITE_DO",
        DO_RESPONSE => "DO_RESPONSE",
        READ_DO => "READ_DO",
        READ_ANALOG_CURRENT => "READ_ANALOG_CURRENT",
        ANALOG_CURRENT_RESPONSE => "ANALOG_CURRENT_RESPONSE",
        READ_ANALOG_VOLTAGE => "READ_ANALOG_VOLTAGE",
        ANALOG_VOLTAGE_RESPONSE => "ANALOG_VOLTAGE_RESPONSE",
        READ_NTC => "READ_NTC",
        NTC_RESPONSE => "NTC_RESPONSE",
        READ_ALL_ANALOG => "READ_ALL_ANALOG",
        ALL_ANALOG_RESPONSE => "ALL_ANALOG_RESPONSE",
        ERROR_RESPONSE => "ERROR_RESPONSE",
        _ => "UNKNOWN",
    }
}
