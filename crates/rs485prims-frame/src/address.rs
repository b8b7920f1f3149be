//! Peer addresses on the bus.
//!
//! `0x00` is reserved for broadcast. Controllers occupy the low range and the
//! host uses `0x10` as the source of every request it sends.

/// Broadcast destination; frames sent here are accepted by every node.
pub const BROADCAST: u8 = 0x00;

/// Analog-input controller (4-20 mA, 0-10 V and NTC channels).
pub const ANALOG_INPUT: u8 = 0x01;

/// Digital-input controller.
pub const DIGITAL_INPUT: u8 = 0x02;

/// Digital-output controller.
pub const DIGITAL_OUTPUT: u8 = 0x03;

/// The host application.
pub const HOST: u8 = 0x10;

/// Controllers a host polls by default.
pub const KNOWN_PEERS: [u8; 3] = [ANALOG_INPUT, DIGITAL_INPUT, DIGITAL_OUTPUT];

/// Returns a human-readable name for an address.
pub fn address_name(addr: u8) -> &'static str {
    match addr {
        BROADCAST => "broadcast",
        ANALOG_INPUT => "analog-input",
        DIGITAL_INPUT => "digital-input",
        DIGITAL_OUTPUT => "digital-output",
        HOST => "host",
        _ => "unknown",
    }
}
