//! Addressed, checksummed framing for half-duplex RS485 buses.
//!
//! Every message on the bus is framed as:
//! - A start marker (`0xAA`)
//! - Destination address, source address, command code, payload length (1 byte each)
//! - Up to 250 payload bytes
//! - A little-endian CRC-16 over header and payload
//! - An end marker (`0x55`)
//!
//! [`Reassembler`] turns an arbitrarily chunked byte stream back into frames,
//! dropping noise and corrupted frames without surfacing them to callers.

pub mod address;
pub mod codec;
pub mod command;
pub mod crc;
pub mod error;
pub mod reassembler;
pub mod writer;

pub use address::{
    address_name, ANALOG_INPUT, BROADCAST, DIGITAL_INPUT, DIGITAL_OUTPUT, HOST, KNOWN_PEERS,
};
pub use codec::{
    decode_frame, encode_frame, Frame, END_MARKER, FRAME_OVERHEAD, HEADER_SIZE, MAX_FRAME_SIZE,
    MAX_PAYLOAD, START_MARKER,
};
pub use command::{command_name, response_code};
pub use crc::crc16;
pub use error::{FrameError, Result};
pub use reassembler::Reassembler;
pub use writer::FrameWriter;
