//! Bus checksum.
//!
//! Reflected CRC-16 with polynomial `0xA001` and seed `0xFFFF`, computed
//! bit-by-bit without a table. The peer firmware computes exactly this, so
//! neither constant is configurable.

const SEED: u16 = 0xFFFF;
const POLYNOMIAL: u16 = 0xA001;

/// Compute the bus checksum over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(SEED, |crc, &byte| update(crc, byte))
}

/// Fold a single byte into a running checksum.
pub fn update(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte);
    for _ in 0..8 {
        if crc & 0x0001 != 0 {
            crc = (crc >> 1) ^ POLYNOMIAL;
        } else {
            crc >>= 1;
        }
    }
    crc
}
