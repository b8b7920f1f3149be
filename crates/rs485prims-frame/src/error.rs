/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the wire format's length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Start or end marker did not match.
    #[error("invalid frame markers (expected 0xAA .. 0x55)")]
    Framing,

    /// The declared payload length does not fit the supplied bytes.
    #[error("length mismatch (declared payload {declared} bytes, frame is {actual} bytes)")]
    LengthMismatch { declared: usize, actual: usize },

    /// The transmitted checksum disagrees with the recomputed one.
    #[error("checksum mismatch (computed 0x{expected:04X}, received 0x{actual:04X})")]
    Checksum { expected: u16, actual: u16 },

    /// The reassembly buffer grew past its limit without completing a frame.
    #[error("receive buffer overflow ({len} bytes without a complete frame)")]
    Overflow { len: usize },

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted zero bytes mid-frame.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
