use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error, including failure to open the port.
    #[error("transport error: {0}")]
    Transport(#[from] rs485prims_transport::TransportError),

    /// Frame-level error raised before anything reached the wire.
    #[error("frame error: {0}")]
    Frame(#[from] rs485prims_frame::FrameError),

    /// Writing the request frame failed. Not retried.
    #[error("send failed: {0}")]
    Send(#[source] rs485prims_frame::FrameError),

    /// No valid response arrived before the deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The session has been disconnected.
    #[error("session disconnected")]
    Disconnected,

    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

impl SessionError {
    /// True for errors that mean "nobody answered" rather than misuse or I/O failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
