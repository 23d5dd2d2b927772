use ppmlink_protocol::{MessageError, PayloadError};

use crate::Mode;

/// Errors returned by the host API
///
/// Nothing is retried internally; the caller decides whether to re-issue.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Open options asked for both directions, or neither
    #[error("device must be opened for exactly one of read or write")]
    InvalidMode,

    /// Operation does not match the direction the device was opened for
    #[error("device is open for {opened:?}, cannot {requested:?}")]
    WrongMode { opened: Mode, requested: Mode },

    /// Reply payload was not one channel frame
    #[error("expected a 24-byte frame, got {len} bytes")]
    FrameLength { len: usize },

    /// Outbound message could not be framed
    #[error("message envelope error: {0:?}")]
    Message(MessageError),

    /// Device reached end of stream before replying
    #[error("device closed the stream")]
    Closed,

    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PayloadError> for HostError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::WrongLength { len } => HostError::FrameLength { len },
        }
    }
}

impl From<MessageError> for HostError {
    fn from(err: MessageError) -> Self {
        HostError::Message(err)
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
