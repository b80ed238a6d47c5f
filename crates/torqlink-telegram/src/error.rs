use crate::checksum::Checksum;

/// Errors that can occur during telegram encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The trailing checksum bytes disagree with the recomputed ones.
    #[error("checksum mismatch (computed {expected}, received {received})")]
    ChecksumMismatch {
        expected: Checksum,
        received: Checksum,
    },

    /// The bytes cannot be framed as a telegram.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The command byte is not part of the protocol.
    #[error("unknown command 0x{0:02X}")]
    UnknownCommand(u8),

    /// More parameters than a one-byte count can describe.
    #[error("too many parameters ({0}, max 255)")]
    TooManyParameters(usize),

    /// No further bytes arrived within the read timeout.
    #[error("timed out waiting for telegram ({received} bytes received)")]
    Timeout { received: usize },

    /// An I/O error occurred while reading or writing telegrams.
    #[error("telegram I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted no more bytes.
    #[error("transport closed while writing telegram")]
    Closed,
}

impl TelegramError {
    /// True when bytes arrived but did not form a valid telegram.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            TelegramError::ChecksumMismatch { .. }
                | TelegramError::MalformedFrame(_)
                | TelegramError::UnknownCommand(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TelegramError>;
