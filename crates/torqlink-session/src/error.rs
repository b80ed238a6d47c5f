use std::time::Duration;

use torqlink_telegram::Command;

use crate::device_error::ErrorCode;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] torqlink_transport::TransportError),

    /// Telegram-level error.
    #[error("telegram error: {0}")]
    Telegram(#[from] torqlink_telegram::TelegramError),

    /// Configuration block error.
    #[error("config error: {0}")]
    Config(#[from] torqlink_config::ConfigError),

    /// The command is disabled for this connector.
    #[error("{0} is not supported by this device")]
    UnsupportedCommand(Command),

    /// No byte arrived within the per-byte timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The device answered with a NACK.
    #[error("device rejected {command}: {code}")]
    Rejected { command: Command, code: ErrorCode },

    /// The device refused to enter streaming mode.
    #[error("start streaming failed with {0}; is the sample rate too high?")]
    StreamingRejected(ErrorCode),

    /// The reply carried a different command than the request calls for.
    #[error("expected {expected} reply, got {received}")]
    UnexpectedResponse { expected: Command, received: Command },

    /// The reply carried fewer parameters than its command defines.
    #[error("{command} reply too short: need {expected} parameters, got {received}")]
    ShortResponse {
        command: Command,
        expected: usize,
        received: usize,
    },

    /// Sample rate must be a positive, finite frequency.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Streaming channels are A, B or C.
    #[error("invalid streaming channel {0:?}; expected A, B or C")]
    InvalidChannel(String),

    /// A streaming operation was used outside streaming mode.
    #[error("device is not streaming")]
    NotStreaming,

    /// A broadcast request cannot produce the reply the operation needs.
    #[error("{0} needs a reply and cannot be broadcast")]
    NoResponse(Command),
}

pub type Result<T> = std::result::Result<T, SessionError>;
