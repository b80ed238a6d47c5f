use std::fmt;
use std::io;

use torqlink_config::ConfigError;
use torqlink_session::SessionError;
use torqlink_telegram::TelegramError;
use torqlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Open { .. } | TransportError::Serial(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn telegram_error(context: &str, err: TelegramError) -> CliError {
    match err {
        TelegramError::Io(source) => io_error(context, source),
        TelegramError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TelegramError::ChecksumMismatch { .. }
        | TelegramError::MalformedFrame(_)
        | TelegramError::UnknownCommand(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        TelegramError::TooManyParameters(_) => CliError::usage(format!("{context}: {err}")),
        TelegramError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    match err {
        ConfigError::BadBlockId { .. } | ConfigError::PayloadTooShort { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::usage(format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Telegram(err) => telegram_error(context, err),
        SessionError::Config(err) => config_error(context, err),
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::Rejected { .. } | SessionError::StreamingRejected(_) => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        SessionError::UnexpectedResponse { .. } | SessionError::ShortResponse { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SessionError::UnsupportedCommand(_)
        | SessionError::InvalidSampleRate(_)
        | SessionError::InvalidChannel(_)
        | SessionError::NoResponse(_) => CliError::usage(format!("{context}: {err}")),
        SessionError::NotStreaming => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use torqlink_session::ErrorCode;
    use torqlink_telegram::{Checksum, Command};

    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = session_error("hello failed", SessionError::Timeout(Duration::from_millis(10)));
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("hello failed: "));
    }

    #[test]
    fn corrupted_replies_are_invalid_data() {
        let err = SessionError::Telegram(TelegramError::ChecksumMismatch {
            expected: Checksum::default(),
            received: Checksum { sum: 1, weighted: 1 },
        });
        assert_eq!(session_error("raw failed", err).code, DATA_INVALID);
    }

    #[test]
    fn device_rejection_is_failure() {
        let err = SessionError::Rejected {
            command: Command::ReadConfig,
            code: ErrorCode::BadCmd,
        };
        assert_eq!(session_error("config failed", err).code, FAILURE);
    }

    #[test]
    fn bad_user_input_is_usage() {
        let err = ConfigError::UnknownBlock("rotor".to_string());
        assert_eq!(config_error("config set", err).code, USAGE);
        let err = SessionError::InvalidSampleRate(0.0);
        assert_eq!(session_error("stream", err).code, USAGE);
    }
}
