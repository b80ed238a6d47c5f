/// Errors that can occur while decoding or editing configuration blocks.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The payload was read for a different block number.
    #[error("expected block {expected}, got block {received}")]
    BadBlockId { expected: u8, received: u8 },

    /// The block cannot be edited or written back.
    #[error("{0} is read only")]
    ReadOnly(&'static str),

    /// The payload does not cover the block image.
    #[error("payload too short: need {needed} bytes, got {received}")]
    PayloadTooShort { needed: usize, received: usize },

    /// No declared block has this name.
    #[error("unknown config block: {0}")]
    UnknownBlock(String),

    /// The block declares no field with this name.
    #[error("{block} has no field named {field}")]
    UnknownField { block: &'static str, field: String },

    /// The value cannot be encoded into the field.
    #[error("invalid value {value} for field {field}")]
    InvalidValue { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
