//! Telegram framing for the transducer command/response protocol.
//!
//! Every request and response travels as one telegram:
//! - A frame-start marker (0x02), doubled wherever the value appears in the body
//! - Command, destination address, source address and parameter count
//! - Up to 255 parameter bytes
//! - A running checksum and a weighted checksum over everything after the marker
//!
//! Readers collect frames byte by byte; callers always get a validated telegram.

pub mod checksum;
pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use checksum::Checksum;
pub use codec::{
    decode, destuff, encode, stuff, Telegram, BROADCAST, DEFAULT_ADDRESS_FROM,
    DEFAULT_ADDRESS_TO, HEADER_SIZE, MARKER, MAX_PARAMETERS, TRAILER_SIZE,
};
pub use command::Command;
pub use error::{Result, TelegramError};
pub use reader::TelegramReader;
pub use writer::{TelegramWriter, DEFAULT_WRITE_TIMEOUT};
