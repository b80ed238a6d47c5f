//! Byte-stream transport abstraction for torqlink.
//!
//! Provides a unified interface over the links a transducer can sit behind:
//! - Serial ports (RS232/RS485 adapters, USB CDC)
//! - An in-memory transport for replay and tests
//!
//! This is the lowest layer of torqlink. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use serial::{SerialConfig, SerialTransport, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
pub use traits::Transport;
