//! Serial telegram protocol for rotary torque/speed transducers.
//!
//! torqlink talks to a transducer over a point-to-point or RS485 serial
//! link: framed request/response telegrams with byte-stuffing and dual
//! checksums, fixed-layout configuration blocks, and a continuous
//! streaming mode.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-stream transports (serial port, in-memory)
//! - [`telegram`]: Telegram framing, checksums and blocking reader/writer
//! - [`config`]: Configuration block codec and declared block layouts
//! - [`session`]: Request/response sessions and streaming (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use torqlink_transport::*;
}

/// Re-export telegram types.
pub mod telegram {
    pub use torqlink_telegram::*;
}

/// Re-export configuration block types.
pub mod config {
    pub use torqlink_config::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use torqlink_session::*;
}
