//! Sessions with a torque transducer.
//!
//! A [`Connector`] owns one transport and runs strictly sequential
//! request/response exchanges over it, translating replies into typed
//! values and NACKs into decoded device errors. It also switches the device
//! into streaming mode and polls the header-less sample stream.

pub mod config;
pub mod connector;
pub mod device_error;
pub mod error;
pub mod measurement;
pub mod streaming;

pub use config::{Scaling, SessionConfig, DEFAULT_RESOLUTION};
pub use connector::{BlockDump, Connector};
pub use device_error::ErrorCode;
pub use error::{Result, SessionError};
pub use measurement::{ChannelReading, Measurement, RawReading, StatusReport, OVERLOAD_THRESHOLD};
pub use streaming::{
    sample_rate_byte, stream_parameters, DeviceMode, StreamChannel, StreamSample,
    StreamingReceiver, BASE_TICKS_PER_SECOND, STREAM_MODE,
};
