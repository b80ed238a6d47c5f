//! Decoded ReadRaw and ReadStatus replies.

use serde::Serialize;
use torqlink_telegram::Command;

use crate::config::Scaling;
use crate::device_error::ErrorCode;
use crate::error::{Result, SessionError};

/// Magnitude at which a calibrated value counts as overloaded.
pub const OVERLOAD_THRESHOLD: i16 = 25_000;

const RAW_PARAMETERS: usize = 9;

/// Raw and calibrated value of one measurement channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelReading {
    pub raw: i16,
    pub calibrated: i16,
}

impl ChannelReading {
    pub fn overloaded(&self) -> bool {
        self.calibrated.unsigned_abs() >= OVERLOAD_THRESHOLD.unsigned_abs()
    }
}

/// One ReadRaw reply. Channel 0 measures torque, channel 1 speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawReading {
    pub channels: [ChannelReading; 2],
    /// The full-stroke test signal is active.
    pub full_stroke: bool,
}

impl RawReading {
    /// Decode the nine ReadRaw parameters: raw 0, raw 1, calibrated 0,
    /// calibrated 1 (signed 16-bit big-endian each), then the full-stroke flag.
    pub fn from_parameters(params: &[u8]) -> Result<Self> {
        if params.len() < RAW_PARAMETERS {
            return Err(SessionError::ShortResponse {
                command: Command::ReadRaw,
                expected: RAW_PARAMETERS,
                received: params.len(),
            });
        }

        let word = |idx: usize| i16::from_be_bytes([params[idx], params[idx + 1]]);
        Ok(Self {
            channels: [
                ChannelReading {
                    raw: word(0),
                    calibrated: word(4),
                },
                ChannelReading {
                    raw: word(2),
                    calibrated: word(6),
                },
            ],
            full_stroke: params[8] != 0,
        })
    }

    /// True when either calibrated value reached the overload threshold.
    pub fn overloaded(&self) -> bool {
        self.channels.iter().any(ChannelReading::overloaded)
    }

    /// Convert the calibrated values into torque and speed.
    pub fn scaled(&self, scaling: &Scaling) -> Measurement {
        Measurement {
            torque: scale(self.channels[0], scaling.torque_full_scale, scaling.resolution),
            speed: scale(self.channels[1], scaling.speed_full_scale, scaling.resolution),
            overloaded: self.overloaded(),
            full_stroke: self.full_stroke,
        }
    }
}

/// Calibrated reading in engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub torque: f64,
    pub speed: f64,
    pub overloaded: bool,
    pub full_stroke: bool,
}

// Overloaded channels report full scale with their sign.
fn scale(channel: ChannelReading, full_scale: f64, resolution: u16) -> f64 {
    let resolution = f64::from(resolution);
    let value = if channel.overloaded() {
        resolution.copysign(f64::from(channel.calibrated))
    } else {
        f64::from(channel.calibrated)
    };
    value * full_scale / resolution
}

/// ReadStatus reply. The first parameter is the current error code; the
/// rest is device-specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub code: ErrorCode,
    pub data: Vec<u8>,
}

impl StatusReport {
    pub fn from_parameters(params: &[u8]) -> Result<Self> {
        let Some(&first) = params.first() else {
            return Err(SessionError::ShortResponse {
                command: Command::ReadStatus,
                expected: Command::ReadStatus.response_parameter_count(),
                received: 0,
            });
        };
        Ok(Self {
            code: ErrorCode::from(first),
            data: params.to_vec(),
        })
    }
}
