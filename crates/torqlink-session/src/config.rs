use std::time::Duration;

use torqlink_telegram::{Command, DEFAULT_ADDRESS_FROM, DEFAULT_ADDRESS_TO};
use torqlink_transport::DEFAULT_TIMEOUT;

/// Full-scale value of a calibrated reading.
pub const DEFAULT_RESOLUTION: u16 = 25_000;

/// Session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest silence tolerated between two reply bytes.
    pub response_timeout: Duration,
    /// Address the host sends from.
    pub address_from: u8,
    /// Device address used by the typed helpers.
    pub address_to: u8,
    /// Commands rejected before anything is sent.
    pub unsupported_commands: Vec<Command>,
}

impl SessionConfig {
    /// Talk to the device at `address_to`.
    pub fn with_address(mut self, address_to: u8) -> Self {
        self.address_to = address_to;
        self
    }

    /// Disable `command` for this session.
    pub fn with_unsupported(mut self, command: Command) -> Self {
        if !self.unsupported_commands.contains(&command) {
            self.unsupported_commands.push(command);
        }
        self
    }

    pub fn is_supported(&self, command: Command) -> bool {
        !self.unsupported_commands.contains(&command)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_TIMEOUT,
            address_from: DEFAULT_ADDRESS_FROM,
            address_to: DEFAULT_ADDRESS_TO,
            unsupported_commands: Vec::new(),
        }
    }
}

/// Conversion of calibrated readings into engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// Torque at full scale (channel 0).
    pub torque_full_scale: f64,
    /// Speed at full scale (channel 1).
    pub speed_full_scale: f64,
    /// Calibrated value that represents full scale.
    pub resolution: u16,
}

impl Scaling {
    pub fn new(torque_full_scale: f64, speed_full_scale: f64) -> Self {
        Self {
            torque_full_scale,
            speed_full_scale,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}
