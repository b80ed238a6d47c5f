//! Command codes.
//!
//! ACK and NACK only ever travel from the device to the host. Every other
//! command is a request whose reply carries a fixed number of parameter bytes,
//! unless the device answers with a NACK.

use std::fmt;

use crate::error::TelegramError;

/// Parameter count of a NACK reply: one device error code.
pub const NACK_PARAMETER_COUNT: usize = 1;

/// One-byte command code carried in every telegram.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ack = 0x06,
    Nack = 0x15,
    Hello = 0x40,
    ReadRaw = 0x41,
    ReadStatus = 0x42,
    ReadStatusShort = 0x43,
    ReadConfig = 0x44,
    /// Calibration control, also used to switch the full-stroke test signal.
    WriteCalibrationControl = 0x45,
    WriteConfig = 0x46,
    RestartDevice = 0x49,
    SetAngleToZero = 0x4B,
    GotoSpecialMode = 0x5A,
}

impl Command {
    /// Every command, in code order.
    pub const ALL: [Command; 12] = [
        Command::Ack,
        Command::Nack,
        Command::Hello,
        Command::ReadRaw,
        Command::ReadStatus,
        Command::ReadStatusShort,
        Command::ReadConfig,
        Command::WriteCalibrationControl,
        Command::WriteConfig,
        Command::RestartDevice,
        Command::SetAngleToZero,
        Command::GotoSpecialMode,
    ];

    /// Wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Hello => "Hello",
            Command::ReadRaw => "ReadRaw",
            Command::ReadStatus => "ReadStatus",
            Command::ReadStatusShort => "ReadStatusShort",
            Command::ReadConfig => "ReadConfig",
            Command::WriteCalibrationControl => "WriteCalibrationControl",
            Command::WriteConfig => "WriteConfig",
            Command::RestartDevice => "RestartDevice",
            Command::SetAngleToZero => "SetAngleToZero",
            Command::GotoSpecialMode => "GotoSpecialMode",
        }
    }

    /// Parameter count of the reply the device sends to this request.
    pub fn response_parameter_count(self) -> usize {
        match self {
            Command::Ack => 0,
            Command::Nack => NACK_PARAMETER_COUNT,
            Command::Hello => 1,
            Command::ReadRaw => 9,
            Command::ReadStatus => 14,
            Command::ReadStatusShort => 1,
            Command::ReadConfig => 33,
            Command::WriteCalibrationControl => 0,
            Command::WriteConfig => 0,
            // The device restarts and greets with a Hello.
            Command::RestartDevice => 1,
            Command::SetAngleToZero => 0,
            Command::GotoSpecialMode => 0,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = TelegramError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Command::ALL
            .into_iter()
            .find(|command| command.code() == code)
            .ok_or(TelegramError::UnknownCommand(code))
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.code()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}
