//! Error codes reported by the device.

use std::fmt;

/// Error code carried by a NACK, a Hello and the short status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    Generic,
    Watchdog,
    RotorGeneric,
    RotorWrongSpeed,
    RotorTooSlow,
    RotorTooFast,
    RotorNotCompatible,
    RotorGotReset,
    RotorNotFound,
    RotorUnstable,
    RotorTimeout,
    RotorGotNack,
    RotorBadCmdEcho,
    RotorBadEeWrite,
    RotorBadCommunication,
    ConfigBlock,
    StatorConfig,
    StatorHardwareConfig,
    StatorOperationConfig,
    RotorConfig,
    FactoryCalibrate,
    UserCalibrate,
    FactoryCalibrateContents,
    UserCalibrateContents,
    BadParmSize,
    BadCmd,
    BadChecksum,
    BadParm,
    BadAddr,
    CantOverwrite,
    StackOverflow,
    AngleOverflow,
    Unknown(u8),
}

impl ErrorCode {
    /// Wire value.
    pub fn code(self) -> u8 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::Generic => 1,
            ErrorCode::Watchdog => 2,
            ErrorCode::RotorGeneric => 3,
            ErrorCode::RotorWrongSpeed => 4,
            ErrorCode::RotorTooSlow => 5,
            ErrorCode::RotorTooFast => 6,
            ErrorCode::RotorNotCompatible => 7,
            ErrorCode::RotorGotReset => 8,
            ErrorCode::RotorNotFound => 9,
            ErrorCode::RotorUnstable => 10,
            ErrorCode::RotorTimeout => 11,
            ErrorCode::RotorGotNack => 12,
            ErrorCode::RotorBadCmdEcho => 13,
            ErrorCode::RotorBadEeWrite => 14,
            ErrorCode::RotorBadCommunication => 15,
            ErrorCode::ConfigBlock => 20,
            ErrorCode::StatorConfig => 21,
            ErrorCode::StatorHardwareConfig => 26,
            ErrorCode::StatorOperationConfig => 27,
            ErrorCode::RotorConfig => 31,
            ErrorCode::FactoryCalibrate => 32,
            ErrorCode::UserCalibrate => 33,
            ErrorCode::FactoryCalibrateContents => 34,
            ErrorCode::UserCalibrateContents => 35,
            ErrorCode::BadParmSize => 40,
            ErrorCode::BadCmd => 41,
            ErrorCode::BadChecksum => 42,
            ErrorCode::BadParm => 43,
            ErrorCode::BadAddr => 44,
            ErrorCode::CantOverwrite => 45,
            ErrorCode::StackOverflow => 60,
            ErrorCode::AngleOverflow => 61,
            ErrorCode::Unknown(code) => code,
        }
    }

    /// Name as listed in the device documentation.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::Generic => "GENERIC",
            ErrorCode::Watchdog => "WATCHDOG",
            ErrorCode::RotorGeneric => "ROTOR_GENERIC",
            ErrorCode::RotorWrongSpeed => "ROTOR_WRONG_SPEED",
            ErrorCode::RotorTooSlow => "ROTOR_TOO_SLOW",
            ErrorCode::RotorTooFast => "ROTOR_TOO_FAST",
            ErrorCode::RotorNotCompatible => "ROTOR_NOT_COMPATIBLE",
            ErrorCode::RotorGotReset => "ROTOR_GOT_RESET",
            ErrorCode::RotorNotFound => "ROTOR_NOT_FOUND",
            ErrorCode::RotorUnstable => "ROTOR_UNSTABLE",
            ErrorCode::RotorTimeout => "ROTOR_TIMEOUT",
            ErrorCode::RotorGotNack => "ROTOR_GOT_NACK",
            ErrorCode::RotorBadCmdEcho => "ROTOR_BAD_CMD_ECHO",
            ErrorCode::RotorBadEeWrite => "ROTOR_BAD_EE_WRITE",
            ErrorCode::RotorBadCommunication => "ROTOR_BAD_COMMUNICATION",
            ErrorCode::ConfigBlock => "CONFIG_BLOCK",
            ErrorCode::StatorConfig => "STATOR_CONFIG",
            ErrorCode::StatorHardwareConfig => "STATOR_HARDWARE_CONFIG",
            ErrorCode::StatorOperationConfig => "STATOR_OPERATION_CONFIG",
            ErrorCode::RotorConfig => "ROTOR_CONFIG",
            ErrorCode::FactoryCalibrate => "FACTORY_CALIBRATE",
            ErrorCode::UserCalibrate => "USER_CALIBRATE",
            ErrorCode::FactoryCalibrateContents => "FACTORY_CALIBRATE_CONTENTS",
            ErrorCode::UserCalibrateContents => "USER_CALIBRATE_CONTENTS",
            ErrorCode::BadParmSize => "BAD_PARM_SIZE",
            ErrorCode::BadCmd => "BAD_CMD",
            ErrorCode::BadChecksum => "BAD_CHECKSUM",
            ErrorCode::BadParm => "BAD_PARM",
            ErrorCode::BadAddr => "BAD_ADDR",
            ErrorCode::CantOverwrite => "CANT_OVERWRITE",
            ErrorCode::StackOverflow => "STACK_OVERFLOW",
            ErrorCode::AngleOverflow => "ANGLE_OVERFLOW",
            ErrorCode::Unknown(_) => "UNKNOWN",
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

impl From<u8> for ErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0 => ErrorCode::Ok,
            1 => ErrorCode::Generic,
            2 => ErrorCode::Watchdog,
            3 => ErrorCode::RotorGeneric,
            4 => ErrorCode::RotorWrongSpeed,
            5 => ErrorCode::RotorTooSlow,
            6 => ErrorCode::RotorTooFast,
            7 => ErrorCode::RotorNotCompatible,
            8 => ErrorCode::RotorGotReset,
            9 => ErrorCode::RotorNotFound,
            10 => ErrorCode::RotorUnstable,
            11 => ErrorCode::RotorTimeout,
            12 => ErrorCode::RotorGotNack,
            13 => ErrorCode::RotorBadCmdEcho,
            14 => ErrorCode::RotorBadEeWrite,
            15 => ErrorCode::RotorBadCommunication,
            20 => ErrorCode::ConfigBlock,
            21 => ErrorCode::StatorConfig,
            26 => ErrorCode::StatorHardwareConfig,
            27 => ErrorCode::StatorOperationConfig,
            31 => ErrorCode::RotorConfig,
            32 => ErrorCode::FactoryCalibrate,
            33 => ErrorCode::UserCalibrate,
            34 => ErrorCode::FactoryCalibrateContents,
            35 => ErrorCode::UserCalibrateContents,
            40 => ErrorCode::BadParmSize,
            41 => ErrorCode::BadCmd,
            42 => ErrorCode::BadChecksum,
            43 => ErrorCode::BadParm,
            44 => ErrorCode::BadAddr,
            45 => ErrorCode::CantOverwrite,
            60 => ErrorCode::StackOverflow,
            61 => ErrorCode::AngleOverflow,
            other => ErrorCode::Unknown(other),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_roundtrips() {
        for code in 0..=u8::MAX {
            assert_eq!(ErrorCode::from(code).code(), code);
        }
    }

    #[test]
    fn known_codes_have_names() {
        assert_eq!(ErrorCode::from(43), ErrorCode::BadParm);
        assert_eq!(ErrorCode::from(61).to_string(), "ANGLE_OVERFLOW (61)");
        assert!(ErrorCode::from(0).is_ok());
    }

    #[test]
    fn gaps_are_unknown() {
        assert_eq!(ErrorCode::from(16), ErrorCode::Unknown(16));
        assert_eq!(ErrorCode::from(200).to_string(), "UNKNOWN (200)");
    }
}
