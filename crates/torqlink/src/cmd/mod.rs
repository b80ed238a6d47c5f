use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use torqlink_session::{Connector, SessionConfig, StreamChannel};
use torqlink_transport::{SerialConfig, SerialTransport, DEFAULT_BAUD_RATE};

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod config;
pub mod device;
pub mod raw;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the device answers.
    Hello,
    /// Read raw and calibrated channel values.
    Raw(RawArgs),
    /// Read the device status.
    Status(StatusArgs),
    /// Restart the device and wait for its hello.
    Restart,
    /// Set the current angle as zero.
    Zero,
    /// Switch the full-stroke test signal.
    FullStroke(FullStrokeArgs),
    /// Read, dump or change configuration blocks.
    Config(ConfigArgs),
    /// Stream samples until interrupted.
    Stream(StreamArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Hello => device::hello(link, format),
        Command::Raw(args) => raw::run(args, link, format),
        Command::Status(args) => device::status(args, link, format),
        Command::Restart => device::restart(link, format),
        Command::Zero => device::zero(link, format),
        Command::FullStroke(args) => device::full_stroke(args, link, format),
        Command::Config(args) => config::run(args, link, format),
        Command::Stream(args) => stream::run(args, link, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial link settings shared by every device command.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial port, e.g. /dev/ttyUSB0 or COM7.
    #[arg(long, env = "TORQLINK_PORT", global = true)]
    pub port: Option<String>,
    /// Line speed in baud.
    #[arg(long, env = "TORQLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,
    /// Per-byte response timeout (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms", global = true)]
    pub timeout: String,
    /// Device bus address.
    #[arg(long, default_value_t = 1, global = true)]
    pub address: u8,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    /// Torque at full scale, in engineering units.
    #[arg(long, default_value_t = 1.0)]
    pub torque_max: f64,
    /// Speed at full scale, in engineering units.
    #[arg(long, default_value_t = 1.0)]
    pub speed_max: f64,
    /// Number of readings to take.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Read only the current error code.
    #[arg(long)]
    pub short: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FullStrokeState {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct FullStrokeArgs {
    pub state: FullStrokeState,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Read and decode every declared block.
    Read,
    /// Probe a range of block numbers and print the raw replies.
    Dump(DumpArgs),
    /// Change one field of a writable block and write it back.
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[arg(long, default_value_t = 0)]
    pub first: u8,
    #[arg(long, default_value_t = 15)]
    pub last: u8,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Block name or number.
    pub block: String,
    /// Field name.
    pub field: String,
    /// New value: a table label, a number, or `none`.
    pub value: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum ChannelArg {
    A,
    B,
    C,
}

impl From<ChannelArg> for StreamChannel {
    fn from(channel: ChannelArg) -> Self {
        match channel {
            ChannelArg::A => StreamChannel::A,
            ChannelArg::B => StreamChannel::B,
            ChannelArg::C => StreamChannel::C,
        }
    }
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Sample rate in Hz.
    #[arg(long, default_value_t = 100.0)]
    pub rate: f64,
    /// Samples the device sends before stopping; 0 streams until stopped.
    #[arg(long, default_value_t = 0)]
    pub count: u32,
    /// Channel to stream; C streams both.
    #[arg(long, default_value = "A", ignore_case = true)]
    pub channel: ChannelArg,
    /// Exit after printing N samples.
    #[arg(long)]
    pub samples: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the configured port and start a session with the configured device.
pub fn connect(link: &LinkArgs) -> CliResult<Connector<SerialTransport>> {
    let port = link.port.as_deref().ok_or_else(|| {
        CliError::usage("no serial port given; pass --port or set TORQLINK_PORT")
    })?;
    let timeout = parse_duration(&link.timeout)?;

    let serial = SerialConfig {
        port: port.to_string(),
        baud_rate: link.baud,
        timeout,
    };
    let config = SessionConfig {
        response_timeout: timeout,
        ..SessionConfig::default()
    }
    .with_address(link.address);

    Connector::open(&serial, config).map_err(|err| session_error("open failed", err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("0ms").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("fast").unwrap_err().code, USAGE);
    }

    #[test]
    fn connect_requires_a_port() {
        let link = LinkArgs {
            port: None,
            baud: DEFAULT_BAUD_RATE,
            timeout: "10ms".to_string(),
            address: 1,
        };
        let err = connect(&link).err().expect("missing port should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn channel_arg_maps_to_stream_channel() {
        assert_eq!(StreamChannel::from(ChannelArg::C), StreamChannel::C);
        assert_eq!(StreamChannel::from(ChannelArg::A), StreamChannel::A);
    }
}
