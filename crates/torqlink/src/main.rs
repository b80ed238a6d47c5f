mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, LinkArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "torqlink",
    version,
    about = "Talk to a rotary torque transducer over its serial telegram protocol"
)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.link, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ConfigCommand, FullStrokeState};

    #[test]
    fn parses_global_link_options() {
        let cli = Cli::try_parse_from([
            "torqlink",
            "--port",
            "/dev/ttyUSB3",
            "--baud",
            "57600",
            "--address",
            "7",
            "hello",
        ])
        .expect("hello args should parse");

        assert_eq!(cli.link.port.as_deref(), Some("/dev/ttyUSB3"));
        assert_eq!(cli.link.baud, 57_600);
        assert_eq!(cli.link.address, 7);
        assert!(matches!(cli.command, Command::Hello));
    }

    #[test]
    fn link_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["torqlink", "status", "--short", "--port", "COM4"])
            .expect("status args should parse");
        assert_eq!(cli.link.port.as_deref(), Some("COM4"));
        assert!(matches!(cli.command, Command::Status(ref args) if args.short));
    }

    #[test]
    fn parses_config_set() {
        let cli = Cli::try_parse_from([
            "torqlink",
            "config",
            "set",
            "stator_operation",
            "baudrate",
            "115200",
        ])
        .expect("config set args should parse");

        match cli.command {
            Command::Config(args) => match args.command {
                ConfigCommand::Set(set) => {
                    assert_eq!(set.block, "stator_operation");
                    assert_eq!(set.field, "baudrate");
                    assert_eq!(set.value, "115200");
                }
                other => panic!("unexpected config command: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_full_stroke_state() {
        let cli = Cli::try_parse_from(["torqlink", "full-stroke", "on"])
            .expect("full-stroke args should parse");
        assert!(matches!(
            cli.command,
            Command::FullStroke(ref args) if args.state == FullStrokeState::On
        ));
    }

    #[test]
    fn rejects_unknown_channel() {
        let err = Cli::try_parse_from(["torqlink", "stream", "--channel", "D"])
            .expect_err("channel D should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
