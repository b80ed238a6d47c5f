use serde::Serialize;
use torqlink_session::{ErrorCode, StatusReport};

use crate::cmd::{connect, FullStrokeArgs, FullStrokeState, LinkArgs, StatusArgs};
use crate::exit::{session_error, CliResult, FAILURE, SUCCESS};
use crate::output::{hex_upper, print_json, print_pretty, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct CodeOutput<'a> {
    command: &'a str,
    address: u8,
    code: u8,
    name: &'static str,
}

#[derive(Serialize)]
struct StatusOutput {
    address: u8,
    code: u8,
    name: &'static str,
    data: String,
}

#[derive(Serialize)]
struct DoneOutput<'a> {
    command: &'a str,
    address: u8,
    ok: bool,
}

pub fn hello(link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    let code = connector
        .hello()
        .map_err(|err| session_error("hello failed", err))?;
    print_code("hello", link.address, code, format);
    Ok(exit_for(code))
}

pub fn restart(link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    let code = connector
        .restart_device()
        .map_err(|err| session_error("restart failed", err))?;
    match code {
        Some(code) => {
            print_code("restart", link.address, code, format);
            Ok(exit_for(code))
        }
        None => {
            print_done("restart", link.address, format);
            Ok(SUCCESS)
        }
    }
}

pub fn status(args: StatusArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    if args.short {
        let code = connector
            .get_status_short()
            .map_err(|err| session_error("status failed", err))?;
        print_code("status", link.address, code, format);
        return Ok(exit_for(code));
    }

    let report = connector
        .get_status()
        .map_err(|err| session_error("status failed", err))?;
    print_status(&report, link.address, format);
    Ok(exit_for(report.code))
}

pub fn zero(link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    connector
        .zero_angle()
        .map_err(|err| session_error("zero failed", err))?;
    print_done("zero", link.address, format);
    Ok(SUCCESS)
}

pub fn full_stroke(args: FullStrokeArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    connector
        .write_full_stroke(args.state == FullStrokeState::On)
        .map_err(|err| session_error("full-stroke failed", err))?;
    print_done("full-stroke", link.address, format);
    Ok(SUCCESS)
}

// A device reporting anything but OK fails the command.
fn exit_for(code: ErrorCode) -> i32 {
    if code.is_ok() {
        SUCCESS
    } else {
        FAILURE
    }
}

fn print_code(command: &str, address: u8, code: ErrorCode, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&CodeOutput {
            command,
            address,
            code: code.code(),
            name: code.name(),
        }),
        OutputFormat::Table => print_table(
            ["COMMAND", "ADDRESS", "CODE"],
            [vec![command.to_string(), address.to_string(), code.to_string()]],
        ),
        OutputFormat::Pretty => print_pretty(&[
            ("command", command.to_string()),
            ("address", address.to_string()),
            ("code", code.to_string()),
        ]),
        OutputFormat::Raw => print_raw(&[code.code()]),
    }
}

fn print_status(report: &StatusReport, address: u8, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatusOutput {
            address,
            code: report.code.code(),
            name: report.code.name(),
            data: hex_upper(&report.data),
        }),
        OutputFormat::Table => print_table(
            ["ADDRESS", "CODE", "DATA"],
            [vec![
                address.to_string(),
                report.code.to_string(),
                hex_upper(&report.data),
            ]],
        ),
        OutputFormat::Pretty => print_pretty(&[
            ("address", address.to_string()),
            ("code", report.code.to_string()),
            ("data", hex_upper(&report.data)),
        ]),
        OutputFormat::Raw => print_raw(&report.data),
    }
}

fn print_done(command: &str, address: u8, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DoneOutput {
            command,
            address,
            ok: true,
        }),
        OutputFormat::Table => print_table(
            ["COMMAND", "ADDRESS", "RESULT"],
            [vec![command.to_string(), address.to_string(), "ok".to_string()]],
        ),
        OutputFormat::Pretty => print_pretty(&[
            ("command", command.to_string()),
            ("address", address.to_string()),
            ("result", "ok".to_string()),
        ]),
        OutputFormat::Raw => {}
    }
}
