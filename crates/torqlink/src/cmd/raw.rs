use serde::Serialize;
use torqlink_session::{Measurement, RawReading, Scaling};

use crate::cmd::{connect, LinkArgs, RawArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_json, print_pretty, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct RawOutput<'a> {
    reading: &'a RawReading,
    measurement: &'a Measurement,
}

pub fn run(args: RawArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    if args.count == 0 {
        return Err(CliError::usage("--count must be at least 1"));
    }
    let scaling = Scaling::new(args.torque_max, args.speed_max);

    let mut connector = connect(link)?;
    let mut rows = Vec::with_capacity(args.count);
    for _ in 0..args.count {
        let reading = connector
            .get_raw()
            .map_err(|err| session_error("raw read failed", err))?;
        let measurement = reading.scaled(&scaling);

        match format {
            OutputFormat::Table => rows.push(table_row(&reading, &measurement)),
            other => print_reading(&reading, &measurement, other),
        }
    }

    if format == OutputFormat::Table {
        print_table(
            [
                "RAW 0", "RAW 1", "CAL 0", "CAL 1", "TORQUE", "SPEED", "OVERLOAD", "FULL STROKE",
            ],
            rows,
        );
    }
    Ok(SUCCESS)
}

fn table_row(reading: &RawReading, measurement: &Measurement) -> Vec<String> {
    let [a, b] = reading.channels;
    vec![
        a.raw.to_string(),
        b.raw.to_string(),
        a.calibrated.to_string(),
        b.calibrated.to_string(),
        format!("{:.3}", measurement.torque),
        format!("{:.3}", measurement.speed),
        measurement.overloaded.to_string(),
        measurement.full_stroke.to_string(),
    ]
}

fn print_reading(reading: &RawReading, measurement: &Measurement, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&RawOutput {
            reading,
            measurement,
        }),
        OutputFormat::Raw => {
            let mut out = Vec::with_capacity(9);
            for channel in &reading.channels {
                out.extend_from_slice(&channel.raw.to_be_bytes());
            }
            for channel in &reading.channels {
                out.extend_from_slice(&channel.calibrated.to_be_bytes());
            }
            out.push(u8::from(reading.full_stroke));
            print_raw(&out);
        }
        OutputFormat::Pretty | OutputFormat::Table => {
            let [a, b] = reading.channels;
            print_pretty(&[
                ("raw", format!("{},{}", a.raw, b.raw)),
                ("calibrated", format!("{},{}", a.calibrated, b.calibrated)),
                ("torque", format!("{:.3}", measurement.torque)),
                ("speed", format!("{:.3}", measurement.speed)),
                ("overloaded", measurement.overloaded.to_string()),
                ("full_stroke", measurement.full_stroke.to_string()),
            ]);
        }
    }
}
