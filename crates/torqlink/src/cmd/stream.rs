use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use torqlink_session::{sample_rate_byte, StreamChannel, StreamSample};
use tracing::info;

use crate::cmd::{connect, LinkArgs, StreamArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_json, print_pretty, print_raw, OutputFormat};

const IDLE_POLL: Duration = Duration::from_millis(1);

pub fn run(args: StreamArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    sample_rate_byte(args.rate).map_err(|err| session_error("invalid stream request", err))?;
    let channel = StreamChannel::from(args.channel);
    let limit = args
        .samples
        .or_else(|| (args.count > 0).then_some(args.count as usize));

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut connector = connect(link)?;
    connector
        .start_streaming(args.rate, args.count, channel)
        .map_err(|err| session_error("stream start failed", err))?;

    let mut printed = 0usize;
    let mut result = Ok(SUCCESS);
    while running.load(Ordering::SeqCst) {
        match connector.streaming_recv_poll() {
            Ok(Some(sample)) => {
                print_sample(&sample, format);
                printed = printed.saturating_add(1);
                if limit.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            Ok(None) => thread::sleep(IDLE_POLL),
            Err(err) => {
                result = Err(session_error("stream receive failed", err));
                break;
            }
        }
    }

    info!(samples = printed, "stream finished");
    let stopped = connector
        .close()
        .map_err(|err| session_error("stream stop failed", err));
    let code = result?;
    stopped?;
    Ok(code)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn print_sample(sample: &StreamSample, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(sample),
        OutputFormat::Raw => print_raw(&frame_bytes(sample)),
        OutputFormat::Table | OutputFormat::Pretty => {
            let mut pairs = vec![
                ("index", sample.index.to_string()),
                ("value", sample.value.to_string()),
            ];
            if let Some(second) = sample.second {
                pairs.push(("second", second.to_string()));
            }
            print_pretty(&pairs);
        }
    }
}

// Re-encode the sample exactly as it arrived on the wire.
fn frame_bytes(sample: &StreamSample) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.push(sample.index);
    out.extend_from_slice(&sample.value.to_be_bytes());
    if let Some(second) = sample.second {
        out.extend_from_slice(&second.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_output_matches_wire_frames() {
        let single = StreamSample {
            index: 7,
            value: -200,
            second: None,
        };
        assert_eq!(frame_bytes(&single), vec![0x07, 0xFF, 0x38]);

        let dual = StreamSample {
            index: 1,
            value: 100,
            second: Some(-100),
        };
        assert_eq!(frame_bytes(&dual), vec![0x01, 0x00, 0x64, 0xFF, 0x9C]);
    }
}
