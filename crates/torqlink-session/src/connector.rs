use std::ops::RangeInclusive;
use std::time::Duration;

use bytes::Bytes;
use torqlink_config::ConfigSet;
use torqlink_telegram::{
    Command, Telegram, TelegramError, TelegramReader, TelegramWriter, BROADCAST, MARKER,
};
use torqlink_transport::{SerialConfig, SerialTransport, Transport};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::device_error::ErrorCode;
use crate::error::{Result, SessionError};
use crate::measurement::{RawReading, StatusReport};
use crate::streaming::{
    stream_parameters, DeviceMode, StreamChannel, StreamSample, StreamingReceiver,
};

/// Markers sent back to back to leave streaming mode.
const STOP_SEQUENCE: [u8; 3] = [MARKER; 3];

/// Request and reply bytes of one ReadConfig probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDump {
    pub number: u8,
    pub request: Bytes,
    /// `None` when no valid reply arrived.
    pub response: Option<Bytes>,
    /// Why no reply was recorded: silence or an unreadable frame.
    pub error: Option<String>,
}

/// Request/response session with one device over one transport.
///
/// Only one request is ever in flight: every exchange borrows the connector
/// mutably until the reply has been read.
pub struct Connector<T: Transport> {
    transport: T,
    config: SessionConfig,
    mode: DeviceMode,
    receiver: Option<StreamingReceiver>,
}

impl Connector<SerialTransport> {
    /// Open a serial port and start a session on it.
    pub fn open(serial: &SerialConfig, config: SessionConfig) -> Result<Self> {
        let transport = SerialTransport::open(serial)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Connector<T> {
    /// Start a session on an already open transport.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            mode: DeviceMode::Idle,
            receiver: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send one request and wait for its reply.
    ///
    /// Returns `None` for broadcasts, which nobody answers. `timeout` bounds
    /// the silence before each reply byte and defaults to the session's
    /// response timeout. A NACK is returned as a telegram; the typed helpers
    /// turn it into [`SessionError::Rejected`].
    pub fn send_and_wait(
        &mut self,
        command: Command,
        address_to: u8,
        parameters: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Option<Telegram>> {
        if !self.config.is_supported(command) {
            return Err(SessionError::UnsupportedCommand(command));
        }

        let request = Telegram::new(
            command,
            address_to,
            self.config.address_from,
            Bytes::copy_from_slice(parameters),
        )?;
        debug!(%command, address_to, params = parameters.len(), "sending request");
        let write_timeout = self.transport.timeout();
        TelegramWriter::new(&mut self.transport)
            .with_timeout(write_timeout)
            .send(&request)?;

        if address_to == BROADCAST {
            return Ok(None);
        }

        let timeout = timeout.unwrap_or(self.config.response_timeout);
        if self.transport.timeout() != timeout {
            self.transport.set_timeout(timeout)?;
        }

        let expected = command.response_parameter_count();
        match TelegramReader::new(&mut self.transport).read_telegram(expected) {
            Ok(reply) => {
                debug!(command = %reply.command, params = reply.parameter_count(), "reply received");
                Ok(Some(reply))
            }
            Err(TelegramError::Timeout { received }) => {
                debug!(%command, received, "reply timed out");
                Err(SessionError::Timeout(timeout))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn is_broadcast(&self) -> bool {
        self.config.address_to == BROADCAST
    }

    /// Exchange with the configured device, requiring a non-NACK reply of
    /// the kind `command` calls for. Nothing is sent when the configured
    /// address is the broadcast address.
    fn request(&mut self, command: Command, parameters: &[u8]) -> Result<Telegram> {
        if self.is_broadcast() {
            return Err(SessionError::NoResponse(command));
        }
        let reply = self
            .send_and_wait(command, self.config.address_to, parameters, None)?
            .ok_or(SessionError::NoResponse(command))?;
        check_reply(command, reply)
    }

    /// Send a command whose only answer is an ACK or, for restarts, a Hello.
    /// A broadcast is done once it is written; otherwise the reply is
    /// checked like any other.
    fn command(&mut self, command: Command, parameters: &[u8]) -> Result<Option<Telegram>> {
        match self.send_and_wait(command, self.config.address_to, parameters, None)? {
            Some(reply) => check_reply(command, reply).map(Some),
            None => {
                debug!(%command, "broadcast sent");
                Ok(None)
            }
        }
    }

    /// Ping the device. The Hello reply carries its current error code.
    pub fn hello(&mut self) -> Result<ErrorCode> {
        let reply = self.request(Command::Hello, &[])?;
        first_code(Command::Hello, &reply)
    }

    /// Latest raw and calibrated values of both channels.
    pub fn get_raw(&mut self) -> Result<RawReading> {
        let reply = self.request(Command::ReadRaw, &[])?;
        RawReading::from_parameters(reply.parameters())
    }

    pub fn get_status(&mut self) -> Result<StatusReport> {
        let reply = self.request(Command::ReadStatus, &[])?;
        StatusReport::from_parameters(reply.parameters())
    }

    pub fn get_status_short(&mut self) -> Result<ErrorCode> {
        let reply = self.request(Command::ReadStatusShort, &[])?;
        first_code(Command::ReadStatusShort, &reply)
    }

    /// Restart the device. It greets with a Hello once it is back; a
    /// broadcast restart returns `None`.
    pub fn restart_device(&mut self) -> Result<Option<ErrorCode>> {
        self.command(Command::RestartDevice, &[])?
            .map(|reply| first_code(Command::RestartDevice, &reply))
            .transpose()
    }

    pub fn zero_angle(&mut self) -> Result<()> {
        self.command(Command::SetAngleToZero, &[]).map(drop)
    }

    /// Switch the full-stroke test signal. No torque may be applied while
    /// it is on.
    pub fn write_full_stroke(&mut self, on: bool) -> Result<()> {
        self.command(Command::WriteCalibrationControl, &[u8::from(on)])
            .map(drop)
    }

    /// Read every block of `config` from the device.
    pub fn read_config(&mut self, config: &mut ConfigSet) -> Result<()> {
        if self.is_broadcast() {
            return Err(SessionError::NoResponse(Command::ReadConfig));
        }
        for block in config.iter_mut() {
            let reply = self.request(Command::ReadConfig, &[block.number()])?;
            block.from_payload(reply.parameters())?;
            debug!(block = block.name(), "config block read");
        }
        Ok(())
    }

    /// Write every writable block of `config` back. Returns how many blocks
    /// were written.
    pub fn write_config(&mut self, config: &ConfigSet) -> Result<usize> {
        let mut written = 0;
        for block in config.iter().filter(|block| !block.is_read_only()) {
            let payload = block.to_payload()?;
            self.command(Command::WriteConfig, &payload)?;
            info!(block = block.name(), "config block written");
            written += 1;
        }
        Ok(written)
    }

    /// Probe every block number in `numbers` with ReadConfig and record the
    /// raw traffic.
    ///
    /// Block numbers that stay silent or answer with an unreadable frame are
    /// recorded with the failure and the sweep goes on. Transport failures
    /// end it.
    pub fn dump_config_blocks(&mut self, numbers: RangeInclusive<u8>) -> Result<Vec<BlockDump>> {
        if self.is_broadcast() {
            return Err(SessionError::NoResponse(Command::ReadConfig));
        }
        let address_to = self.config.address_to;
        let mut dumps = Vec::new();
        for number in numbers {
            let request = Telegram::new(
                Command::ReadConfig,
                address_to,
                self.config.address_from,
                vec![number],
            )?;
            let (response, error) =
                match self.send_and_wait(Command::ReadConfig, address_to, &[number], None) {
                    Ok(reply) => (reply.map(|reply| reply.to_bytes()), None),
                    Err(err @ SessionError::Timeout(_)) => (None, Some(err.to_string())),
                    Err(SessionError::Telegram(err)) if err.is_frame_error() => {
                        warn!(block = number, error = %err, "unreadable config reply");
                        self.transport.clear_input()?;
                        (None, Some(err.to_string()))
                    }
                    Err(err) => return Err(err),
                };
            dumps.push(BlockDump {
                number,
                request: request.to_bytes(),
                response,
                error,
            });
        }
        Ok(dumps)
    }

    /// Switch the device into streaming mode.
    ///
    /// `rate_hz` is converted to whole 200 µs ticks, `count` limits the
    /// number of samples (0 streams until stopped). Channel `C` streams
    /// both channels.
    pub fn start_streaming(&mut self, rate_hz: f64, count: u32, channel: StreamChannel) -> Result<()> {
        let params = stream_parameters(rate_hz, count, channel)?;
        if self.mode.is_streaming() {
            self.stop_streaming()?;
        }

        // Broadcast switches are not acknowledged; the devices stream as
        // soon as the request is out.
        let reply =
            self.send_and_wait(Command::GotoSpecialMode, self.config.address_to, &params, None)?;
        if let Some(reply) = reply {
            match reply.command {
                Command::Ack => {}
                Command::Nack => {
                    return Err(SessionError::StreamingRejected(nack_code(&reply)?))
                }
                other => {
                    return Err(SessionError::UnexpectedResponse {
                        expected: Command::Ack,
                        received: other,
                    })
                }
            }
        }

        let mode = channel.mode();
        self.receiver = Some(StreamingReceiver::new(mode)?);
        self.mode = mode;
        info!(rate_hz, rate_byte = params[1], count, %mode, "streaming started");
        Ok(())
    }

    /// Next streaming sample, or `None` if a whole frame has not arrived yet.
    pub fn streaming_recv_poll(&mut self) -> Result<Option<StreamSample>> {
        let receiver = self.receiver.as_mut().ok_or(SessionError::NotStreaming)?;
        receiver.poll(&mut self.transport)
    }

    /// Leave streaming mode. Nothing is acknowledged; the session is idle
    /// afterwards whether or not the device heard it.
    pub fn stop_streaming(&mut self) -> Result<()> {
        let was = self.mode;
        self.mode = DeviceMode::Idle;
        self.receiver = None;

        let write_timeout = self.transport.timeout();
        TelegramWriter::new(&mut self.transport)
            .with_timeout(write_timeout)
            .send_raw(&STOP_SEQUENCE)?;
        self.transport.clear_input()?;
        info!(mode = %was, "streaming stopped");
        Ok(())
    }

    /// End the session, stopping the stream first if one is running.
    pub fn close(mut self) -> Result<()> {
        if self.mode.is_streaming() {
            self.stop_streaming()?;
        }
        Ok(())
    }
}

impl<T: Transport> Drop for Connector<T> {
    fn drop(&mut self) {
        if self.mode.is_streaming() {
            if let Err(err) = self.stop_streaming() {
                warn!(error = %err, "failed to stop streaming on drop");
            }
        }
    }
}

/// Command of a successful reply to `command`.
fn reply_command(command: Command) -> Command {
    match command {
        Command::RestartDevice => Command::Hello,
        other if other.response_parameter_count() == 0 => Command::Ack,
        other => other,
    }
}

fn check_reply(command: Command, reply: Telegram) -> Result<Telegram> {
    if reply.is_nack() {
        return Err(SessionError::Rejected {
            command,
            code: nack_code(&reply)?,
        });
    }

    let expected = reply_command(command);
    if reply.command != expected {
        return Err(SessionError::UnexpectedResponse {
            expected,
            received: reply.command,
        });
    }
    Ok(reply)
}

fn nack_code(reply: &Telegram) -> Result<ErrorCode> {
    reply
        .parameters()
        .last()
        .map(|code| ErrorCode::from(*code))
        .ok_or_else(|| {
            TelegramError::MalformedFrame("NACK without an error code".to_string()).into()
        })
}

fn first_code(command: Command, reply: &Telegram) -> Result<ErrorCode> {
    reply
        .parameters()
        .first()
        .map(|code| ErrorCode::from(*code))
        .ok_or(SessionError::ShortResponse {
            command,
            expected: 1,
            received: 0,
        })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::sync::{Arc, Mutex};

    use bytes::BytesMut;
    use torqlink_config::{BlockKind, FieldValue, PAYLOAD_SIZE};
    use torqlink_telegram::{decode, encode};
    use torqlink_transport::MemoryTransport;

    use super::*;

    fn reply(command: Command, params: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode(command, 0xFF, 0x01, params, &mut buf).unwrap();
        buf.to_vec()
    }

    fn connector(inbound: &[u8]) -> Connector<MemoryTransport> {
        Connector::new(MemoryTransport::with_inbound(inbound), SessionConfig::default())
    }

    fn sent(connector: &mut Connector<MemoryTransport>) -> Telegram {
        decode(&connector.transport_mut().take_written()).unwrap()
    }

    #[test]
    fn send_and_wait_returns_reply() {
        let mut conn = connector(&reply(Command::Hello, &[0]));
        let telegram = conn
            .send_and_wait(Command::Hello, 0x01, &[], None)
            .unwrap()
            .unwrap();

        assert_eq!(telegram.command, Command::Hello);
        assert_eq!(telegram.parameters().as_ref(), &[0]);
        let request = sent(&mut conn);
        assert_eq!(request.command, Command::Hello);
        assert_eq!(request.address_to, 0x01);
        assert_eq!(request.address_from, 0xFF);
    }

    #[test]
    fn broadcast_returns_immediately() {
        let mut conn = connector(&[]);
        let result = conn.send_and_wait(Command::SetAngleToZero, BROADCAST, &[], None).unwrap();
        assert!(result.is_none());
        assert!(!conn.transport().written().is_empty());
    }

    #[test]
    fn unsupported_command_sends_nothing() {
        let config = SessionConfig::default().with_unsupported(Command::RestartDevice);
        let mut conn = Connector::new(MemoryTransport::new(), config);

        assert!(matches!(
            conn.restart_device(),
            Err(SessionError::UnsupportedCommand(Command::RestartDevice))
        ));
        assert!(conn.transport().written().is_empty());
    }

    #[test]
    fn silence_is_a_timeout() {
        let mut conn = connector(&[]);
        let err = conn
            .send_and_wait(Command::ReadRaw, 0x01, &[], Some(Duration::from_millis(25)))
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout(t) if t == Duration::from_millis(25)));
        assert_eq!(conn.transport().timeout(), Duration::from_millis(25));
    }

    #[test]
    fn corrupted_reply_is_not_retried() {
        let mut bytes = reply(Command::ReadStatusShort, &[0]);
        let last = bytes.len() - 2;
        bytes[last] ^= 0x40;
        let mut conn = connector(&bytes);

        assert!(matches!(
            conn.get_status_short(),
            Err(SessionError::Telegram(TelegramError::ChecksumMismatch { .. }))
        ));
        assert_eq!(conn.transport().written().len(), 7);
    }

    #[test]
    fn nack_becomes_rejection() {
        let mut conn = connector(&reply(Command::Nack, &[41]));
        let err = conn.read_config(&mut ConfigSet::new()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected {
                command: Command::ReadConfig,
                code: ErrorCode::BadCmd
            }
        ));
    }

    #[test]
    fn mismatched_reply_is_unexpected() {
        let mut conn = connector(&reply(Command::Hello, &[]));
        assert!(matches!(
            conn.zero_angle(),
            Err(SessionError::UnexpectedResponse {
                expected: Command::Ack,
                received: Command::Hello
            })
        ));
    }

    #[test]
    fn hello_and_restart_report_device_code() {
        let mut inbound = reply(Command::Hello, &[0]);
        inbound.extend(reply(Command::Hello, &[8]));
        let mut conn = connector(&inbound);

        assert_eq!(conn.hello().unwrap(), ErrorCode::Ok);
        assert_eq!(conn.restart_device().unwrap(), Some(ErrorCode::RotorGotReset));
    }

    #[test]
    fn get_raw_decodes_reading() {
        let params = [0x01, 0x00, 0xFF, 0xFF, 0x30, 0xD4, 0x00, 0x00, 0x01];
        let mut conn = connector(&reply(Command::ReadRaw, &params));

        let reading = conn.get_raw().unwrap();
        assert_eq!(reading.channels[0].raw, 256);
        assert_eq!(reading.channels[1].raw, -1);
        assert_eq!(reading.channels[0].calibrated, 12_500);
        assert!(reading.full_stroke);
    }

    #[test]
    fn get_status_keeps_all_parameters() {
        let mut params = [0u8; 14];
        params[0] = 2;
        let mut conn = connector(&reply(Command::ReadStatus, &params));

        let status = conn.get_status().unwrap();
        assert_eq!(status.code, ErrorCode::Watchdog);
        assert_eq!(status.data.len(), 14);
    }

    #[test]
    fn full_stroke_sends_switch_byte() {
        let mut conn = connector(&reply(Command::Ack, &[]));
        conn.write_full_stroke(true).unwrap();

        let request = sent(&mut conn);
        assert_eq!(request.command, Command::WriteCalibrationControl);
        assert_eq!(request.parameters().as_ref(), &[1]);
    }

    fn config_reply(kind: BlockKind, image_tail: &[u8]) -> Vec<u8> {
        let layout = kind.layout();
        let mut params = vec![0u8; PAYLOAD_SIZE];
        params[0] = layout.number;
        params[1] = layout.id;
        params[2..2 + image_tail.len()].copy_from_slice(image_tail);
        reply(Command::ReadConfig, &params)
    }

    #[test]
    fn read_then_write_config() {
        let mut inbound = config_reply(BlockKind::StatorHeader, &[0, 0, 1, 0, 0, 0, 42]);
        inbound.extend(config_reply(BlockKind::StatorHardware, &[0; 10]));
        inbound.extend(config_reply(BlockKind::StatorOperation, &[0, 0, 0, 0, 0, 0, 3]));
        inbound.extend(reply(Command::Ack, &[]));
        let mut conn = connector(&inbound);

        let mut config = ConfigSet::new();
        conn.read_config(&mut config).unwrap();
        assert_eq!(
            config.get(BlockKind::StatorHeader).get("serial").unwrap(),
            FieldValue::Int(42)
        );
        assert_eq!(
            config.get(BlockKind::StatorOperation).get("bus_address").unwrap(),
            FieldValue::Int(3)
        );

        config
            .get_mut(BlockKind::StatorOperation)
            .set("output_a", FieldValue::Label("POWER"))
            .unwrap();
        conn.transport_mut().take_written();
        assert_eq!(conn.write_config(&config).unwrap(), 1);

        let request = sent(&mut conn);
        assert_eq!(request.command, Command::WriteConfig);
        assert_eq!(request.parameters().len(), PAYLOAD_SIZE);
        assert_eq!(request.parameters()[0], 2);
        assert_eq!(request.parameters()[1 + 11], 0x06);
    }

    fn broadcast_connector() -> Connector<MemoryTransport> {
        Connector::new(
            MemoryTransport::new(),
            SessionConfig::default().with_address(BROADCAST),
        )
    }

    #[test]
    fn broadcast_commands_complete_once_sent() {
        let mut conn = broadcast_connector();

        conn.zero_angle().unwrap();
        assert_eq!(sent(&mut conn).command, Command::SetAngleToZero);

        conn.write_full_stroke(false).unwrap();
        assert_eq!(sent(&mut conn).parameters().as_ref(), &[0]);

        assert_eq!(conn.restart_device().unwrap(), None);
        assert_eq!(sent(&mut conn).command, Command::RestartDevice);

        assert_eq!(conn.write_config(&ConfigSet::new()).unwrap(), 1);
        let request = sent(&mut conn);
        assert_eq!(request.command, Command::WriteConfig);
        assert_eq!(request.address_to, BROADCAST);
    }

    #[test]
    fn broadcast_reads_send_nothing() {
        let mut conn = broadcast_connector();

        assert!(matches!(conn.hello(), Err(SessionError::NoResponse(Command::Hello))));
        assert!(matches!(conn.get_raw(), Err(SessionError::NoResponse(Command::ReadRaw))));
        assert!(matches!(
            conn.get_status(),
            Err(SessionError::NoResponse(Command::ReadStatus))
        ));
        assert!(matches!(
            conn.get_status_short(),
            Err(SessionError::NoResponse(Command::ReadStatusShort))
        ));
        assert!(matches!(
            conn.read_config(&mut ConfigSet::new()),
            Err(SessionError::NoResponse(Command::ReadConfig))
        ));
        assert!(matches!(
            conn.dump_config_blocks(0..=3),
            Err(SessionError::NoResponse(Command::ReadConfig))
        ));
        assert!(conn.transport().written().is_empty());
    }

    #[test]
    fn broadcast_stream_start_is_tracked() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Recording {
            inner: MemoryTransport::new(),
            log: Arc::clone(&log),
        };
        let config = SessionConfig::default().with_address(BROADCAST);
        let mut conn = Connector::new(transport, config);

        conn.start_streaming(100.0, 0, StreamChannel::A).unwrap();
        assert_eq!(conn.mode(), DeviceMode::StreamingSingle);
        log.lock().unwrap().clear();

        conn.close().unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), &STOP_SEQUENCE);
    }

    #[test]
    fn nack_without_code_is_malformed() {
        let nack = Telegram::new(Command::Nack, 0xFF, 0x01, Vec::new()).unwrap();
        assert!(matches!(
            nack_code(&nack),
            Err(SessionError::Telegram(TelegramError::MalformedFrame(_)))
        ));
    }

    #[test]
    fn dump_continues_past_unreadable_reply() {
        let mut corrupt = config_reply(BlockKind::StatorHardware, &[]);
        // Third parameter byte: marker, header (4), block number, block ID.
        assert_eq!(corrupt[7], 0x00);
        corrupt[7] = 0x01;

        let mut inbound = config_reply(BlockKind::StatorHeader, &[]);
        inbound.extend(corrupt);
        // Left over after the bad frame; must be discarded, not taken as
        // the reply for block 2.
        inbound.extend(config_reply(BlockKind::StatorOperation, &[]));
        let mut conn = connector(&inbound);

        let dumps = conn.dump_config_blocks(0..=2).unwrap();
        assert_eq!(dumps.len(), 3);
        assert!(dumps[0].response.is_some());
        assert!(dumps[0].error.is_none());
        assert!(dumps[1].response.is_none());
        assert!(dumps[1].error.as_deref().is_some_and(|e| e.contains("checksum")));
        assert!(dumps[2].response.is_none());
        assert!(dumps[2].error.is_some());
        assert!(conn.transport().pending_inbound().is_empty());
    }

    #[test]
    fn dump_records_silent_blocks() {
        let mut conn = connector(&config_reply(BlockKind::StatorHeader, &[]));
        let dumps = conn.dump_config_blocks(0..=1).unwrap();

        assert_eq!(dumps.len(), 2);
        assert!(dumps[0].response.is_some());
        assert_eq!(dumps[1].number, 1);
        assert!(dumps[1].response.is_none());
        assert!(dumps[1].error.is_some());
        assert_eq!(decode(&dumps[1].request).unwrap().parameters().as_ref(), &[1]);
    }

    #[test]
    fn streaming_lifecycle() {
        let mut conn = connector(&reply(Command::Ack, &[]));
        conn.start_streaming(20.0, 0, StreamChannel::A).unwrap();
        assert_eq!(conn.mode(), DeviceMode::StreamingSingle);

        let request = sent(&mut conn);
        assert_eq!(request.command, Command::GotoSpecialMode);
        assert_eq!(request.parameters().as_ref(), &[3, 250, 0, 0, b'A']);

        conn.transport_mut().push_inbound(&[0x05, 0x00]);
        assert_eq!(conn.streaming_recv_poll().unwrap(), None);
        conn.transport_mut().push_inbound(&[0x10]);
        let sample = conn.streaming_recv_poll().unwrap().unwrap();
        assert_eq!((sample.index, sample.value), (5, 16));

        conn.stop_streaming().unwrap();
        assert_eq!(conn.mode(), DeviceMode::Idle);
        assert_eq!(conn.transport().written(), &STOP_SEQUENCE);
        assert!(matches!(conn.streaming_recv_poll(), Err(SessionError::NotStreaming)));
    }

    #[test]
    fn rejected_stream_start_stays_idle() {
        let mut conn = connector(&reply(Command::Nack, &[43]));
        let err = conn.start_streaming(50_000.0, 0, StreamChannel::C).unwrap_err();

        assert!(matches!(err, SessionError::StreamingRejected(ErrorCode::BadParm)));
        assert_eq!(conn.mode(), DeviceMode::Idle);
    }

    #[test]
    fn invalid_rate_sends_nothing() {
        let mut conn = connector(&[]);
        assert!(matches!(
            conn.start_streaming(0.0, 0, StreamChannel::A),
            Err(SessionError::InvalidSampleRate(_))
        ));
        assert!(conn.transport().written().is_empty());
    }

    #[test]
    fn close_stops_active_stream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Recording {
            inner: MemoryTransport::with_inbound(&reply(Command::Ack, &[])),
            log: Arc::clone(&log),
        };
        let mut conn = Connector::new(transport, SessionConfig::default());
        conn.start_streaming(100.0, 10, StreamChannel::C).unwrap();
        assert_eq!(conn.mode(), DeviceMode::StreamingDual);
        log.lock().unwrap().clear();

        conn.close().unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), &STOP_SEQUENCE);
    }

    #[test]
    fn drop_stops_active_stream() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Recording {
            inner: MemoryTransport::with_inbound(&reply(Command::Ack, &[])),
            log: Arc::clone(&log),
        };
        let mut conn = Connector::new(transport, SessionConfig::default());
        conn.start_streaming(100.0, 0, StreamChannel::B).unwrap();
        log.lock().unwrap().clear();

        drop(conn);
        assert_eq!(log.lock().unwrap().as_slice(), &STOP_SEQUENCE);
    }

    /// Copies every written byte into a log that outlives the connector.
    struct Recording {
        inner: MemoryTransport,
        log: Arc<Mutex<Vec<u8>>>,
    }

    impl Read for Recording {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for Recording {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.log.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Transport for Recording {
        fn set_timeout(&mut self, timeout: Duration) -> torqlink_transport::Result<()> {
            self.inner.set_timeout(timeout)
        }

        fn timeout(&self) -> Duration {
            self.inner.timeout()
        }

        fn bytes_available(&self) -> torqlink_transport::Result<usize> {
            self.inner.bytes_available()
        }

        fn clear_input(&mut self) -> torqlink_transport::Result<()> {
            self.inner.clear_input()
        }
    }
}
