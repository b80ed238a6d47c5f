//! Streaming ("special") mode.
//!
//! Once streaming, the device sends fixed-width frames with no marker and no
//! checksum: an index byte followed by one or two signed 16-bit big-endian
//! values. The receiver must be polled often enough that the OS receive
//! buffer never overruns, since a lost byte shifts every later frame.

use std::fmt;
use std::io::{ErrorKind, Read};
use std::str::FromStr;

use bytes::{Buf, BytesMut};
use serde::Serialize;
use torqlink_transport::Transport;

use crate::error::{Result, SessionError};

/// Special mode number of the sample stream.
pub const STREAM_MODE: u8 = 3;

/// Sample-rate unit: the device counts in 200 µs steps.
pub const BASE_TICKS_PER_SECOND: f64 = 5_000.0;

/// Current device mode as tracked by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    Idle,
    StreamingSingle,
    StreamingDual,
}

impl DeviceMode {
    pub fn is_streaming(self) -> bool {
        self != DeviceMode::Idle
    }

    /// Bytes per streaming frame; `None` when idle.
    pub fn frame_size(self) -> Option<usize> {
        match self {
            DeviceMode::Idle => None,
            DeviceMode::StreamingSingle => Some(3),
            DeviceMode::StreamingDual => Some(5),
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceMode::Idle => "idle",
            DeviceMode::StreamingSingle => "streaming-single",
            DeviceMode::StreamingDual => "streaming-dual",
        })
    }
}

/// Channel selection for streaming. `C` streams both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamChannel {
    #[default]
    A,
    B,
    C,
}

impl StreamChannel {
    /// Selector byte sent to the device.
    pub fn letter(self) -> u8 {
        match self {
            StreamChannel::A => b'A',
            StreamChannel::B => b'B',
            StreamChannel::C => b'C',
        }
    }

    pub fn mode(self) -> DeviceMode {
        match self {
            StreamChannel::C => DeviceMode::StreamingDual,
            StreamChannel::A | StreamChannel::B => DeviceMode::StreamingSingle,
        }
    }
}

impl FromStr for StreamChannel {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(StreamChannel::A),
            "B" | "b" => Ok(StreamChannel::B),
            "C" | "c" => Ok(StreamChannel::C),
            other => Err(SessionError::InvalidChannel(other.to_string())),
        }
    }
}

/// Sample-rate byte for a rate in Hz: whole 200 µs ticks per sample,
/// clamped to one byte.
pub fn sample_rate_byte(rate_hz: f64) -> Result<u8> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(SessionError::InvalidSampleRate(rate_hz));
    }
    let ticks = (BASE_TICKS_PER_SECOND / rate_hz).floor();
    Ok(ticks.clamp(0.0, f64::from(u8::MAX)) as u8)
}

/// GotoSpecialMode parameters that start the sample stream.
pub fn stream_parameters(rate_hz: f64, count: u32, channel: StreamChannel) -> Result<[u8; 5]> {
    let rate = sample_rate_byte(rate_hz)?;
    let [count_hi, count_lo] = (count.min(u32::from(u16::MAX)) as u16).to_be_bytes();
    Ok([STREAM_MODE, rate, count_hi, count_lo, channel.letter()])
}

/// One streaming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamSample {
    /// Wrapping frame counter.
    pub index: u8,
    /// Value of the selected channel, or of channel A in dual mode.
    pub value: i16,
    /// Channel B in dual mode.
    pub second: Option<i16>,
}

/// Reassembles streaming frames from whatever the transport has buffered.
#[derive(Debug)]
pub struct StreamingReceiver {
    mode: DeviceMode,
    frame_size: usize,
    buf: BytesMut,
}

impl StreamingReceiver {
    pub fn new(mode: DeviceMode) -> Result<Self> {
        let frame_size = mode.frame_size().ok_or(SessionError::NotStreaming)?;
        Ok(Self {
            mode,
            frame_size,
            buf: BytesMut::with_capacity(frame_size * 16),
        })
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Bytes received but not yet returned as a sample.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append bytes already read from the device.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Return the next sample if a whole frame is available, without
    /// blocking.
    pub fn poll<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<StreamSample>> {
        if self.buf.len() < self.frame_size {
            let available = transport.bytes_available()?;
            if available > 0 {
                self.fill(transport, available)?;
            }
        }
        Ok(self.next_sample())
    }

    fn fill<R: Read + ?Sized>(&mut self, source: &mut R, available: usize) -> Result<()> {
        let start = self.buf.len();
        self.buf.resize(start + available, 0);
        let read = loop {
            match source.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    break 0
                }
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(torqlink_transport::TransportError::Io(err).into());
                }
            }
        };
        self.buf.truncate(start + read);
        Ok(())
    }

    /// Decode the next buffered frame, consuming exactly its bytes.
    pub fn next_sample(&mut self) -> Option<StreamSample> {
        if self.buf.len() < self.frame_size {
            return None;
        }

        let index = self.buf.get_u8();
        let value = self.buf.get_i16();
        let second = (self.mode == DeviceMode::StreamingDual).then(|| self.buf.get_i16());
        Some(StreamSample {
            index,
            value,
            second,
        })
    }
}
