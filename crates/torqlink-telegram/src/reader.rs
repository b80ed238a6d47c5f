use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::codec::{decode, Telegram, HEADER_SIZE, MARKER, TRAILER_SIZE};
use crate::command::{Command, NACK_PARAMETER_COUNT};
use crate::error::{Result, TelegramError};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Reads reply telegrams from any `Read` stream, one byte at a time.
///
/// The stream's own read timeout bounds every single-byte wait. A wait that
/// ends without data fails the whole read with [`TelegramError::Timeout`].
pub struct TelegramReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> TelegramReader<T> {
    /// Create a new telegram reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read and decode a reply expected to carry `expected_parameters` bytes.
    ///
    /// A NACK reply is recognised from its command byte and read with its
    /// one-byte error code instead.
    pub fn read_telegram(&mut self, expected_parameters: usize) -> Result<Telegram> {
        let raw = self.read_frame(expected_parameters)?;
        decode(&raw)
    }

    /// Collect the raw (still stuffed) bytes of one reply frame.
    pub fn read_frame(&mut self, expected_parameters: usize) -> Result<Bytes> {
        self.buf.clear();

        let mut skipped = 0usize;
        while self.read_byte()? != MARKER {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(skipped, "discarded bytes before frame start");
        }
        self.buf.put_u8(MARKER);

        let mut expected = frame_len(expected_parameters);
        let mut collected = 1usize;
        while collected < expected {
            let byte = self.read_byte()?;
            self.buf.put_u8(byte);
            let value = if byte == MARKER {
                let next = self.read_byte()?;
                self.buf.put_u8(next);
                next
            } else {
                byte
            };
            collected += 1;

            if collected == 2 && value == Command::Nack.code() {
                expected = frame_len(NACK_PARAMETER_COUNT);
            }
        }

        debug!(frame = %hex::encode_upper(&self.buf), "frame received");
        Ok(self.buf.split().freeze())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    return Err(TelegramError::Timeout {
                        received: self.buf.len(),
                    })
                }
                Ok(_) => return Ok(byte[0]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    return Err(TelegramError::Timeout {
                        received: self.buf.len(),
                    })
                }
                Err(err) => return Err(TelegramError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Unstuffed frame length for a reply with `parameters` parameter bytes.
fn frame_len(parameters: usize) -> usize {
    1 + HEADER_SIZE + parameters + TRAILER_SIZE
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode;

    fn wire(command: Command, params: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode(command, 0xFF, 0x01, params, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn read_ack() {
        let mut reader = TelegramReader::new(Cursor::new(wire(Command::Ack, &[])));
        let telegram = reader.read_telegram(0).unwrap();
        assert_eq!(telegram.command, Command::Ack);
        assert_eq!(telegram.address_to, 0xFF);
        assert_eq!(telegram.address_from, 0x01);
    }

    #[test]
    fn read_raw_reply_with_nine_parameters() {
        let params = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x00];
        let mut reader = TelegramReader::new(Cursor::new(wire(Command::ReadRaw, &params)));
        let telegram = reader.read_telegram(9).unwrap();
        assert_eq!(telegram.parameters().as_ref(), &params);
    }

    #[test]
    fn leading_noise_is_skipped() {
        let mut bytes = vec![0x00, 0xAA, 0x55];
        bytes.extend(wire(Command::Hello, &[0x00]));
        let mut reader = TelegramReader::new(Cursor::new(bytes));
        let telegram = reader.read_telegram(1).unwrap();
        assert_eq!(telegram.command, Command::Hello);
    }

    #[test]
    fn nack_overrides_expected_length() {
        let mut bytes = wire(Command::Nack, &[43]);
        // Anything after the NACK belongs to the next exchange.
        bytes.extend_from_slice(&[0xEE, 0xEE]);
        let mut reader = TelegramReader::new(Cursor::new(bytes));

        let telegram = reader.read_telegram(33).unwrap();
        assert!(telegram.is_nack());
        assert_eq!(telegram.parameters().as_ref(), &[43]);
        assert_eq!(reader.get_ref().position(), (reader.get_ref().get_ref().len() - 2) as u64);
    }

    #[test]
    fn nack_widens_ack_expectation() {
        let mut reader = TelegramReader::new(Cursor::new(wire(Command::Nack, &[41])));
        let telegram = reader.read_telegram(0).unwrap();
        assert!(telegram.is_nack());
        assert_eq!(telegram.parameters().as_ref(), &[41]);
    }

    #[test]
    fn stuffed_parameters_are_collapsed() {
        let params = [0x02, 0x02, 0x10];
        let bytes = wire(Command::ReadStatusShort, &params);
        assert!(bytes.len() > 1 + HEADER_SIZE + params.len() + TRAILER_SIZE);

        let mut reader = TelegramReader::new(Cursor::new(bytes));
        let telegram = reader.read_telegram(3).unwrap();
        assert_eq!(telegram.parameters().as_ref(), &params);
    }

    #[test]
    fn doubled_leading_marker_is_collapsed() {
        let mut bytes = vec![MARKER];
        bytes.extend(wire(Command::Hello, &[0x00]));
        let mut reader = TelegramReader::new(Cursor::new(bytes));

        let telegram = reader.read_telegram(1).unwrap();
        assert!(telegram.stuffed());
        assert_eq!(telegram.parameters().as_ref(), &[0x00]);
    }

    #[test]
    fn silence_times_out() {
        let mut reader = TelegramReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_telegram(0).unwrap_err();
        assert!(matches!(err, TelegramError::Timeout { received: 0 }));
    }

    #[test]
    fn partial_reply_times_out() {
        let bytes = wire(Command::ReadRaw, &[0; 9]);
        let mut reader = TelegramReader::new(Cursor::new(bytes[..6].to_vec()));
        let err = reader.read_telegram(9).unwrap_err();
        assert!(matches!(err, TelegramError::Timeout { received: 6 }));
    }

    #[test]
    fn corrupted_reply_fails_checksum() {
        let mut bytes = wire(Command::Hello, &[0x00]);
        bytes[5] = 0x07;
        let mut reader = TelegramReader::new(Cursor::new(bytes));
        assert!(matches!(
            reader.read_telegram(1),
            Err(TelegramError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(Command::Ack, &[]),
            pos: 0,
        };
        let mut framed = TelegramReader::new(reader);
        assert_eq!(framed.read_telegram(0).unwrap().command, Command::Ack);
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = TelegramReader::new(BrokenPipe);
        let err = framed.read_telegram(0).unwrap_err();
        assert!(matches!(err, TelegramError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
