use std::io::{ErrorKind, Write};
use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::Telegram;
use crate::error::{Result, TelegramError};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Longest a write may keep reporting `WouldBlock` without progress.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Writes complete telegrams to any `Write` stream.
pub struct TelegramWriter<T> {
    inner: T,
    buf: BytesMut,
    write_timeout: Duration,
}

impl<T: Write> TelegramWriter<T> {
    /// Create a new telegram writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Bound how long a stalled stream may report `WouldBlock`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Encode and send a telegram (blocking).
    pub fn send(&mut self, telegram: &Telegram) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(&telegram.to_bytes());
        debug!(frame = %hex::encode_upper(&self.buf), "frame sent");
        let buf = self.buf.split();
        self.write_all_bytes(&buf)
    }

    /// Send bytes that bypass framing, such as the streaming stop sequence.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        debug!(bytes = %hex::encode_upper(bytes), "raw bytes sent");
        self.write_all_bytes(bytes)
    }

    fn write_all_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        let mut stalled = None;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TelegramError::Closed),
                Ok(n) => {
                    offset += n;
                    stalled = None;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    self.back_off(&mut stalled, err)?;
                }
                Err(err) => return Err(TelegramError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        let mut stalled = None;
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    self.back_off(&mut stalled, err)?;
                }
                Err(err) => return Err(TelegramError::Io(err)),
            }
        }
    }

    // Sleeps before the next attempt, or gives up once the stream has been
    // stalled for longer than the write timeout.
    fn back_off(&self, stalled: &mut Option<Instant>, err: std::io::Error) -> Result<()> {
        let since = *stalled.get_or_insert_with(Instant::now);
        if since.elapsed() >= self.write_timeout {
            return Err(TelegramError::Io(std::io::Error::new(
                ErrorKind::TimedOut,
                format!("write stalled: {err}"),
            )));
        }
        thread::sleep(WOULD_BLOCK_BACKOFF);
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
