use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::error::Result;
use crate::serial::DEFAULT_TIMEOUT;
use crate::traits::Transport;

/// In-memory transport with scripted inbound bytes.
///
/// Everything written is captured for inspection. Reads drain the inbound
/// queue; an empty queue fails with `TimedOut`, which is what a serial port
/// reports once its timeout elapses.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: BytesMut,
    outbound: Vec<u8>,
    timeout: Option<Duration>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose inbound queue already holds `bytes`.
    pub fn with_inbound(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_inbound(bytes);
        transport
    }

    /// Queue bytes as if the device had sent them.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend_from_slice(bytes);
    }

    /// Bytes still waiting to be read.
    pub fn pending_inbound(&self) -> &[u8] {
        &self.inbound
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Take everything written so far, leaving the capture empty.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.inbound.is_empty() {
            return Err(std::io::Error::new(
                ErrorKind::TimedOut,
                "no inbound data before timeout",
            ));
        }

        let n = buf.len().min(self.inbound.len());
        buf[..n].copy_from_slice(&self.inbound[..n]);
        self.inbound.advance(n);
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = Some(timeout);
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    fn bytes_available(&self) -> Result<usize> {
        Ok(self.inbound.len())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.inbound.clear();
        Ok(())
    }
}
