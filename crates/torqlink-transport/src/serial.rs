use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Default line speed of the transducer family.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default per-byte read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/// Serial line settings. Framing is fixed at 8 data bits, no parity, 1 stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM7`.
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Timeout applied to each blocking read.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Settings for `port` with default baud rate and timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Serial port transport.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open the port described by `config` and discard stale input.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        port.clear(ClearBuffer::Input)?;
        info!(port = %config.port, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        let name = port.name().unwrap_or_else(|| "<unnamed>".to_string());
        Self { port, name }
    }

    /// Port name for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured line speed.
    pub fn baud_rate(&self) -> Result<u32> {
        Ok(self.port.baud_rate()?)
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialTransport {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port.set_timeout(timeout)?;
        debug!(port = %self.name, ?timeout, "serial timeout updated");
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.port.timeout()
    }

    fn bytes_available(&self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn clear_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.name)
            .finish()
    }
}
