use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream to one device: implements Read + Write.
///
/// Reads block for at most [`Transport::timeout`] and may return fewer bytes
/// than requested. A read that times out without data fails with
/// [`std::io::ErrorKind::TimedOut`].
pub trait Transport: Read + Write + Send {
    /// Set the per-operation timeout applied to subsequent reads.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Current per-operation timeout.
    fn timeout(&self) -> Duration;

    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&self) -> Result<usize>;

    /// Discard any received bytes not yet read.
    fn clear_input(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn bytes_available(&self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }
}
