//! Byte transport seam
//!
//! The engine only needs to write bytes and block until an exact number of
//! bytes has been read. [`SerialTransport`](super::serial::SerialTransport)
//! is the hardware implementation; tests drive the engine with scripted
//! transports instead.

use std::io;

/// Blocking, byte-oriented link to one deck
pub trait Transport {
    /// Write every byte in `data`
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;

    /// Block until exactly `n` bytes have arrived.
    ///
    /// Never returns a short buffer: either `n` bytes or an error.
    fn read_exact_bytes(&mut self, n: usize) -> io::Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_bytes(data)
    }

    fn read_exact_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        (**self).read_exact_bytes(n)
    }
}
