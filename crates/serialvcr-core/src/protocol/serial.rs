//! Serial port handling
//!
//! Provides low-level serial port access for the deck's RS-232C link.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

use super::{ProtocolError, Transport, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};

/// Open a serial port with default settings
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
    read_timeout: Option<Duration>,
) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    let timeout = read_timeout.unwrap_or(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS));

    tracing::debug!("opening {} at {} baud (read timeout {:?})", name, baud, timeout);
    Ok(serialport::new(name, baud).timeout(timeout).open()?)
}

/// Configure a serial port for the deck: 8N1, no flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;
    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    Ok(port.clear(serialport::ClearBuffer::All)?)
}

/// [`Transport`] over a real serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open, configure and flush the named port
    pub fn open(
        name: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self, ProtocolError> {
        let mut port = open_port(name, Some(baud_rate), Some(read_timeout))?;
        configure_port(port.as_mut())?;
        // Drop anything a previous session left unread
        clear_buffers(port.as_mut())?;
        Ok(Self { port })
    }

    /// Wrap an already opened port
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_exact_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.port.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port.name())
            .finish()
    }
}
