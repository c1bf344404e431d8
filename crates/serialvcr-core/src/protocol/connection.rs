//! Connection management
//!
//! Handles the deck connection lifecycle and command execution.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;

use super::{
    commands::{ACK, ERROR, NAK},
    timecode::hex,
    Clock, Command, ProtocolError, SerialTransport, Status, StatusFlag, SystemClock, Table,
    TapeTimeCode, Transport, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS, POLL_INTERVAL,
    QUIESCENT_INTERVAL,
};

/// How long to wait for the deck to report REW/PLAY after the motion command
pub const MOTION_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcrConfig {
    /// Serial port name (e.g. "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Transport-level read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for VcrConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl VcrConfig {
    /// Configuration for a port with default settings
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// A connection to one deck.
///
/// Every operation is a blocking write-then-read exchange; `&mut self`
/// keeps calls strictly one at a time.
pub struct Vcr<T: Transport, C: Clock = SystemClock> {
    transport: T,
    clock: C,
    /// Metrics: cumulative bytes sent & received
    tx_bytes: u64,
    rx_bytes: u64,
}

impl Vcr<SerialTransport> {
    /// Open the configured serial port and select table 1
    pub fn open(config: &VcrConfig) -> Result<Self, ProtocolError> {
        let transport =
            SerialTransport::open(&config.port_name, config.baud_rate, config.read_timeout())?;
        tracing::info!("opened {} at {} baud", config.port_name, config.baud_rate);
        Self::new(transport)
    }
}

impl<T: Transport> Vcr<T> {
    /// Connect over an already open transport using the wall clock
    pub fn new(transport: T) -> Result<Self, ProtocolError> {
        Self::with_clock(transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> Vcr<T, C> {
    /// Connect over `transport`, taking time from `clock`.
    ///
    /// Sends JVC_TABLE_1 once. Some commands only work in table 1, so the
    /// deck is switched there in case it was left in table 2. A rejection or
    /// a silent deck (it may be powered off) is tolerated; any other
    /// transport failure is returned.
    pub fn with_clock(transport: T, clock: C) -> Result<Self, ProtocolError> {
        let mut vcr = Self {
            transport,
            clock,
            tx_bytes: 0,
            rx_bytes: 0,
        };

        match vcr.oneshot(Command::Table1) {
            Ok(()) => tracing::debug!("table 1 selected"),
            Err(ProtocolError::BadResponse { got, .. }) => {
                tracing::warn!("table 1 select answered {:#04X}, deck may be off", got)
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("no answer to table 1 select, deck may be off")
            }
            Err(e) => return Err(e),
        }

        Ok(vcr)
    }

    /// Cumulative (tx, rx) byte counters
    pub fn get_counters(&self) -> (u64, u64) {
        (self.tx_bytes, self.rx_bytes)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Release the connection, handing back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send a command and read its statically known reply
    pub fn converse(&mut self, command: Command) -> Result<Vec<u8>, ProtocolError> {
        self.converse_raw(command, command.reply_len(), command.sniffs_errors())
    }

    /// Send `command` and read exactly `num_bytes` back.
    ///
    /// With `sniff_errors`, a multi-byte reply is read one byte first. NAK or
    /// ERROR there means the deck rejected the command and will send nothing
    /// else, so the rest is never requested. This relies on no legitimate
    /// multi-byte reply starting with 0x0B or 0x02.
    ///
    /// The quiescent interval is always observed before returning, whatever
    /// the outcome.
    pub fn converse_raw(
        &mut self,
        command: Command,
        num_bytes: usize,
        sniff_errors: bool,
    ) -> Result<Vec<u8>, ProtocolError> {
        let result = self.exchange(command, num_bytes, sniff_errors);
        // The deck needs at least 5 ms after a reply before the next command
        self.clock.sleep(QUIESCENT_INTERVAL);
        result
    }

    fn exchange(
        &mut self,
        command: Command,
        num_bytes: usize,
        sniff_errors: bool,
    ) -> Result<Vec<u8>, ProtocolError> {
        tracing::debug!("-> {}", command);
        self.transport.write_bytes(&[command.opcode()])?;
        self.tx_bytes += 1;

        let data = if sniff_errors && num_bytes > 1 {
            let mut data = self.read_exact(1)?;
            let first = data[0];
            if first == NAK || first == ERROR {
                tracing::debug!("<- {:02X} ({} rejected)", first, command.name());
                return Err(ProtocolError::ErrorWhileReading { got: first });
            }
            data.extend(self.read_exact(num_bytes - 1)?);
            data
        } else {
            self.read_exact(num_bytes)?
        };

        tracing::debug!("<- {}", hex(&data));
        Ok(data)
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        let data = self.transport.read_exact_bytes(n)?;
        if data.len() != n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, transport returned {}", n, data.len()),
            )
            .into());
        }
        self.rx_bytes += n as u64;
        Ok(data)
    }

    fn converse_fixed<const N: usize>(
        &mut self,
        command: Command,
    ) -> Result<[u8; N], ProtocolError> {
        let data = self.converse_raw(command, N, command.sniffs_errors())?;
        <[u8; N]>::try_from(data).map_err(|data| -> ProtocolError {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} reply has {} bytes, expected {}", command.name(), data.len(), N),
            )
            .into()
        })
    }

    /// Send a command that answers with a single ACK
    pub fn oneshot(&mut self, command: Command) -> Result<(), ProtocolError> {
        let [got] = self.converse_fixed::<1>(command)?;
        if got != ACK {
            return Err(ProtocolError::BadResponse { expected: ACK, got });
        }
        Ok(())
    }

    /// Ask whether the device is a VCR. Anything but ACK is a "no".
    pub fn is_a_vcr(&mut self) -> Result<bool, ProtocolError> {
        let [reply] = self.converse_fixed::<1>(Command::VcrInquiry)?;
        Ok(reply == ACK)
    }

    /// Raw 4-byte device type
    pub fn device_type(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.converse(Command::DeviceTypeRequest)
    }

    /// Raw 3-byte ROM version
    pub fn rom_version(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.converse(Command::RomVersionRequest)
    }

    /// Read and decode the five status bytes
    pub fn status_sense(&mut self) -> Result<Status, ProtocolError> {
        let raw = self.converse_fixed::<5>(Command::StatusSense)?;
        Ok(Status::decode(raw))
    }

    /// Current control-track count
    pub fn get_ctl_time(&mut self) -> Result<TapeTimeCode, ProtocolError> {
        let data = self.converse_fixed::<8>(Command::CurrentCtlSense)?;
        TapeTimeCode::parse(&data)
    }

    /// Current longitudinal time code
    pub fn get_ltc_time(&mut self) -> Result<TapeTimeCode, ProtocolError> {
        let data = self.converse_fixed::<8>(Command::CurrentLtcSense)?;
        TapeTimeCode::parse(&data)
    }

    /// Poll the status once a second until `target` is reported.
    ///
    /// Returns `false` once `timeout` has elapsed without seeing the flag.
    /// With no timeout this polls until the flag shows up.
    pub fn wait_until_mode(
        &mut self,
        target: StatusFlag,
        timeout: Option<Duration>,
    ) -> Result<bool, ProtocolError> {
        let start = self.clock.now();
        loop {
            let status = self.status_sense()?;
            if status.contains(target) {
                return Ok(true);
            }
            if let Some(limit) = timeout {
                if self.clock.now().duration_since(start) >= limit {
                    tracing::debug!("gave up waiting for {} after {:?}", target, limit);
                    return Ok(false);
                }
            }
            self.clock.sleep(POLL_INTERVAL);
        }
    }

    /// Rewind and block until the deck stops at the beginning of the tape
    pub fn rewind_to_beginning(&mut self) -> Result<(), ProtocolError> {
        self.run_until_stopped(Command::Rewind, StatusFlag::Rew)
    }

    /// Play and block until the deck stops at the end of the tape
    pub fn play_to_end(&mut self) -> Result<(), ProtocolError> {
        self.run_until_stopped(Command::Play, StatusFlag::Play)
    }

    // The deck may already have finished moving by the first poll, so not
    // seeing the motion flag is not an error. Waiting for STOP is unbounded.
    fn run_until_stopped(
        &mut self,
        command: Command,
        motion: StatusFlag,
    ) -> Result<(), ProtocolError> {
        self.oneshot(command)?;
        tracing::info!("{} started", command.name());
        if !self.wait_until_mode(motion, Some(MOTION_START_TIMEOUT))? {
            tracing::debug!("never saw {}, deck may already be done", motion);
        }
        self.wait_until_mode(StatusFlag::Stop, None)?;
        tracing::info!("{} finished", command.name());
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Play)
    }

    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Stop)
    }

    pub fn still(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Still)
    }

    pub fn fast_forward(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::FastForward)
    }

    pub fn rewind(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Rewind)
    }

    pub fn eject(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Eject)
    }

    pub fn power_on(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::PowerOn)
    }

    pub fn power_off(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::PowerOff)
    }

    pub fn clear(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Clear)
    }

    /// Clear a latched ERROR so the deck accepts commands again
    pub fn clear_error(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::ClearError)
    }

    pub fn enter(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::Enter)
    }

    pub fn counter_reset(&mut self) -> Result<(), ProtocolError> {
        self.oneshot(Command::CounterReset)
    }

    pub fn select_table(&mut self, table: Table) -> Result<(), ProtocolError> {
        self.oneshot(table.command())
    }
}

impl<T: Transport + std::fmt::Debug, C: Clock> std::fmt::Debug for Vcr<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vcr")
            .field("transport", &self.transport)
            .field("tx_bytes", &self.tx_bytes)
            .field("rx_bytes", &self.rx_bytes)
            .finish()
    }
}
