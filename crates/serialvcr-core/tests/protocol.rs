use pretty_assertions::assert_eq;
use serialvcr_core::protocol::{
    Clock, Command, ProtocolError, StatusFlag, TapeTimeCode, Transport, Vcr, ACK, ERROR, NAK,
    POLL_INTERVAL, QUIESCENT_INTERVAL,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

/// Mock serial link with a scripted reply stream
#[derive(Debug, Default)]
struct MockSerial {
    replies: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    read_requests: Vec<usize>,
    fail_on_send: bool,
}

impl MockSerial {
    fn with_response(response: &[u8]) -> Self {
        Self {
            replies: response.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Opcodes written so far, one per write call
    fn sent_opcodes(&self) -> Vec<u8> {
        self.writes.iter().flatten().copied().collect()
    }
}

impl Transport for MockSerial {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_on_send {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "serial write failed"));
        }
        self.writes.push(data.to_vec());
        Ok(())
    }

    fn read_exact_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.read_requests.push(n);
        if self.replies.len() < n {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
        }
        Ok(self.replies.drain(..n).collect())
    }
}

/// Clock that only moves when slept on
struct FakeClock {
    now: Cell<Instant>,
    sleeps: RefCell<Vec<Duration>>,
}

impl FakeClock {
    fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    fn poll_sleeps(&self) -> usize {
        self.sleeps
            .borrow()
            .iter()
            .filter(|d| **d == POLL_INTERVAL)
            .count()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.sleeps.borrow_mut().push(duration);
    }
}

/// Connect with the table-select handshake acknowledged, then queue `script`
fn connect(script: &[u8]) -> Vcr<MockSerial, FakeClock> {
    let mut replies = vec![ACK];
    replies.extend_from_slice(script);
    Vcr::with_clock(MockSerial::with_response(&replies), FakeClock::new()).unwrap()
}

fn status(bytes: [u8; 5]) -> Vec<u8> {
    bytes.to_vec()
}

const STOPPED: [u8; 5] = [0x00, 0x00, 0x00, 0x10, 0x00];
const REWINDING: [u8; 5] = [0x00, 0x00, 0x00, 0x20, 0x0B];
const PLAYING: [u8; 5] = [0x00, 0x00, 0x00, 0x80, 0x05];

#[test]
fn test_connect_selects_table_one() {
    let vcr = connect(&[]);
    assert_eq!(vcr.transport().sent_opcodes(), vec![0xF6]);
    assert_eq!(vcr.transport().read_requests, vec![1]);
    assert_eq!(*vcr.clock().sleeps.borrow(), vec![QUIESCENT_INTERVAL]);
}

#[test]
fn test_connect_tolerates_nak() {
    let vcr = Vcr::with_clock(MockSerial::with_response(&[NAK]), FakeClock::new());
    assert!(vcr.is_ok());
}

#[test]
fn test_connect_tolerates_silent_deck() {
    let vcr = Vcr::with_clock(MockSerial::default(), FakeClock::new());
    assert!(vcr.is_ok());
}

#[test]
fn test_connect_propagates_write_failure() {
    let mock = MockSerial {
        fail_on_send: true,
        ..MockSerial::default()
    };
    let result = Vcr::with_clock(mock, FakeClock::new());
    assert!(matches!(result, Err(ProtocolError::TransportFailure(_))));
}

#[test]
fn test_converse_read_pattern_for_every_command() {
    for command in Command::ALL {
        let len = command.reply_len();
        let mut vcr = connect(&vec![b'0'; len]);
        let reply = vcr.converse(command).unwrap();
        assert_eq!(reply.len(), len, "{}", command);

        let mock = vcr.transport();
        assert_eq!(mock.writes[1..].to_vec(), vec![vec![command.opcode()]], "{}", command);
        let expected_reads = if command.sniffs_errors() {
            vec![1, len - 1]
        } else {
            vec![len]
        };
        assert_eq!(mock.read_requests[1..].to_vec(), expected_reads, "{}", command);
    }
}

#[test]
fn test_sniffed_nak_stops_reading() {
    let mut vcr = connect(&[NAK, b'0', b'0', b'0', b'0', b'0', b'0', b'0']);
    let result = vcr.converse(Command::CurrentCtlSense);
    assert!(matches!(
        result,
        Err(ProtocolError::ErrorWhileReading { got: 0x0B })
    ));
    assert_eq!(vcr.transport().read_requests, vec![1, 1]);
    assert_eq!(vcr.transport().replies.len(), 7);
}

#[test]
fn test_sniffed_error_byte() {
    let mut vcr = connect(&[ERROR]);
    let result = vcr.get_ltc_time();
    assert!(matches!(
        result,
        Err(ProtocolError::ErrorWhileReading { got: 0x02 })
    ));
}

#[test]
fn test_quiescent_interval_after_failure() {
    let mut vcr = connect(&[NAK]);
    let _ = vcr.get_ctl_time();
    let _ = vcr.status_sense(); // nothing queued: transport times out
    assert_eq!(
        *vcr.clock().sleeps.borrow(),
        vec![QUIESCENT_INTERVAL, QUIESCENT_INTERVAL, QUIESCENT_INTERVAL]
    );
}

#[test]
fn test_oneshot_nak_is_bad_response() {
    let mut vcr = connect(&[NAK]);
    match vcr.oneshot(Command::PowerOn) {
        Err(ProtocolError::BadResponse { expected, got }) => {
            assert_eq!(expected, 0x0A);
            assert_eq!(got, 0x0B);
        }
        other => panic!("expected BadResponse, got {:?}", other),
    }
}

#[test]
fn test_oneshot_ack() {
    let mut vcr = connect(&[ACK, ACK]);
    vcr.power_on().unwrap();
    vcr.eject().unwrap();
    assert_eq!(vcr.transport().sent_opcodes(), vec![0xF6, 0x7B, 0xA3]);
}

#[test]
fn test_is_a_vcr() {
    let mut vcr = connect(&[ACK, NAK]);
    assert!(vcr.is_a_vcr().unwrap());
    assert!(!vcr.is_a_vcr().unwrap());
}

#[test]
fn test_inquiries_return_raw_bytes() {
    let mut vcr = connect(&[0x20, 0x21, 0x22, 0x23, 0x01, 0x02, 0x03]);
    assert_eq!(vcr.device_type().unwrap(), vec![0x20, 0x21, 0x22, 0x23]);
    assert_eq!(vcr.rom_version().unwrap(), vec![0x01, 0x02, 0x03]);
    assert_eq!(vcr.get_counters(), (3, 8));
}

#[test]
fn test_status_sense() {
    let mut vcr = connect(&[0x08, 0x00, 0x00, 0x00, 0x00]);
    let status = vcr.status_sense().unwrap();
    assert_eq!(status.labels(), vec!["CASSETTE OUT", "STILL"]);
    assert_eq!(status.raw, [0x08, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn test_ctl_time() {
    let mut vcr = connect(b"01023512");
    let tc = vcr.get_ctl_time().unwrap();
    assert_eq!(
        tc,
        TapeTimeCode {
            hours: 1,
            minutes: 2,
            seconds: 35,
            frames: 12
        }
    );
}

#[test]
fn test_transport_failure_not_retried() {
    let mut vcr = connect(&[]);
    let result = vcr.status_sense();
    assert!(matches!(result, Err(ProtocolError::TransportFailure(_))));
    assert_eq!(vcr.transport().writes.len(), 2);
}

#[test]
fn test_wait_until_mode_zero_timeout() {
    let mut vcr = connect(&STOPPED);
    let reached = vcr
        .wait_until_mode(StatusFlag::Play, Some(Duration::ZERO))
        .unwrap();
    assert!(!reached);
    assert_eq!(vcr.transport().writes.len(), 2);
    assert_eq!(vcr.clock().poll_sleeps(), 0);
}

#[test]
fn test_wait_until_mode_reached() {
    let script = [status(REWINDING), status(REWINDING), status(STOPPED)].concat();
    let mut vcr = connect(&script);
    let reached = vcr.wait_until_mode(StatusFlag::Stop, None).unwrap();
    assert!(reached);
    assert_eq!(vcr.clock().poll_sleeps(), 2);
    assert!(vcr.transport().replies.is_empty());
}

#[test]
fn test_wait_until_mode_times_out() {
    let script = [REWINDING; 4].concat();
    let mut vcr = connect(&script);
    let reached = vcr
        .wait_until_mode(StatusFlag::Stop, Some(Duration::from_secs(3)))
        .unwrap();
    assert!(!reached);
    // Polls at roughly 0s, 1s, 2s and 3s
    assert_eq!(vcr.transport().writes.len(), 5);
    assert!(vcr.transport().replies.is_empty());
}

#[test]
fn test_rewind_to_beginning() {
    let mut script = vec![ACK];
    script.extend([status(REWINDING), status(REWINDING), status(STOPPED)].concat());
    let mut vcr = connect(&script);
    vcr.rewind_to_beginning().unwrap();
    assert_eq!(
        vcr.transport().sent_opcodes(),
        vec![0xF6, 0xAC, 0xD7, 0xD7, 0xD7]
    );
}

#[test]
fn test_rewind_when_deck_already_stopped() {
    // REW is never reported, so the bounded wait runs out (11 polls over
    // 10s) before one more poll sees STOP.
    let mut script = vec![ACK];
    for _ in 0..12 {
        script.extend(STOPPED);
    }
    let mut vcr = connect(&script);
    vcr.rewind_to_beginning().unwrap();
    assert!(vcr.transport().replies.is_empty());
    assert_eq!(vcr.transport().writes.len(), 2 + 12);
}

#[test]
fn test_rewind_rejected() {
    let mut vcr = connect(&[NAK]);
    let result = vcr.rewind_to_beginning();
    assert!(matches!(result, Err(ProtocolError::BadResponse { .. })));
    assert_eq!(vcr.transport().writes.len(), 2);
}

#[test]
fn test_play_to_end() {
    let mut script = vec![ACK];
    script.extend([status(PLAYING), status(STOPPED)].concat());
    let mut vcr = connect(&script);
    vcr.play_to_end().unwrap();
    assert_eq!(vcr.transport().sent_opcodes(), vec![0xF6, 0x3A, 0xD7, 0xD7]);
}
