//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every collaborator trait, so the
//! whole device can be exercised on a desktop.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockDistance`] | [`DistanceSensor`] | Queued ranges and faults |
//! | [`MockTemperature`] | [`TemperatureSensor`] | Queued readings and faults |
//! | [`MockIndicator`] | [`Indicator`] | Records every output write |
//! | [`MockTransport`] | [`Transport`] | Scripted clients, captured pages |
//! | [`MockI2c`] | `embedded_hal::i2c::I2c` | Register-file I2C target |
//!
//! # Example
//!
//! ```rust
//! use fence_sentry::alarm::DeviceState;
//! use fence_sentry::config::SensorConfig;
//! use fence_sentry::hal::{MockDistance, MockTemperature};
//! use fence_sentry::sensors::{Monitor, SensorPoll, SensorSource};
//!
//! let mut distance = MockDistance::new();
//! distance.queue_mm(&[100]);
//! let mut temperature = MockTemperature::new();
//! temperature.queue_c(&[22]);
//!
//! let state = DeviceState::new(70);
//! let mut monitor = Monitor::new(SensorSource::new(
//!     distance,
//!     temperature,
//!     &SensorConfig::default(),
//! ));
//!
//! let reading = monitor.poll(&state);
//! assert_eq!(reading.distance_mm, 50);
//! assert!(state.alarm.is_triggered());
//! ```
//!
//! [`DistanceSensor`]: crate::traits::DistanceSensor
//! [`TemperatureSensor`]: crate::traits::TemperatureSensor
//! [`Indicator`]: crate::traits::Indicator
//! [`Transport`]: crate::traits::Transport

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::net::{Ipv4Addr, SocketAddrV4};

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::config::WifiConfig;
use crate::traits::{DistanceSensor, Indicator, TemperatureSensor, Transport};

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock time-of-flight sensor.
///
/// Readings come out in the order they were queued. An empty queue reads as
/// a fault.
#[derive(Debug, Default)]
pub struct MockDistance {
    /// Queued results for `read_distance_mm()`.
    pub readings: VecDeque<Result<u16, ()>>,
    /// Number of reads performed.
    pub read_count: usize,
}

impl MockDistance {
    /// Creates a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw ranges in millimeters.
    pub fn queue_mm(&mut self, ranges: &[u16]) {
        self.readings.extend(ranges.iter().copied().map(Ok));
    }

    /// Queue one failed read.
    pub fn queue_fault(&mut self) {
        self.readings.push_back(Err(()));
    }
}

impl DistanceSensor for MockDistance {
    type Error = ();

    fn read_distance_mm(&mut self) -> Result<u16, ()> {
        self.read_count += 1;
        self.readings.pop_front().unwrap_or(Err(()))
    }
}

/// Mock temperature sensor.
#[derive(Debug, Default)]
pub struct MockTemperature {
    /// Queued results for `read_temperature_c()`.
    pub readings: VecDeque<Result<u8, ()>>,
}

impl MockTemperature {
    /// Creates a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue readings in degrees Celsius.
    pub fn queue_c(&mut self, readings: &[u8]) {
        self.readings.extend(readings.iter().copied().map(Ok));
    }

    /// Queue one failed read.
    pub fn queue_fault(&mut self) {
        self.readings.push_back(Err(()));
    }
}

impl TemperatureSensor for MockTemperature {
    type Error = ();

    fn read_temperature_c(&mut self) -> Result<u8, ()> {
        self.readings.pop_front().unwrap_or(Err(()))
    }
}

// ============================================================================
// Indicator Mock
// ============================================================================

/// Mock indicator output recording every write.
#[derive(Debug, Default)]
pub struct MockIndicator {
    /// Current output level.
    pub lit: bool,
    /// Every level written, in order.
    pub writes: Vec<bool>,
    /// When set, writes fail and the level is left unchanged.
    pub fail: bool,
}

impl MockIndicator {
    /// Creates an unlit indicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Current output level.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Every level written so far.
    pub fn history(&self) -> &[bool] {
        &self.writes
    }
}

impl Indicator for MockIndicator {
    type Error = ();

    fn set_lit(&mut self, lit: bool) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.lit = lit;
        self.writes.push(lit);
        Ok(())
    }
}

// ============================================================================
// Network Mock
// ============================================================================

/// A transport call recorded by [`MockTransport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockCall {
    /// `init()`
    Init,
    /// `connect()`
    Connect,
    /// `start_listener(port)`
    StartListener(u16),
    /// `wait_for_client()`
    Wait,
    /// `receive()`
    Receive,
    /// `send()`
    Send,
    /// `close_connection()`
    Close,
    /// `stop_listener()`
    StopListener,
}

#[derive(Debug)]
enum Accept {
    Timeout,
    Fault,
    Client {
        peer: SocketAddrV4,
        request: Result<Vec<u8>, ()>,
    },
}

/// Scripted single-connection transport.
///
/// Each `wait_for_client()` consumes one scripted accept: a timeout, a
/// fault, or a client with the bytes it will send. Pages written with
/// `send()` are captured in [`responses`](Self::responses).
///
/// # Panics
///
/// `wait_for_client()` panics once the script is exhausted, so a test that
/// never reaches its stop request fails instead of spinning.
///
/// # Example
///
/// ```rust
/// use fence_sentry::hal::MockTransport;
/// use fence_sentry::traits::Transport;
///
/// let mut transport = MockTransport::new();
/// transport.queue_client(b"GET / HTTP/1.1\r\n\r\n");
///
/// assert!(transport.wait_for_client(1000).unwrap().is_some());
/// let mut buf = [0u8; 64];
/// assert_eq!(transport.receive(&mut buf, 1000), Ok(18));
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Every call made, in order.
    pub calls: Vec<MockCall>,
    /// Every buffer passed to `send()` (truncated to `send_limit`).
    pub responses: Vec<Vec<u8>>,
    /// Number of `close_connection()` calls.
    pub close_count: usize,
    /// Address returned by `connect()`.
    pub local_address: Ipv4Addr,
    /// Maximum bytes accepted per `send()`; `None` accepts everything.
    pub send_limit: Option<usize>,
    /// Fail `init()`.
    pub fail_init: bool,
    /// Fail `connect()`.
    pub fail_connect: bool,
    /// Fail `start_listener()`.
    pub fail_start_listener: bool,
    /// Fail `send()`.
    pub fail_send: bool,
    /// Fail `close_connection()`.
    pub fail_close: bool,
    /// Fail `stop_listener()`.
    pub fail_stop_listener: bool,
    script: VecDeque<Accept>,
    current: Option<Result<Vec<u8>, ()>>,
    next_peer_port: u16,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            responses: Vec::new(),
            close_count: 0,
            local_address: Ipv4Addr::new(192, 168, 1, 20),
            send_limit: None,
            fail_init: false,
            fail_connect: false,
            fail_start_listener: false,
            fail_send: false,
            fail_close: false,
            fail_stop_listener: false,
            script: VecDeque::new(),
            current: None,
            next_peer_port: 50_000,
        }
    }
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an accept timeout.
    pub fn queue_timeout(&mut self) {
        self.script.push_back(Accept::Timeout);
    }

    /// Queue a failed accept.
    pub fn queue_wait_fault(&mut self) {
        self.script.push_back(Accept::Fault);
    }

    /// Queue a client that sends `request`.
    pub fn queue_client(&mut self, request: &[u8]) {
        self.push_client(Ok(request.to_vec()));
    }

    /// Queue a client that closes before sending anything.
    pub fn queue_client_closed(&mut self) {
        self.push_client(Ok(Vec::new()));
    }

    /// Queue a client whose receive fails.
    pub fn queue_client_receive_fault(&mut self) {
        self.push_client(Err(()));
    }

    /// Number of scripted accepts not yet consumed.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    fn push_client(&mut self, request: Result<Vec<u8>, ()>) {
        let peer = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 50), self.next_peer_port);
        self.next_peer_port = self.next_peer_port.wrapping_add(1);
        self.script.push_back(Accept::Client { peer, request });
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        self.calls.push(MockCall::Init);
        if self.fail_init {
            Err(())
        } else {
            Ok(())
        }
    }

    fn connect(&mut self, _credentials: &WifiConfig) -> Result<Ipv4Addr, ()> {
        self.calls.push(MockCall::Connect);
        if self.fail_connect {
            Err(())
        } else {
            Ok(self.local_address)
        }
    }

    fn start_listener(&mut self, port: u16) -> Result<(), ()> {
        self.calls.push(MockCall::StartListener(port));
        if self.fail_start_listener {
            Err(())
        } else {
            Ok(())
        }
    }

    fn wait_for_client(&mut self, _timeout_ms: u32) -> Result<Option<SocketAddrV4>, ()> {
        self.calls.push(MockCall::Wait);
        match self.script.pop_front() {
            Some(Accept::Timeout) => Ok(None),
            Some(Accept::Fault) => Err(()),
            Some(Accept::Client { peer, request }) => {
                self.current = Some(request);
                Ok(Some(peer))
            }
            None => panic!("MockTransport: accept script exhausted"),
        }
    }

    fn receive(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        self.calls.push(MockCall::Receive);
        let request = self.current.as_ref().ok_or(())?.as_ref().map_err(|_| ())?;
        let len = request.len().min(buf.len());
        buf[..len].copy_from_slice(&request[..len]);
        Ok(len)
    }

    fn send(&mut self, data: &[u8], _timeout_ms: u32) -> Result<usize, ()> {
        self.calls.push(MockCall::Send);
        if self.fail_send {
            return Err(());
        }
        let len = self.send_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.responses.push(data[..len].to_vec());
        Ok(len)
    }

    fn close_connection(&mut self) -> Result<(), ()> {
        self.calls.push(MockCall::Close);
        self.close_count += 1;
        self.current = None;
        if self.fail_close {
            Err(())
        } else {
            Ok(())
        }
    }

    fn stop_listener(&mut self) -> Result<(), ()> {
        self.calls.push(MockCall::StopListener);
        if self.fail_stop_listener {
            Err(())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// I2C Mock
// ============================================================================

/// Register-file I2C target.
///
/// A write transfer sets the register pointer from its first byte and stores
/// the rest at consecutive registers. A read transfer returns bytes from the
/// pointer onward. Registers listed in `strobes` read back as zero after
/// being written, like self-clearing start bits.
#[derive(Debug)]
pub struct MockI2c {
    /// 7-bit address the target answers to.
    pub address: u8,
    /// Register contents.
    pub registers: [u8; 256],
    /// Every `(register, value)` written, in order.
    pub writes: Vec<(u8, u8)>,
    /// Registers that clear themselves after a write.
    pub strobes: Vec<u8>,
    /// When set, every transaction fails with a bus error.
    pub fail: bool,
    pointer: u8,
}

impl MockI2c {
    /// Creates a zeroed target at `address`.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 256],
            writes: Vec::new(),
            strobes: Vec::new(),
            fail: false,
            pointer: 0,
        }
    }

    /// Set a register value.
    pub fn set(&mut self, register: u8, value: u8) {
        self.registers[usize::from(register)] = value;
    }

    /// Values written to `register`, in order.
    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == register)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), ErrorKind> {
        if self.fail {
            return Err(ErrorKind::Bus);
        }
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((register, data)) = bytes.split_first() else {
                        continue;
                    };
                    self.pointer = *register;
                    for value in data {
                        let register = self.pointer;
                        self.writes.push((register, *value));
                        self.registers[usize::from(register)] = if self.strobes.contains(&register) {
                            0
                        } else {
                            *value
                        };
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.registers[usize::from(self.pointer)];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
