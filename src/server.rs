//! Single-connection control server.
//!
//! [`ConnectionServer`] owns the transport and the two reusable buffers and
//! runs the serving cycle:
//!
//! ```text
//! Idle -> WaitingForClient -> Connected -> Dispatching -> Responding -> Idle
//!              |  timeout
//!              +-> poll sensors, wait again
//! ```
//!
//! One client is served at a time. Each connection gets exactly one bounded
//! receive and at most one response write, and is always closed afterwards.
//! Transport faults inside the loop are logged and never end it; only a
//! `stop_server=1` POST does.

use core::fmt;

use log::{debug, error, info, warn};

use crate::alarm::DeviceState;
use crate::config::{ServerConfig, WifiConfig};
use crate::form::extract_nth_field;
use crate::page::PageBuffer;
use crate::request::{RequestBuffer, RequestKind};
use crate::sensors::{Reading, SensorPoll};
use crate::traits::Transport;

/// Fatal bring-up failure from [`ConnectionServer::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerError<E> {
    /// The transport module could not be initialized.
    Init(E),
    /// The network could not be joined.
    Connect(E),
}

impl<E: fmt::Debug> fmt::Display for ServerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "transport init failed: {:?}", e),
            Self::Connect(e) => write!(f, "network connect failed: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for ServerError<E> {}

/// How one accepted connection ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Nothing was received; no page was sent.
    ClientClosed,
    /// The request carried neither `GET` nor `POST`; no page was sent.
    Ignored,
    /// A full page was written.
    Responded {
        /// Verb that was served.
        kind: RequestKind,
        /// `stop_server=1` was present.
        stop: bool,
    },
    /// The page could not be rendered or was not written in full.
    ResponseFailed {
        /// Verb that was served.
        kind: RequestKind,
        /// `stop_server=1` was present.
        stop: bool,
    },
}

impl ServeOutcome {
    /// Returns true if the client asked the server to stop.
    pub fn stop_requested(&self) -> bool {
        match self {
            Self::Responded { stop, .. } | Self::ResponseFailed { stop, .. } => *stop,
            Self::ClientClosed | Self::Ignored => false,
        }
    }
}

/// The accept/receive/dispatch/send loop around one connection at a time.
pub struct ConnectionServer<'a, T> {
    transport: T,
    state: &'a DeviceState,
    config: ServerConfig,
    request: RequestBuffer,
    page: PageBuffer,
}

impl<'a, T: Transport> ConnectionServer<'a, T> {
    /// Create a server over `transport` sharing `state`.
    pub fn new(transport: T, state: &'a DeviceState, config: ServerConfig) -> Self {
        Self {
            transport,
            state,
            config,
            request: RequestBuffer::new(),
            page: PageBuffer::new(),
        }
    }

    /// Bring up the transport and serve until a stop request.
    ///
    /// `init` and `connect` failures abort with a [`ServerError`]. A
    /// listener that fails to start is logged and serving proceeds anyway.
    pub fn run<P: SensorPoll>(
        &mut self,
        credentials: &WifiConfig,
        sensors: &mut P,
    ) -> Result<(), ServerError<T::Error>> {
        self.transport.init().map_err(ServerError::Init)?;
        info!("transport initialized");

        info!("connecting to {}", credentials.ssid);
        let address = self
            .transport
            .connect(credentials)
            .map_err(ServerError::Connect)?;
        info!("network joined, address {}", address);

        let port = self.config.port;
        match self.transport.start_listener(port) {
            Ok(()) => info!("server listening on {}:{}", address, port),
            Err(e) => error!("cannot start listener on port {}: {:?}", port, e),
        }

        self.serve(sensors);
        Ok(())
    }

    /// Serve connections until one carries `stop_server=1`, then stop the
    /// listener.
    pub fn serve<P: SensorPoll>(&mut self, sensors: &mut P) {
        sensors.poll(self.state);
        loop {
            if let Some(outcome) = self.accept_once(sensors) {
                if outcome.stop_requested() {
                    break;
                }
            }
        }

        info!("stop requested");
        match self.transport.stop_listener() {
            Ok(()) => info!("server stopped"),
            Err(e) => error!("cannot stop listener: {:?}", e),
        }
    }

    /// Wait once for a client and serve it.
    ///
    /// Returns `None` when the wait timed out or failed; the sensors are
    /// polled in that case before returning.
    pub fn accept_once<P: SensorPoll>(&mut self, sensors: &mut P) -> Option<ServeOutcome> {
        match self.transport.wait_for_client(self.config.accept_timeout_ms) {
            Ok(Some(peer)) => {
                info!("client connected {}", peer);
                let reading = sensors.latest();
                Some(self.serve_connection(&reading))
            }
            Ok(None) => {
                debug!("waiting for a connection");
                sensors.poll(self.state);
                None
            }
            Err(e) => {
                warn!("accept failed: {:?}", e);
                sensors.poll(self.state);
                None
            }
        }
    }

    /// Handle the currently accepted connection, then close it.
    pub fn serve_connection(&mut self, reading: &Reading) -> ServeOutcome {
        let outcome = self.dispatch(reading);
        if let Err(e) = self.transport.close_connection() {
            error!("failed to close connection: {:?}", e);
        }
        outcome
    }

    fn dispatch(&mut self, reading: &Reading) -> ServeOutcome {
        let received = match self
            .transport
            .receive(self.request.recv_slot(), self.config.receive_timeout_ms)
        {
            Ok(0) => {
                info!("client closed connection");
                return ServeOutcome::ClientClosed;
            }
            Ok(len) => len,
            Err(e) => {
                info!("client closed connection: {:?}", e);
                return ServeOutcome::ClientClosed;
            }
        };
        self.request.set_received(received);
        debug!("received {} byte(s)", self.request.len());

        let kind = self.request.kind();
        let stop = match kind {
            RequestKind::Get => false,
            RequestKind::Post => {
                info!("post request");
                self.apply_fence_update();
                self.request.stop_request().unwrap_or(false)
            }
            RequestKind::Unknown => {
                debug!("ignoring request without GET or POST");
                return ServeOutcome::Ignored;
            }
        };

        if self.respond(reading) {
            info!("page sent after {:?}", kind);
            ServeOutcome::Responded { kind, stop }
        } else {
            ServeOutcome::ResponseFailed { kind, stop }
        }
    }

    fn apply_fence_update(&mut self) {
        let index = self.config.fence_field_index;
        match extract_nth_field(self.request.full_mut(), index) {
            Some(digits) => {
                let fence = digits.value();
                let previous = self.state.fence.set(fence);
                info!("fence set to {} mm (was {} mm)", fence, previous);
            }
            None => debug!("no field {} in request, fence unchanged", index),
        }
    }

    fn respond(&mut self, reading: &Reading) -> bool {
        let status = self.state.alarm.status();
        let fence = self.state.fence.get();
        let page = match self.page.render(reading, status, fence) {
            Ok(page) => page,
            Err(e) => {
                error!("cannot render page: {}", e);
                return false;
            }
        };

        match self.transport.send(page, self.config.send_timeout_ms) {
            Ok(sent) if sent == page.len() => true,
            Ok(sent) => {
                error!("cannot send page: short write, {} of {} bytes", sent, page.len());
                false
            }
            Err(e) => {
                error!("cannot send page: {:?}", e);
                false
            }
        }
    }

    /// Shared device state.
    pub fn state(&self) -> &'a DeviceState {
        self.state
    }

    /// Access the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmStatus;
    use crate::hal::{MockCall, MockTransport};

    struct FixedPoll {
        reading: Reading,
        polls: usize,
    }

    impl FixedPoll {
        fn new(reading: Reading) -> Self {
            Self { reading, polls: 0 }
        }
    }

    impl SensorPoll for FixedPoll {
        fn poll(&mut self, state: &DeviceState) -> Reading {
            self.polls += 1;
            state.observe(self.reading.distance_mm);
            self.reading
        }

        fn latest(&self) -> Reading {
            self.reading
        }
    }

    const POST_PREFIX: &str = "POST / HTTP/1.1\r\nHost: 10.0.0.5\r\nCache-Control: max-age=0\r\n\
                               Cookie: a=1; b=2; c=3; d=4; e=5\r\n\r\n";

    fn post(body: &str) -> Vec<u8> {
        format!("{}{}", POST_PREFIX, body).into_bytes()
    }

    fn server(transport: MockTransport, state: &DeviceState) -> ConnectionServer<'_, MockTransport> {
        ConnectionServer::new(transport, state, ServerConfig::default())
    }

    // =========================================================================
    // serve_connection Tests
    // =========================================================================

    #[test]
    fn get_sends_one_page_then_closes() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client(b"GET / HTTP/1.1\r\n\r\n");
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(420, 72));

        let outcome = server.accept_once(&mut sensors);
        assert_eq!(
            outcome,
            Some(ServeOutcome::Responded {
                kind: RequestKind::Get,
                stop: false
            })
        );

        let transport = server.transport();
        assert_eq!(transport.responses.len(), 1);
        assert!(transport.responses[0].starts_with(b"HTTP/1.0 200 OK"));
        assert_eq!(transport.close_count, 1);
        assert_eq!(
            &transport.calls[transport.calls.len() - 2..],
            &[MockCall::Send, MockCall::Close]
        );
    }

    #[test]
    fn post_updates_fence() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client(&post("fenceNum=120"));
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(420, 72));

        server.accept_once(&mut sensors);
        assert_eq!(state.fence.get(), 120);
        let page = String::from_utf8(server.transport().responses[0].clone()).unwrap();
        assert!(page.contains("value=\"120\"> mm"));
    }

    #[test]
    fn post_without_field_keeps_fence() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client(b"POST / HTTP/1.1\r\n\r\nfenceNum=99");
        let mut server = server(transport, &state);

        server.accept_once(&mut FixedPoll::new(Reading::new(420, 72)));
        assert_eq!(state.fence.get(), 70);
        assert_eq!(server.transport().responses.len(), 1);
    }

    #[test]
    fn missing_verb_sends_nothing() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client(b"HELLO\r\n\r\n");
        let mut server = server(transport, &state);

        let outcome = server.accept_once(&mut FixedPoll::new(Reading::new(420, 72)));
        assert_eq!(outcome, Some(ServeOutcome::Ignored));
        assert!(server.transport().responses.is_empty());
        assert_eq!(server.transport().close_count, 1);
    }

    #[test]
    fn client_closed_sends_nothing() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client_closed();
        transport.queue_client_receive_fault();
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(420, 72));

        assert_eq!(
            server.accept_once(&mut sensors),
            Some(ServeOutcome::ClientClosed)
        );
        assert_eq!(
            server.accept_once(&mut sensors),
            Some(ServeOutcome::ClientClosed)
        );
        assert!(server.transport().responses.is_empty());
        assert_eq!(server.transport().close_count, 2);
    }

    #[test]
    fn short_write_is_reported_and_connection_closes() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_client(b"GET / HTTP/1.1\r\n\r\n");
        transport.send_limit = Some(10);
        let mut server = server(transport, &state);

        let outcome = server.accept_once(&mut FixedPoll::new(Reading::new(420, 72)));
        assert_eq!(
            outcome,
            Some(ServeOutcome::ResponseFailed {
                kind: RequestKind::Get,
                stop: false
            })
        );
        assert_eq!(server.transport().close_count, 1);
    }

    #[test]
    fn close_failure_is_not_fatal() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.fail_close = true;
        transport.queue_client(b"GET / HTTP/1.1\r\n\r\n");
        transport.queue_client(b"GET / HTTP/1.1\r\n\r\n");
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(420, 72));

        assert!(server.accept_once(&mut sensors).is_some());
        assert!(server.accept_once(&mut sensors).is_some());
        assert_eq!(server.transport().responses.len(), 2);
    }

    #[test]
    fn timeout_polls_sensors() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_timeout();
        transport.queue_wait_fault();
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(30, 72));

        assert_eq!(server.accept_once(&mut sensors), None);
        assert_eq!(sensors.polls, 1);
        assert_eq!(state.alarm.status(), AlarmStatus::Triggered);

        assert_eq!(server.accept_once(&mut sensors), None);
        assert_eq!(sensors.polls, 2);
    }

    // =========================================================================
    // run Tests
    // =========================================================================

    #[test]
    fn run_brings_up_transport_then_stops_on_request() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.queue_timeout();
        transport.queue_client(&post("fenceNum=080&stop_server=0"));
        transport.queue_client(&post("fenceNum=090&stop_server=1"));
        let mut server = server(transport, &state);
        let mut sensors = FixedPoll::new(Reading::new(420, 72));

        server.run(&WifiConfig::default(), &mut sensors).unwrap();

        let transport = server.transport();
        assert_eq!(
            &transport.calls[..3],
            &[MockCall::Init, MockCall::Connect, MockCall::StartListener(80)]
        );
        assert_eq!(transport.calls.last(), Some(&MockCall::StopListener));
        assert_eq!(transport.responses.len(), 2);
        assert_eq!(state.fence.get(), 90);
    }

    #[test]
    fn run_aborts_on_connect_failure() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.fail_connect = true;
        let mut server = server(transport, &state);

        let result = server.run(
            &WifiConfig::default(),
            &mut FixedPoll::new(Reading::new(420, 72)),
        );
        assert_eq!(result, Err(ServerError::Connect(())));
        assert!(!server
            .transport()
            .calls
            .iter()
            .any(|c| matches!(c, MockCall::StartListener(_))));
    }

    #[test]
    fn run_aborts_on_init_failure() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.fail_init = true;
        let mut server = server(transport, &state);

        let result = server.run(
            &WifiConfig::default(),
            &mut FixedPoll::new(Reading::new(420, 72)),
        );
        assert_eq!(result, Err(ServerError::Init(())));
    }

    #[test]
    fn listener_failure_still_serves() {
        let state = DeviceState::new(70);
        let mut transport = MockTransport::new();
        transport.fail_start_listener = true;
        transport.queue_client(&post("fenceNum=100&stop_server=1"));
        let mut server = server(transport, &state);

        server
            .run(
                &WifiConfig::default(),
                &mut FixedPoll::new(Reading::new(420, 72)),
            )
            .unwrap();
        assert_eq!(server.transport().responses.len(), 1);
    }

    #[test]
    fn error_display() {
        let err: ServerError<()> = ServerError::Connect(());
        assert_eq!(err.to_string(), "network connect failed: ()");
    }
}
