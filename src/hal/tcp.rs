//! `std::net` transport.
//!
//! Used on the desktop and, through ESP-IDF's BSD socket layer, on the
//! ESP32 as well. The listener runs non-blocking so accepts can be polled
//! against a deadline; an accepted stream is switched back to blocking and
//! bounded with socket read and write timeouts.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::WifiConfig;
use crate::traits::Transport;

const DEFAULT_ACCEPT_POLL: Duration = Duration::from_millis(10);

/// TCP transport error.
#[derive(Debug)]
pub enum TcpTransportError {
    /// Socket operation failed.
    Io(io::Error),
    /// No listener is running.
    NotListening,
    /// No client connection is open.
    NoConnection,
}

impl core::fmt::Display for TcpTransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "socket error: {}", e),
            Self::NotListening => write!(f, "listener not started"),
            Self::NoConnection => write!(f, "no open connection"),
        }
    }
}

impl std::error::Error for TcpTransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TcpTransportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// One listener, at most one open connection.
#[derive(Debug)]
pub struct TcpTransport {
    bind_address: Ipv4Addr,
    accept_poll: Duration,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Creates a transport that will listen on `bind_address`.
    pub fn new(bind_address: Ipv4Addr) -> Self {
        Self {
            bind_address,
            accept_poll: DEFAULT_ACCEPT_POLL,
            listener: None,
            stream: None,
        }
    }

    /// Sleep between non-blocking accept attempts.
    pub fn with_accept_poll(mut self, interval: Duration) -> Self {
        self.accept_poll = interval;
        self
    }

    /// Port the listener is bound to, if running.
    pub fn local_port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// Returns true while a client connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TcpTransportError> {
        self.stream.as_mut().ok_or(TcpTransportError::NoConnection)
    }
}

fn timeout(ms: u32) -> Option<Duration> {
    // A zero duration is rejected by the socket options
    Some(Duration::from_millis(u64::from(ms.max(1))))
}

impl Transport for TcpTransport {
    type Error = TcpTransportError;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn connect(&mut self, _credentials: &WifiConfig) -> Result<Ipv4Addr, Self::Error> {
        Ok(self.bind_address)
    }

    fn start_listener(&mut self, port: u16) -> Result<(), Self::Error> {
        let listener = TcpListener::bind(SocketAddrV4::new(self.bind_address, port))?;
        listener.set_nonblocking(true)?;
        self.listener = Some(listener);
        Ok(())
    }

    fn wait_for_client(&mut self, timeout_ms: u32) -> Result<Option<SocketAddrV4>, Self::Error> {
        let listener = self.listener.as_ref().ok_or(TcpTransportError::NotListening)?;
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));

        loop {
            match listener.accept() {
                Ok((stream, SocketAddr::V4(peer))) => {
                    stream.set_nonblocking(false)?;
                    self.stream = Some(stream);
                    return Ok(Some(peer));
                }
                Ok((_, SocketAddr::V6(peer))) => {
                    warn!("dropping IPv6 client {}", peer);
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    thread::sleep(self.accept_poll.min(deadline - now));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        let stream = self.stream()?;
        stream.set_read_timeout(timeout(timeout_ms))?;
        Ok(stream.read(buf)?)
    }

    fn send(&mut self, data: &[u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        let stream = self.stream()?;
        stream.set_write_timeout(timeout(timeout_ms))?;

        let mut sent = 0;
        while sent < data.len() {
            match stream.write(&data[sent..]) {
                Ok(0) => break,
                Ok(n) => sent += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if sent == 0 => return Err(e.into()),
                Err(e) => {
                    debug!("write stopped after {} bytes: {}", sent, e);
                    break;
                }
            }
        }
        stream.flush()?;
        Ok(sent)
    }

    fn close_connection(&mut self) -> Result<(), Self::Error> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        match stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn stop_listener(&mut self) -> Result<(), Self::Error> {
        self.stream = None;
        self.listener.take().map(drop).ok_or(TcpTransportError::NotListening)
    }
}
