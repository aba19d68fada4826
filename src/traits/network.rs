//! Network abstraction trait for the single-connection control listener.
//!
//! The control page is served over one TCP listener that handles exactly one
//! client at a time. Everything below the listener (Wi-Fi association, the
//! socket stack, the transport's own interrupt line) is hidden behind
//! [`Transport`].
//!
//! # Call Sequence
//!
//! ```text
//! init() -> connect(credentials) -> start_listener(port)
//! loop {
//!     wait_for_client(timeout)      - Ok(None) on timeout
//!     receive(buf, timeout)         - Ok(0) when the client closed
//!     send(page, timeout)           - returns bytes actually sent
//!     close_connection()
//! }
//! stop_listener()
//! ```
//!
//! Every call is fallible and bounded by a timeout; none of them may block
//! forever. The server treats mid-transfer failures as "client closed".

use core::net::{Ipv4Addr, SocketAddrV4};

use crate::config::WifiConfig;

/// Transport supplying one TCP listener with one active connection.
///
/// # Implementation Notes
///
/// - `wait_for_client` returns `Ok(None)` when the timeout elapses without a
///   client; `Err` is reserved for real faults
/// - `receive` returns `Ok(0)` when the peer has closed the connection
/// - `send` may return fewer bytes than requested; the server reports that
/// - At most one connection is open at any time
///
/// # Example Implementation
///
/// ```rust,ignore
/// use fence_sentry::traits::Transport;
///
/// struct Loopback { /* socket handles */ }
///
/// impl Transport for Loopback {
///     type Error = std::io::Error;
///     // ...
/// }
/// ```
pub trait Transport {
    /// Error type for transport operations.
    type Error: core::fmt::Debug;

    /// Bring up the transport module.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Join the network and return the local address.
    fn connect(&mut self, credentials: &WifiConfig) -> Result<Ipv4Addr, Self::Error>;

    /// Start listening on the given TCP port.
    fn start_listener(&mut self, port: u16) -> Result<(), Self::Error>;

    /// Wait up to `timeout_ms` for a client.
    ///
    /// Returns `Ok(None)` when no client arrived in time.
    fn wait_for_client(&mut self, timeout_ms: u32) -> Result<Option<SocketAddrV4>, Self::Error>;

    /// Read at most `buf.len()` bytes from the current connection.
    ///
    /// Returns the number of bytes written to the front of `buf`. Bytes past
    /// that count are left untouched.
    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Write `data` to the current connection, returning the number of bytes sent.
    fn send(&mut self, data: &[u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Close the current connection.
    fn close_connection(&mut self) -> Result<(), Self::Error>;

    /// Stop the listener.
    fn stop_listener(&mut self) -> Result<(), Self::Error>;
}
