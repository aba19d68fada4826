//! Request classification over the raw receive buffer.
//!
//! Only a handful of literal markers are recognized: `GET`, `POST`,
//! `stop_server=0` and `stop_server=1`. Nothing else in the request (path,
//! headers, encoding) is interpreted.

/// Receive buffer capacity in bytes.
pub const REQUEST_CAPACITY: usize = 1024;

const STOP_MARKER: &[u8] = b"stop_server";
const STOP_CONTINUE: &[u8] = b"stop_server=0";
const STOP_EXIT: &[u8] = b"stop_server=1";

/// What the server should do with a received request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Render the current state.
    Get,
    /// Extract the new fence, then render.
    Post,
    /// Neither marker present; nothing is sent back.
    Unknown,
}

/// Classify a received message.
///
/// `GET` is looked for first, anywhere in the message, then `POST`. A POST
/// whose body happens to contain `GET` is therefore served as a GET.
///
/// ```
/// use fence_sentry::request::{classify, RequestKind};
///
/// assert_eq!(classify(b"GET / HTTP/1.1\r\n"), RequestKind::Get);
/// assert_eq!(classify(b"POST / HTTP/1.1\r\n"), RequestKind::Post);
/// assert_eq!(classify(b"PUT / HTTP/1.1\r\n"), RequestKind::Unknown);
/// ```
pub fn classify(message: &[u8]) -> RequestKind {
    if contains(message, b"GET") {
        RequestKind::Get
    } else if contains(message, b"POST") {
        RequestKind::Post
    } else {
        RequestKind::Unknown
    }
}

/// Read the `stop_server` marker.
///
/// Returns `Some(false)` for `stop_server=0`, `Some(true)` for
/// `stop_server=1` and `None` when the marker is absent or carries any other
/// value. `=0` is checked before `=1`.
pub fn stop_request(message: &[u8]) -> Option<bool> {
    if !contains(message, STOP_MARKER) {
        None
    } else if contains(message, STOP_CONTINUE) {
        Some(false)
    } else if contains(message, STOP_EXIT) {
        Some(true)
    } else {
        None
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Fixed-capacity receive buffer, reused for every connection.
///
/// The buffer is never cleared between connections: a receive overwrites
/// only the bytes it delivers. Positional field extraction scans the whole
/// capacity, which is why consumed digits are overwritten with a sentinel.
pub struct RequestBuffer {
    bytes: [u8; REQUEST_CAPACITY],
    len: usize,
}

impl RequestBuffer {
    /// Create a zeroed buffer.
    pub const fn new() -> Self {
        Self {
            bytes: [0; REQUEST_CAPACITY],
            len: 0,
        }
    }

    /// Storage for the next receive. Resets the received length.
    pub fn recv_slot(&mut self) -> &mut [u8] {
        self.len = 0;
        &mut self.bytes
    }

    /// Record how many bytes the last receive delivered.
    pub fn set_received(&mut self, len: usize) {
        self.len = len.min(REQUEST_CAPACITY);
    }

    /// Bytes delivered by the last receive.
    pub fn received(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of bytes delivered by the last receive.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the last receive delivered nothing.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole buffer, including bytes left over from earlier requests.
    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Classify the bytes delivered by the last receive.
    pub fn kind(&self) -> RequestKind {
        classify(self.received())
    }

    /// Stop marker in the bytes delivered by the last receive.
    pub fn stop_request(&self) -> Option<bool> {
        stop_request(self.received())
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // classify Tests
    // =========================================================================

    #[test]
    fn get_and_post() {
        assert_eq!(classify(b"GET /favicon.ico HTTP/1.1"), RequestKind::Get);
        assert_eq!(classify(b"POST / HTTP/1.1\r\n\r\nfenceNum=80"), RequestKind::Post);
    }

    #[test]
    fn get_wins_over_post() {
        assert_eq!(classify(b"POST / HTTP/1.1\r\n\r\nnote=GET"), RequestKind::Get);
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(classify(b"get / HTTP/1.1"), RequestKind::Unknown);
        assert_eq!(classify(b"post / HTTP/1.1"), RequestKind::Unknown);
    }

    #[test]
    fn empty_and_garbage() {
        assert_eq!(classify(b""), RequestKind::Unknown);
        assert_eq!(classify(&[0xFF, 0x00, 0x47]), RequestKind::Unknown);
        assert_eq!(classify(b"GE"), RequestKind::Unknown);
    }

    // =========================================================================
    // stop_request Tests
    // =========================================================================

    #[test]
    fn stop_marker_values() {
        assert_eq!(stop_request(b"fenceNum=80&stop_server=1"), Some(true));
        assert_eq!(stop_request(b"fenceNum=80&stop_server=0"), Some(false));
        assert_eq!(stop_request(b"fenceNum=80"), None);
        assert_eq!(stop_request(b"stop_server=2"), None);
        assert_eq!(stop_request(b"stop_server"), None);
    }

    #[test]
    fn stop_continue_checked_first() {
        assert_eq!(stop_request(b"stop_server=1&stop_server=0"), Some(false));
    }

    // =========================================================================
    // RequestBuffer Tests
    // =========================================================================

    #[test]
    fn receive_keeps_stale_tail() {
        let mut buf = RequestBuffer::new();
        buf.recv_slot()[..8].copy_from_slice(b"POST 123");
        buf.set_received(8);
        assert_eq!(buf.kind(), RequestKind::Post);

        buf.recv_slot()[..3].copy_from_slice(b"XYZ");
        buf.set_received(3);
        assert_eq!(buf.received(), b"XYZ");
        assert_eq!(&buf.full_mut()[..8], b"XYZT 123");
        assert_eq!(buf.kind(), RequestKind::Unknown);
    }

    #[test]
    fn received_length_is_clamped() {
        let mut buf = RequestBuffer::new();
        buf.set_received(REQUEST_CAPACITY + 10);
        assert_eq!(buf.len(), REQUEST_CAPACITY);
        assert!(!buf.is_empty());
    }

    #[test]
    fn recv_slot_resets_length() {
        let mut buf = RequestBuffer::new();
        buf.set_received(5);
        let _ = buf.recv_slot();
        assert!(buf.is_empty());
    }
}
