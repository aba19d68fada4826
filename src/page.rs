//! Control page rendering.
//!
//! The response is a complete HTTP/1.0 message: status line, two headers and
//! an HTML document. There is no `Content-Length`; the connection is closed
//! after the write, which ends the body.

use core::fmt::{self, Write};

use crate::alarm::AlarmStatus;
use crate::sensors::Reading;

/// Default page buffer capacity in bytes.
pub const PAGE_CAPACITY: usize = 4096;

const STATUS_AND_HEADERS: &str =
    "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nPragma: no-cache\r\n\r\n";

/// Error building a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The page did not fit in the buffer.
    Overflow {
        /// Buffer capacity in bytes.
        capacity: usize,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow { capacity } => {
                write!(f, "page does not fit in {} byte buffer", capacity)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RenderError {}

/// Reusable response buffer, fully rewritten on every render.
pub struct PageBuffer<const N: usize = PAGE_CAPACITY> {
    text: heapless::String<N>,
}

impl<const N: usize> PageBuffer<N> {
    /// Create an empty page buffer.
    pub const fn new() -> Self {
        Self {
            text: heapless::String::new(),
        }
    }

    /// Render the control page for the given state.
    ///
    /// On overflow the buffer is left empty and nothing partial is returned.
    ///
    /// ```
    /// use fence_sentry::alarm::AlarmStatus;
    /// use fence_sentry::page::PageBuffer;
    /// use fence_sentry::sensors::Reading;
    ///
    /// let mut page: PageBuffer = PageBuffer::new();
    /// let bytes = page.render(&Reading::new(420, 72), AlarmStatus::Clear, 70).unwrap();
    /// assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
    /// ```
    pub fn render(
        &mut self,
        reading: &Reading,
        status: AlarmStatus,
        fence_mm: i32,
    ) -> Result<&[u8], RenderError> {
        self.text.clear();
        if write_page(&mut self.text, reading, status, fence_mm).is_err() {
            self.text.clear();
            return Err(RenderError::Overflow { capacity: N });
        }
        Ok(self.text.as_bytes())
    }

    /// Bytes of the last successful render.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Buffer capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for PageBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Markup
// =============================================================================

fn write_page<W: Write>(
    out: &mut W,
    reading: &Reading,
    status: AlarmStatus,
    fence_mm: i32,
) -> fmt::Result {
    out.write_str(STATUS_AND_HEADERS)?;
    out.write_str("<html>\r\n<body>\r\n")?;
    out.write_str("<meta http-equiv=\"refresh\" content=\"5\">")?;
    out.write_str("<style>h2 {text-align: center;}h3 {text-align: center;}</style>")?;
    out.write_str("<title>Proximity Security System</title>\r\n")?;
    out.write_str("<h2>Proximity Security System Control Panel</h2>\r\n")?;

    match status {
        AlarmStatus::Triggered => {
            out.write_str("<h3>WARNING!!! ALARM HAS BEEN TRIGGERED!</h3>\r\n")?;
            out.write_str("<body style=\"background-color:red;\">")?;
        }
        AlarmStatus::Clear => out.write_str("<body style=\"background-color:grey;\">")?,
    }
    out.write_str("<br /><hr>\r\n")?;

    write_heading(out, "Live Readings")?;
    write!(
        out,
        "<p><form method=\"POST\"><strong>Current Temperature: \
         <input type=\"text\" value=\"{}\"> <sup>O</sup>F",
        reading.temperature_f
    )?;
    out.write_str("<p><form method=\"POST\"><strong>Object Distance: ")?;
    if reading.no_object() {
        out.write_str("<input type=\"text\" value=\"No Object Detected!\"")?;
    } else {
        write!(
            out,
            "<input type=\"text\" value=\"{}\"> mm",
            reading.distance_mm
        )?;
    }

    out.write_str("<p> </p>")?;
    write_heading(out, "Security Settings")?;
    out.write_str("<p> </p>")?;
    write!(
        out,
        "<p><form method=\"POST\"><strong>Current Proximity Fence: \
         <input type=\"text\" value=\"{}\"> mm",
        fence_mm
    )?;
    out.write_str("<p> </p>")?;

    out.write_str("<label for=\"fenceNum\"><strong>New Proximity Fence: </strong></label>")?;
    out.write_str("<input type=\"text\" id=\"fenceNum\" name=\"fenceNum\"><br><br>")?;
    out.write_str("</strong><p><input type=\"submit\"></form></span>")?;
    out.write_str("</body>\r\n</html>\r\n")
}

fn write_heading<W: Write>(out: &mut W, title: &str) -> fmt::Result {
    write!(
        out,
        "<p style=\"text-decoration: underline;\"><strong>{}</strong></p>",
        title
    )
}
