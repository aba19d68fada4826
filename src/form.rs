//! Fixed-position form field extraction.
//!
//! The control page's POST carries the new fence value after a known number
//! of `=` characters in the raw request (request line, headers and
//! `fenceNum=...` body counted together). This is not a form decoder: it
//! counts separators and reads the two or three bytes that follow.
//!
//! # Buffer Reuse and the Sentinel
//!
//! The request buffer is reused across connections without being cleared. A
//! 2-digit value arriving after a 3-digit value at the same offset would see
//! the old third digit still sitting in the buffer. When a third digit is
//! consumed it is overwritten with [`SENTINEL`], so the next request reads a
//! non-digit there and takes the 2-digit path.
//!
//! ```text
//! request 1:  ...fenceNum=150      buffer after: ...fenceNum=15*
//! request 2:  ...fenceNum=45       buffer:       ...fenceNum=45*  -> 45
//! ```
//!
//! # Example
//!
//! ```rust
//! use fence_sentry::form::extract_nth_field;
//!
//! let mut buf = *b"a=1&b=2&fenceNum=120";
//! let digits = extract_nth_field(&mut buf, 3).unwrap();
//! assert_eq!(digits.value(), 120);
//! assert_eq!(&buf[17..], b"12*");
//! ```

/// Byte written over a consumed third digit.
pub const SENTINEL: u8 = b'*';

const FIELD_SEPARATOR: u8 = b'=';

/// Three composed digit slots, most significant first.
///
/// Slots hold raw bytes; on the 2-digit path they may not be digits at all.
/// [`value`](Self::value) applies `atoi` semantics to make sense of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digits(pub [u8; 3]);

impl Digits {
    /// The composed bytes.
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    /// Decimal value of the leading digits; anything unparseable is 0.
    pub fn value(&self) -> i32 {
        atoi(&self.0)
    }
}

impl Default for Digits {
    fn default() -> Self {
        Self([b'0'; 3])
    }
}

/// Locate the `n`-th `=` in `buf` and compose the value that follows it.
///
/// - If the byte three past the separator is a digit, the value has three
///   digits: that byte becomes the last slot and is replaced in `buf` by
///   [`SENTINEL`]; the two bytes before it fill the first two slots only if
///   they are digits (otherwise the slot stays `'0'`).
/// - Otherwise the value has two digits: the slots are `'0'` followed by the
///   two raw bytes after the separator.
///
/// Scanning stops at the `n`-th separator. Offsets past the end of `buf`
/// read as NUL. Returns `None` when `buf` holds fewer than `n` separators
/// (or `n` is zero).
pub fn extract_nth_field(buf: &mut [u8], n: usize) -> Option<Digits> {
    if n == 0 {
        return None;
    }

    let at = buf
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == FIELD_SEPARATOR)
        .nth(n - 1)
        .map(|(i, _)| i)?;

    let byte_at = |buf: &[u8], offset: usize| buf.get(at + offset).copied().unwrap_or(0);
    let mut digits = Digits::default();

    let third = byte_at(buf, 3);
    if third.is_ascii_digit() {
        digits.0[2] = third;
        buf[at + 3] = SENTINEL;

        let first = byte_at(buf, 1);
        if first.is_ascii_digit() {
            digits.0[0] = first;
        }
        let second = byte_at(buf, 2);
        if second.is_ascii_digit() {
            digits.0[1] = second;
        }
    } else {
        digits.0[1] = byte_at(buf, 1);
        digits.0[2] = byte_at(buf, 2);
    }

    Some(digits)
}

/// C `atoi` over a byte slice: optional leading whitespace and sign, then
/// decimal digits up to the first non-digit. No digits gives 0.
pub fn atoi(bytes: &[u8]) -> i32 {
    let mut rest = bytes;
    while let [b, tail @ ..] = rest {
        if b.is_ascii_whitespace() {
            rest = tail;
        } else {
            break;
        }
    }

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let magnitude = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i32, |acc, b| {
            acc.wrapping_mul(10).wrapping_add(i32::from(b - b'0'))
        });

    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}
