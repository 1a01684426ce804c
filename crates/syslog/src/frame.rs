//! Stream framing for TCP/TLS transports
//!
//! Two framings per RFC 6587:
//!
//! - **Non-transparent**: messages delimited by LF (CRLF tolerated). Lines
//!   beyond the size cap are truncated in place - the prefix becomes one
//!   record and the overflow is discarded.
//! - **Octet-counting** (also RFC 5425 for TLS): a decimal length prefix and
//!   a single space, then exactly that many payload bytes.
//!
//! Both readers are bounded: no frame ever allocates more than the caller's
//! size cap.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt};

/// Maximum frame size accepted on any transport (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Longest accepted octet-count prefix (5 digits covers the 64 KiB cap).
const MAX_LENGTH_DIGITS: usize = 5;

/// Framing failures on a stream connection
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed octet-count prefix")]
    InvalidLength,

    #[error("declared frame length {declared} exceeds limit {max}")]
    Oversized { declared: usize, max: usize },

    #[error("stream ended {got} bytes into a {expected}-byte frame")]
    Truncated { expected: usize, got: usize },
}

/// Result of reading one newline-delimited frame
#[derive(Debug, PartialEq, Eq)]
pub enum LineFrame {
    /// A complete line; the buffer holds it without the trailing newline.
    Complete(usize),
    /// The line exceeded the cap; the buffer holds the truncated prefix and
    /// the rest of the line was consumed and dropped.
    Truncated(usize),
    /// End of stream with no pending bytes.
    Eof,
}

/// Read one newline-delimited frame with bounded memory.
///
/// Fills `buf` (cleared first) up to `max_size` bytes. The trailing LF or
/// CRLF is stripped. When the cap is hit before a newline, the remainder of
/// the line is consumed without being stored so the next read starts on a
/// frame boundary.
pub async fn read_line_frame<R: AsyncBufReadExt + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_size: usize,
) -> io::Result<LineFrame> {
    buf.clear();

    let mut exceeded = false;

    loop {
        let available = reader.fill_buf().await?;

        if available.is_empty() {
            // EOF: a non-empty buffer is the final (unterminated) frame.
            if buf.is_empty() && !exceeded {
                return Ok(LineFrame::Eof);
            }
            break;
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let (take, done) = match newline {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };

        if !exceeded {
            let room = max_size.saturating_sub(buf.len());
            if take <= room {
                buf.extend_from_slice(&available[..take]);
            } else {
                buf.extend_from_slice(&available[..room]);
                exceeded = true;
            }
        }

        reader.consume(take);

        if done {
            break;
        }
    }

    trim_line_ending(buf);

    if exceeded {
        Ok(LineFrame::Truncated(buf.len()))
    } else {
        Ok(LineFrame::Complete(buf.len()))
    }
}

/// Strip a trailing LF or CRLF in place.
fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

/// Read one octet-counted frame: `LENGTH SP PAYLOAD`.
///
/// Returns `Ok(None)` on clean EOF before any prefix byte. A malformed
/// prefix, an oversized declaration, or a stream that ends inside the
/// payload all surface as errors - the caller drops the connection without
/// emitting a partial record.
pub async fn read_octet_frame<R: AsyncBufReadExt + Unpin>(
    reader: &mut R,
    max_size: usize,
) -> Result<Option<Vec<u8>>, FrameError> {
    let mut declared: usize = 0;
    let mut n_digits = 0;

    loop {
        let mut byte = [0u8; 1];
        let read = reader.read(&mut byte).await?;
        if read == 0 {
            if n_digits == 0 {
                return Ok(None);
            }
            return Err(FrameError::InvalidLength);
        }

        match byte[0] {
            b' ' if n_digits > 0 => break,
            b @ b'0'..=b'9' if n_digits < MAX_LENGTH_DIGITS => {
                declared = declared * 10 + (b - b'0') as usize;
                n_digits += 1;
            }
            _ => return Err(FrameError::InvalidLength),
        }
    }

    if declared > max_size {
        return Err(FrameError::Oversized {
            declared,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; declared];
    let mut filled = 0;
    while filled < declared {
        let read = reader.read(&mut payload[filled..]).await?;
        if read == 0 {
            return Err(FrameError::Truncated {
                expected: declared,
                got: filled,
            });
        }
        filled += read;
    }

    Ok(Some(payload))
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;
