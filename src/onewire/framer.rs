/// Request framing and response-boundary detection
///
/// The bridge answers `GET /details.xml` with an HTTP-style status line, a
/// few header lines and an XML document, then closes the connection. There
/// is no content length, so the end of the document is found by scanning for
/// the closing tag of the root element.
use log::debug;

use super::transport::Session;
use crate::error::{OneWireError, Result};

pub const REQUEST: &[u8] = b"GET /details.xml HTTP/1.1\r\n\r\n";
pub const TERMINATOR: &[u8] = b"</Devices-Detail-Response>\r\n";

const XML_MARKER: &[u8] = b"<?xml";
const HEADER_END: &[u8] = b"\r\n\r\n";
const SUCCESS_CODE: u16 = 200;
const CHUNK_SIZE: usize = 4096;
const MAX_RESPONSE_BYTES: usize = 1 << 20;

#[derive(Debug, PartialEq)]
pub enum FrameStatus {
    NeedMore,
    Complete(Vec<u8>),
}

/// Accumulates response bytes until a whole document has arrived.
///
/// Holds no socket; [`exchange`] feeds it from a [`Session`], tests feed it
/// directly.
#[derive(Debug, Default)]
pub struct ResponseFramer {
    buffer: Vec<u8>,
    status_checked: bool,
}

impl ResponseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and report whether the document is complete.
    ///
    /// The status line is checked as soon as it is whole, so a non-200 reply
    /// fails before any of the body is read.
    pub fn push(&mut self, chunk: &[u8]) -> Result<FrameStatus> {
        self.buffer.extend_from_slice(chunk);

        if !self.status_checked {
            match find(&self.buffer, b"\n") {
                Some(end) => {
                    check_status_line(&self.buffer[..end])?;
                    self.status_checked = true;
                }
                None => return self.need_more(),
            }
        }

        // The terminator may straddle chunk boundaries, so search everything
        match find(&self.buffer, TERMINATOR) {
            Some(pos) => {
                let end = pos + TERMINATOR.len();
                let start = document_start(&self.buffer[..end]);
                Ok(FrameStatus::Complete(self.buffer[start..end].to_vec()))
            }
            None => self.need_more(),
        }
    }

    /// The error for a connection that closed before the document finished.
    pub fn truncated(&self) -> OneWireError {
        OneWireError::TruncatedResponse {
            received: self.buffer.len(),
        }
    }

    fn need_more(&self) -> Result<FrameStatus> {
        if self.buffer.len() > MAX_RESPONSE_BYTES {
            return Err(OneWireError::ResponseTooLarge {
                limit: MAX_RESPONSE_BYTES,
            });
        }
        Ok(FrameStatus::NeedMore)
    }
}

/// Send the summary request and collect the full document payload.
///
/// The session is left open; the bridge closes its side after the reply and
/// the caller is expected to disconnect.
pub async fn exchange(session: &mut Session) -> Result<Vec<u8>> {
    session.send(REQUEST).await?;

    let mut framer = ResponseFramer::new();
    loop {
        let chunk = session.receive_chunk(CHUNK_SIZE).await?;
        if chunk.is_empty() {
            return Err(framer.truncated());
        }

        if let FrameStatus::Complete(document) = framer.push(&chunk)? {
            debug!(
                "Framed {} byte document from {} byte response",
                document.len(),
                framer.received()
            );
            return Ok(document);
        }
    }
}

fn check_status_line(line: &[u8]) -> Result<()> {
    let status_line = String::from_utf8_lossy(line).trim_end().to_string();

    let code = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok());

    match code {
        Some(SUCCESS_CODE) if status_line.starts_with("HTTP/") => Ok(()),
        _ => Err(OneWireError::Protocol { code, status_line }),
    }
}

/// Offset of the XML document: the `<?xml` prolog if present, otherwise the
/// first byte after the header block.
fn document_start(buffer: &[u8]) -> usize {
    find(buffer, XML_MARKER)
        .or_else(|| find(buffer, HEADER_END).map(|pos| pos + HEADER_END.len()))
        .unwrap_or(0)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
