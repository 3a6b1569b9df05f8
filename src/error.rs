/// Error types for the 1-Wire bridge client
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OneWireError>;

/// Every failure a poll can end with.
///
/// The client never retries and never swallows one of these: the current
/// poll is aborted, the session is left disconnected and the error is handed
/// to the caller, who owns the retry policy.
#[derive(Debug, Error)]
pub enum OneWireError {
    /// The TCP connection to the bridge could not be established.
    #[error("could not connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A send or receive was attempted on a closed session.
    #[error("session is not connected")]
    NotConnected,

    /// No bytes arrived within the configured window.
    #[error("no data received within {timeout:?}")]
    Timeout { timeout: Duration },

    /// The peer closed the connection before the document terminator arrived.
    #[error("response truncated after {received} bytes, document terminator never seen")]
    TruncatedResponse { received: usize },

    /// The status line was malformed or carried a non-success code.
    #[error("unexpected status line {status_line:?}")]
    Protocol {
        code: Option<u16>,
        status_line: String,
    },

    /// The response kept growing past the framer's buffer limit.
    #[error("response exceeded {limit} bytes without a document terminator")]
    ResponseTooLarge { limit: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OneWireError {
    /// Whether the same request could plausibly succeed on the next poll.
    ///
    /// Decode and protocol failures come from the device's answer itself,
    /// everything else from the network path to it.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Decode(_) | Self::Protocol { .. })
    }
}

/// Failures while turning the document payload into a reading.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed XML document: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Text in a numeric field could not be coerced.
    #[error("field <{tag}> holds non-numeric text {text:?}")]
    Field { tag: String, text: String },
}
