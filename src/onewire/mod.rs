pub mod client;
pub mod decoder;
pub mod framer;
pub mod transport;

pub use client::{OneWireClient, DEFAULT_TIMEOUT, HTTP_PORT};
pub use decoder::decode;
pub use framer::{exchange, FrameStatus, ResponseFramer};
pub use transport::Session;
