/// TCP session to the bridge's HTTP service port
use log::{debug, info, warn};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{OneWireError, Result};

/// One open connection. The write half sits behind the send lock, the read
/// half belongs to whoever drives the exchange.
struct Connection {
    addr: String,
    reader: OwnedReadHalf,
    writer: Mutex<OwnedWriteHalf>,
}

/// Owns at most one TCP connection to the bridge at a time.
pub struct Session {
    timeout: Duration,
    connection: Option<Connection>,
}

impl Session {
    /// Create a disconnected session. `timeout` bounds the connect and every
    /// later read.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            connection: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open a connection to `host:port`, replacing any previous one.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let addr = format!("{}:{}", host, port);

        if host.trim().is_empty() {
            return Err(OneWireError::Connection {
                addr,
                source: io::Error::new(io::ErrorKind::InvalidInput, "host is empty"),
            });
        }
        if port == 0 {
            return Err(OneWireError::Connection {
                addr,
                source: io::Error::new(io::ErrorKind::InvalidInput, "port must be 1-65535"),
            });
        }

        if self.connection.is_some() {
            self.disconnect().await?;
        }

        let stream = match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(OneWireError::Connection { addr, source: e }),
            Err(_) => {
                return Err(OneWireError::Connection {
                    addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                })
            }
        };

        let (reader, writer) = stream.into_split();
        info!("Connected to {}", addr);
        self.connection = Some(Connection {
            addr,
            reader,
            writer: Mutex::new(writer),
        });

        Ok(())
    }

    /// Close the connection. Calling this while disconnected only logs a
    /// warning.
    pub async fn disconnect(&mut self) -> Result<()> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                warn!("Disconnect requested but session is not connected");
                return Ok(());
            }
        };

        let mut writer = connection.writer.into_inner();
        match writer.shutdown().await {
            Ok(()) => {}
            // The bridge closes its side right after replying
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
            Err(e) => return Err(OneWireError::Io(e)),
        }

        info!("Connection to {} closed", connection.addr);
        Ok(())
    }

    /// Write the whole buffer or fail.
    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        let connection = self.connection.as_ref().ok_or(OneWireError::NotConnected)?;

        let mut writer = connection.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;

        debug!("Sent {} bytes to {}", bytes.len(), connection.addr);
        Ok(())
    }

    /// Read whatever is available, up to `max_bytes`. An empty result means
    /// the peer closed the connection.
    pub async fn receive_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let read_timeout = self.timeout;
        let connection = self.connection.as_mut().ok_or(OneWireError::NotConnected)?;

        let mut buf = vec![0u8; max_bytes];
        let read = match timeout(read_timeout, connection.reader.read(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(OneWireError::Timeout {
                    timeout: read_timeout,
                })
            }
        };

        buf.truncate(read);
        Ok(buf)
    }
}
