//! Line-based TCP transport.
//!
//! One request per connection: the client sends `<class> <value>\n` (or
//! `\r\n`), the server replies with exactly one line `<code> <detail>\r\n`
//! and closes the connection. Codes: `0` allowed, `1` rate exceeded, `2`
//! error.
//!
//! A request line longer than 1000 bytes is answered with
//! `1 Line is too long\r\n` and the connection is closed immediately. The
//! reply reuses the rate-exceeded code; deployed clients switch on that
//! byte, so it is kept as-is.

use super::Transport;
use crate::actor::EngineHandle;
use anyhow::Result;
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const READ_CHUNK_SIZE: usize = 256;

/// Maximum accepted request line, in bytes.
pub const MAX_LINE_LENGTH: usize = 1000;

const LINE_TOO_LONG_REPLY: &[u8] = b"1 Line is too long\r\n";
const UNAVAILABLE_REPLY: &[u8] = b"2 Rate check unavailable\r\n";

/// Line protocol transport implementation
pub struct LineTransport {
    host: String,
    port: u16,
}

impl LineTransport {
    /// Create a new line transport instance
    ///
    /// # Parameters
    ///
    /// - `host`: The host address to bind to (e.g., "0.0.0.0")
    /// - `port`: The port number to listen on
    pub fn new(host: &str, port: u16) -> Self {
        LineTransport {
            host: host.to_string(),
            port,
        }
    }

    /// Handle a single client connection
    ///
    /// Buffers until a complete line arrives, asks the engine for a
    /// verdict, writes the reply, and closes.
    async fn handle_connection(mut socket: TcpStream, engine: EngineHandle) -> Result<()> {
        socket.set_nodelay(true)?;

        let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = socket.read(&mut chunk).await?;
            if read == 0 {
                // Client disconnected before sending a full line
                tracing::debug!("connection closed without a complete line");
                return Ok(());
            }
            buffer.extend_from_slice(&chunk[..read]);

            if buffer.len() > MAX_LINE_LENGTH {
                tracing::warn!("line too long ({} bytes)", buffer.len());
                socket.write_all(LINE_TOO_LONG_REPLY).await?;
                socket.flush().await?;
                return Ok(());
            }

            let Some(end) = buffer.iter().position(|byte| *byte == b'\n') else {
                continue;
            };

            let mut line = &buffer[..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            // Invalid UTF-8 can only fail to match patterns, never drop
            // the reply
            let line = String::from_utf8_lossy(line).into_owned();
            tracing::debug!(line = %line, "checking");

            let reply = match engine.decide(line).await {
                Ok(verdict) => {
                    match verdict.code() {
                        0 | 1 => tracing::info!("{verdict}"),
                        _ => tracing::warn!("{verdict}"),
                    }
                    format!("{verdict}\r\n").into_bytes()
                }
                Err(e) => {
                    tracing::error!("engine unavailable: {e}");
                    UNAVAILABLE_REPLY.to_vec()
                }
            };

            socket.write_all(&reply).await?;
            socket.flush().await?;
            return Ok(());
        }
    }
}

#[async_trait]
impl Transport for LineTransport {
    async fn start(self, engine: EngineHandle) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("line protocol transport listening on {}", addr);

        loop {
            let (socket, peer_addr) = listener.accept().await?;
            let engine = engine.clone();

            tracing::debug!("new connection from {}", peer_addr);

            // One task per connection; each serves a single request
            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(socket, engine).await {
                    tracing::error!("connection error from {}: {}", peer_addr, e);
                }
                tracing::debug!("connection closed from {}", peer_addr);
            });
        }
    }
}
