//! stdio transport for MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! [`Transport`] works over any async reader/writer pair so the server loop
//! can be driven from memory in tests; [`StdioTransport`] is the real thing.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::mcp::framing::LineFramer;
use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};

/// Size of a single read from the input stream.
const READ_CHUNK: usize = 8 * 1024;

/// A newline-delimited JSON-RPC transport.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
    framer: LineFramer,
    chunk: Vec<u8>,
}

/// Transport over the process's stdin and stdout.
pub type StdioTransport = Transport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over the given streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            framer: LineFramer::new(),
            chunk: vec![0; READ_CHUNK],
        }
    }

    /// Reads the next complete frame.
    ///
    /// Returns `None` once the input is closed. An unterminated fragment
    /// left at end of input is discarded.
    ///
    /// Cancel safe: bytes are only moved into the framer after a read
    /// completes, so dropping the future loses nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the input fails.
    pub async fn read_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.framer.next_frame() {
                return Ok(Some(frame));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                let rest = self.framer.take_remainder();
                if !rest.is_empty() {
                    tracing::warn!(
                        bytes = rest.len(),
                        "Discarding unterminated message at end of input"
                    );
                }
                return Ok(None);
            }

            self.framer.push(&self.chunk[..n]);
        }
    }

    /// Writes a JSON-RPC response.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        self.write_message(response).await
    }

    /// Writes a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_error(&mut self, error: &JsonRpcError) -> io::Result<()> {
        self.write_message(error).await
    }

    async fn write_message<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}
