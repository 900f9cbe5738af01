// Copyright 2025 BCP Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};

use crate::protocol::error::{BcpError, Result};
use crate::protocol::{Request, Response};
use crate::transport::codec::JsonCodec;
use crate::transport::MAX_MESSAGE_SIZE;

/// Default timeout for establishing a TCP connection (5 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Async TCP transport used by the proxy side.
///
/// The transport itself is stateless apart from its connect timeout; streams
/// are owned by the caller.
///
/// # Wire Protocol
///
/// Messages are sent with a 4-byte length prefix (big-endian u32) followed
/// by the JSON-encoded data:
///
/// ```text
/// [4-byte length] [JSON data]
/// ```
///
/// # Example
///
/// ```no_run
/// use bcp_common::transport::TcpTransportAsync;
/// use bcp_common::protocol::Request;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransportAsync::new();
/// let mut stream = transport.connect("127.0.0.1:7400").await?;
///
/// let request = Request::new("logger", "record", json!({"line": "hi"}));
/// let response = transport.send_request(&mut stream, &request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransportAsync {
    connect_timeout: Duration,
}

impl TcpTransportAsync {
    /// Creates a transport with [`DEFAULT_CONNECT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_connect_timeout(DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Connects to a remote endpoint.
    ///
    /// The address is resolved and every resolved socket address is tried in
    /// turn until one accepts. The whole attempt is bounded by the connect
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BcpError::Transport`] if the address does not resolve, no
    /// resolved address accepts, or the connect timeout expires.
    pub async fn connect(&self, addr: &str) -> Result<TcpStream> {
        match tokio::time::timeout(self.connect_timeout, Self::connect_any(addr)).await {
            Ok(result) => result,
            Err(_) => Err(BcpError::Transport(format!(
                "Timed out connecting to {} after {}ms",
                addr,
                self.connect_timeout.as_millis()
            ))),
        }
    }

    async fn connect_any(addr: &str) -> Result<TcpStream> {
        let socket_addrs = lookup_host(addr)
            .await
            .map_err(|e| BcpError::Transport(format!("Invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect(socket_addr).await {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(BcpError::Transport(format!(
            "Failed to connect to {}: {}",
            addr,
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string())
        )))
    }

    /// Sends a request and waits for its response.
    pub async fn send_request(&self, stream: &mut TcpStream, request: &Request) -> Result<Response> {
        let encoded = JsonCodec::encode_request(request)?;
        Self::send_message(stream, &encoded).await?;

        let response_data = Self::receive_message(stream).await?;
        let response = JsonCodec::decode_response(&response_data)?;

        if response.id != request.id {
            return Err(BcpError::InvalidResponse(format!(
                "Response id {} does not match request id {}",
                response.id, request.id
            )));
        }

        Ok(response)
    }

    /// Sends a oneway request. Success means the frame was written and
    /// flushed; no reply is read.
    pub async fn send_oneway(&self, stream: &mut TcpStream, request: &Request) -> Result<()> {
        let encoded = JsonCodec::encode_request(request)?;
        Self::send_message(stream, &encoded).await
    }

    /// Writes one length-prefixed frame.
    pub async fn send_message<W>(stream: &mut W, data: &[u8]) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let len = u32::try_from(data.len()).map_err(|_| {
            BcpError::Transport(format!("Message too large: {} bytes", data.len()))
        })?;

        stream
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| Self::map_io_error(e, "writing length prefix"))?;
        stream
            .write_all(data)
            .await
            .map_err(|e| Self::map_io_error(e, "writing data"))?;
        stream
            .flush()
            .await
            .map_err(|e| Self::map_io_error(e, "flushing stream"))?;

        Ok(())
    }

    /// Reads one length-prefixed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream closes or fails, or if the announced
    /// length exceeds [`MAX_MESSAGE_SIZE`].
    pub async fn receive_message<R>(stream: &mut R) -> Result<Vec<u8>>
    where
        R: AsyncRead + Unpin,
    {
        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| Self::map_io_error(e, "reading length prefix"))?;

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(BcpError::InvalidResponse(format!(
                "Message too large: {} bytes (max {} bytes)",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| Self::map_io_error(e, "reading data"))?;

        Ok(buf)
    }

    /// Maps IO errors onto the connection-loss variants where the peer is
    /// gone, and onto [`BcpError::Io`] otherwise.
    pub fn map_io_error(err: std::io::Error, context: &str) -> BcpError {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::TimedOut => {
                BcpError::ConnectionWentDown(format!("{}: {}", context, err))
            }
            _ => BcpError::Io(err),
        }
    }
}

impl Default for TcpTransportAsync {
    fn default() -> Self {
        Self::new()
    }
}
