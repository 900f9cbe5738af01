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

use std::future::Future;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use crate::protocol::error::{BcpError, Result};
use crate::protocol::{Request, Response, RpcResult};
use crate::transport::codec::JsonCodec;
use crate::transport::tcp::TcpTransportAsync;

/// Async TCP server hosting one named receiver.
///
/// Each accepted connection is served on its own task and may carry any
/// number of requests. Requests addressed to another receiver name are
/// answered with an error, which makes a proxy's connection handshake fail
/// for a host that does not host the receiver it asked for.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Binds a server to `bind_addr` (e.g. "0.0.0.0:7400").
    pub async fn bind(bind_addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| BcpError::Transport(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| BcpError::Transport(format!("Failed to get local addr: {}", e)))
    }

    /// Serves receiver `name` until the accept loop fails.
    ///
    /// The handler is called for every non-handshake request. Its value is
    /// sent back for value-returning requests and discarded for oneway ones.
    pub async fn serve<F, Fut>(self, name: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RpcResult>> + Send + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        let handler = Arc::new(handler);

        loop {
            let (stream, peer_addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| BcpError::Transport(format!("Failed to accept connection: {}", e)))?;

            debug!(receiver = %name, peer = %peer_addr, "Connection established");

            let name = name.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &name, handler).await {
                    warn!(receiver = %name, peer = %peer_addr, "Connection error: {}", e);
                }
            });
        }
    }
}

async fn handle_connection<F, Fut>(mut stream: TcpStream, name: &str, handler: Arc<F>) -> Result<()>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RpcResult>> + Send + 'static,
{
    loop {
        let frame = match TcpTransportAsync::receive_message(&mut stream).await {
            Ok(frame) => frame,
            Err(BcpError::ConnectionWentDown(_)) => {
                debug!(receiver = %name, "Connection closed by peer");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let request = match JsonCodec::decode_request(&frame) {
            Ok(req) => req,
            Err(e) => {
                warn!(receiver = %name, "Failed to decode request: {}", e);
                send_response(&mut stream, &Response::error(0, e.to_string())).await?;
                continue;
            }
        };

        let request_id = request.id;
        let oneway = request.oneway;

        let response = if request.receiver != name {
            Response::error(
                request_id,
                format!("No receiver named '{}' on this host", request.receiver),
            )
        } else if request.is_ping() {
            Response::success(request_id, serde_json::Value::Bool(true))
        } else {
            match handler(request).await {
                Ok(value) => Response::success(request_id, value),
                Err(e) => {
                    debug!(receiver = %name, "Handler error: {}", e);
                    Response::error(request_id, e.to_string())
                }
            }
        };

        if !oneway {
            send_response(&mut stream, &response).await?;
        }
    }
}

async fn send_response(stream: &mut TcpStream, response: &Response) -> Result<()> {
    let encoded = JsonCodec::encode_response(response)?;
    TcpTransportAsync::send_message(stream, &encoded).await
}
