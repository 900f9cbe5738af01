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

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use bcp_common::protocol::{BcpError, Request, Result};
use bcp_common::transport::TcpTransportAsync;

use crate::config::ProxyConfig;
use crate::invocation::Invocation;
use crate::roster::Receiver;

/// A live connection to one receiver.
///
/// Value-returning invocations resolve to `Some(value)`; oneway
/// invocations resolve to `None` once the call has left the proxy.
#[async_trait]
pub trait Channel: Send + Sync {
    fn receiver(&self) -> &Receiver;

    async fn invoke(&self, invocation: &Invocation) -> Result<Option<Value>>;

    /// Tears the connection down. Errors are swallowed; the channel is not
    /// used again afterwards.
    async fn disconnect(&self);
}

/// Opens channels to receivers.
#[async_trait]
pub trait Connector: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BcpError::CouldNotConnect`] when the receiver cannot be
    /// reached or does not accept the connection.
    async fn connect(&self, receiver: &Receiver) -> Result<Arc<dyn Channel>>;
}

/// Connector speaking the BCP TCP protocol.
///
/// After the TCP connection opens, a `_ping` addressed to the receiver's
/// name must be answered successfully; a host that does not serve that
/// name refuses the connection.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    transport: TcpTransportAsync,
    messaging_timeout: Duration,
}

impl TcpConnector {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            transport: TcpTransportAsync::with_connect_timeout(config.connect_timeout),
            messaging_timeout: config.messaging_timeout,
        }
    }

    async fn handshake(&self, stream: &mut TcpStream, receiver: &Receiver) -> Result<()> {
        let ping = Request::ping(receiver.name.as_str());
        let exchange = async {
            let response = self.transport.send_request(stream, &ping).await?;
            response.into_result().map(|_| ())
        };

        match tokio::time::timeout(self.transport.connect_timeout(), exchange).await {
            Ok(result) => result,
            Err(_) => Err(BcpError::Transport("Handshake timed out".to_string())),
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(&ProxyConfig::default())
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, receiver: &Receiver) -> Result<Arc<dyn Channel>> {
        let could_not_connect = |e: BcpError| BcpError::CouldNotConnect {
            name: receiver.name.clone(),
            host: receiver.host.clone(),
            reason: e.to_string(),
        };

        let mut stream = self
            .transport
            .connect(&receiver.host)
            .await
            .map_err(could_not_connect)?;
        self.handshake(&mut stream, receiver)
            .await
            .map_err(could_not_connect)?;

        debug!(name = %receiver.name, host = %receiver.host, "Handshake complete");

        Ok(Arc::new(TcpChannel {
            receiver: receiver.clone(),
            transport: self.transport.clone(),
            stream: Arc::new(Mutex::new(stream)),
            messaging_timeout: self.messaging_timeout,
        }))
    }
}

/// TCP connection to one receiver.
///
/// Invocations on the same channel are serialized on the stream lock, so
/// a reply is always read by the caller that sent the request.
pub struct TcpChannel {
    receiver: Receiver,
    transport: TcpTransportAsync,
    stream: Arc<Mutex<TcpStream>>,
    messaging_timeout: Duration,
}

#[async_trait]
impl Channel for TcpChannel {
    fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Option<Value>> {
        let mut guard = self.stream.lock().await;
        let stream: &mut TcpStream = &mut guard;

        let request = Request::new(
            self.receiver.name.as_str(),
            invocation.method.as_str(),
            invocation.args.clone(),
        );

        let exchange = async {
            if invocation.is_oneway() {
                self.transport
                    .send_oneway(stream, &request.oneway())
                    .await
                    .map(|_| None)
            } else {
                let response = self.transport.send_request(stream, &request).await?;
                response.into_result().map(Some)
            }
        };

        match tokio::time::timeout(self.messaging_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BcpError::MessagingTimeout(
                self.messaging_timeout.as_millis() as u64,
            )),
        }
    }

    async fn disconnect(&self) {
        let mut stream = self.stream.lock().await;
        if let Err(e) = stream.shutdown().await {
            debug!(name = %self.receiver.name, host = %self.receiver.host, "Shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcp_common::transport::TcpServer;
    use serde_json::json;

    async fn spawn_receiver(name: &'static str) -> String {
        let server = TcpServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server
                .serve(name, |req: Request| async move {
                    match req.method.as_str() {
                        "fail" => Err(BcpError::Remote("refused".to_string())),
                        "sleep" => {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            Ok(json!(null))
                        }
                        _ => Ok(req.args),
                    }
                })
                .await;
        });
        addr
    }

    fn fast_config() -> ProxyConfig {
        ProxyConfig::default()
            .with_connect_timeout(Duration::from_millis(500))
            .with_messaging_timeout(Duration::from_millis(300))
    }

    #[tokio::test]
    async fn test_connect_and_invoke() {
        let addr = spawn_receiver("alpha").await;
        let connector = TcpConnector::new(&fast_config());

        let channel = connector.connect(&Receiver::new("alpha", addr)).await.unwrap();
        let value = channel
            .invoke(&Invocation::value_returning("echo", json!({"n": 1})))
            .await
            .unwrap();

        assert_eq!(value, Some(json!({"n": 1})));
        assert_eq!(channel.receiver().name, "alpha");
    }

    #[tokio::test]
    async fn test_oneway_returns_none() {
        let addr = spawn_receiver("alpha").await;
        let connector = TcpConnector::new(&fast_config());
        let channel = connector.connect(&Receiver::new("alpha", addr)).await.unwrap();

        let value = channel
            .invoke(&Invocation::oneway("echo", json!(1)))
            .await
            .unwrap();
        assert_eq!(value, None);

        // the stream stays usable after a oneway call
        let value = channel
            .invoke(&Invocation::value_returning("echo", json!(2)))
            .await
            .unwrap();
        assert_eq!(value, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_wrong_name_is_refused() {
        let addr = spawn_receiver("alpha").await;
        let connector = TcpConnector::new(&fast_config());

        let err = connector
            .connect(&Receiver::new("beta", addr))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BcpError::CouldNotConnect { ref name, .. } if name == "beta"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let connector = TcpConnector::new(&fast_config());
        let err = connector
            .connect(&Receiver::new("alpha", addr))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BcpError::CouldNotConnect { .. }));
    }

    #[tokio::test]
    async fn test_remote_error_surfaces() {
        let addr = spawn_receiver("alpha").await;
        let connector = TcpConnector::new(&fast_config());
        let channel = connector.connect(&Receiver::new("alpha", addr)).await.unwrap();

        let err = channel
            .invoke(&Invocation::value_returning("fail", json!(null)))
            .await
            .unwrap_err();
        assert!(matches!(err, BcpError::Remote(_)));
    }

    #[tokio::test]
    async fn test_slow_receiver_times_out() {
        let addr = spawn_receiver("alpha").await;
        let connector = TcpConnector::new(&fast_config());
        let channel = connector.connect(&Receiver::new("alpha", addr)).await.unwrap();

        let err = channel
            .invoke(&Invocation::value_returning("sleep", json!(null)))
            .await
            .unwrap_err();
        assert!(matches!(err, BcpError::MessagingTimeout(300)));
    }
}
