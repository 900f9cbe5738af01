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

//! BCP Broadcast Proxy
//!
//! A [`BroadcastProxy`] stands in for an ordered, fixed roster of remote
//! receivers. Every broadcast call goes to every receiver; the proxy raises
//! missing connections on demand, drops the ones that fail, and counts how
//! each call ended.
//!
//! # Example
//!
//! ```rust,no_run
//! use bcp_proxy::{BroadcastProxy, ProxyConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let proxy = BroadcastProxy::new(
//!     vec!["logger-a".into(), "logger-b".into()],
//!     vec!["10.0.0.1:7400".into(), "10.0.0.2:7400".into()],
//!     ProxyConfig::default(),
//! )?;
//!
//! let reply = proxy.invoke("record", json!({"line": "hello"})).await;
//! println!("{}: {:?}", reply.outcome, reply.results);
//!
//! // Talk to one receiver only
//! if let Some(channel) = proxy.proxy_for(1).await? {
//!     let _ = channel.invoke(&bcp_proxy::Invocation::oneway("flush", json!(null))).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod connector;
mod forwarder;
pub mod invocation;
pub mod notifier;
pub mod proxy;
pub mod roster;
pub mod status;
mod table;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{load_receivers, parse_receivers, ProxyConfig, ReceiverConfig};
pub use connection::ConnectionState;
pub use connector::{Channel, Connector, TcpChannel, TcpConnector};
pub use invocation::{BroadcastReply, Invocation};
pub use notifier::{BroadcastObserver, ProxyId};
pub use proxy::BroadcastProxy;
pub use roster::{Receiver, Roster};
pub use status::{ProxyStatus, ReceiverStatus};

pub use bcp_common::protocol::{BcpError, Result};
pub use bcp_metrics::{BroadcastOutcome, ReturnKind, StatsSnapshot};
