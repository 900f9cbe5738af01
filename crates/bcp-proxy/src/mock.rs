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

//! In-memory connector and observer used by unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bcp_common::protocol::{BcpError, Result};

use crate::connector::{Channel, Connector};
use crate::invocation::Invocation;
use crate::notifier::{BroadcastObserver, ProxyId};
use crate::roster::Receiver;

/// How a mock host behaves, looked up on every connect and invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Connection attempts fail
    Refuse,
    /// Answers `{"name", "args"}`
    Echo,
    /// Answers with an application error
    Reject,
    /// Never answers
    Hang,
    /// The connection drops on the next invocation
    Drop,
    /// Like `Drop`, but tearing the channel down never finishes
    Stall,
}

#[derive(Default)]
struct Hosts {
    behaviors: HashMap<String, Behavior>,
    attempts: HashMap<String, usize>,
    disconnects: HashMap<String, usize>,
}

#[derive(Default, Clone)]
pub(crate) struct MockConnector {
    hosts: Arc<Mutex<Hosts>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self, host: &str, behavior: Behavior) {
        self.hosts
            .lock()
            .unwrap()
            .behaviors
            .insert(host.to_string(), behavior);
    }

    pub(crate) fn attempts(&self, host: &str) -> usize {
        self.hosts.lock().unwrap().attempts.get(host).copied().unwrap_or(0)
    }

    pub(crate) fn disconnects(&self, host: &str) -> usize {
        self.hosts.lock().unwrap().disconnects.get(host).copied().unwrap_or(0)
    }

    /// Waits up to a second for spawned disconnects of `host` to reach `expected`.
    pub(crate) async fn await_disconnects(&self, host: &str, expected: usize) -> usize {
        for _ in 0..100 {
            if self.disconnects(host) >= expected {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.disconnects(host)
    }

    fn behavior(&self, host: &str) -> Behavior {
        self.hosts
            .lock()
            .unwrap()
            .behaviors
            .get(host)
            .copied()
            .unwrap_or(Behavior::Refuse)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, receiver: &Receiver) -> Result<Arc<dyn Channel>> {
        *self
            .hosts
            .lock()
            .unwrap()
            .attempts
            .entry(receiver.host.clone())
            .or_default() += 1;

        if self.behavior(&receiver.host) == Behavior::Refuse {
            return Err(BcpError::CouldNotConnect {
                name: receiver.name.clone(),
                host: receiver.host.clone(),
                reason: "refused".to_string(),
            });
        }

        Ok(Arc::new(MockChannel {
            receiver: receiver.clone(),
            connector: self.clone(),
        }))
    }
}

struct MockChannel {
    receiver: Receiver,
    connector: MockConnector,
}

#[async_trait]
impl Channel for MockChannel {
    fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Option<Value>> {
        match self.connector.behavior(&self.receiver.host) {
            Behavior::Echo if invocation.is_oneway() => Ok(None),
            Behavior::Echo => Ok(Some(json!({
                "name": self.receiver.name,
                "args": invocation.args,
            }))),
            Behavior::Reject => Err(BcpError::Remote("rejected".to_string())),
            Behavior::Hang => futures::future::pending().await,
            Behavior::Drop | Behavior::Stall | Behavior::Refuse => {
                Err(BcpError::ConnectionWentDown("reset by peer".to_string()))
            }
        }
    }

    async fn disconnect(&self) {
        if self.connector.behavior(&self.receiver.host) == Behavior::Stall {
            return futures::future::pending().await;
        }
        *self
            .connector
            .hosts
            .lock()
            .unwrap()
            .disconnects
            .entry(self.receiver.host.clone())
            .or_default() += 1;
    }
}

/// Observer recording events as `"made|lost <proxy> <name> <host>"`.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl BroadcastObserver for RecordingObserver {
    fn on_lost_connection(&self, proxy: ProxyId, name: &str, host: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("lost {} {} {}", proxy, name, host));
    }

    fn on_made_connection(&self, proxy: ProxyId, name: &str, host: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("made {} {} {}", proxy, name, host));
    }
}
