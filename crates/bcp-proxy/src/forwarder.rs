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

use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use bcp_common::protocol::BcpError;
use bcp_metrics::{BroadcastOutcome, BroadcastStats};

use crate::connector::Channel;
use crate::invocation::{BroadcastReply, Invocation};
use crate::table::ConnectionTable;

/// How one dispatch to one receiver ended.
#[derive(Debug)]
enum Dispatch {
    Succeeded(Option<Value>),
    Failed(BcpError),
}

impl Dispatch {
    /// A timeout or a lost connection leaves the channel unusable. An
    /// application error from the receiver does not.
    fn breaks_connection(&self) -> bool {
        matches!(self, Dispatch::Failed(e) if e.is_connection_loss())
    }
}

/// Fans one invocation out over the connection table.
pub(crate) struct Forwarder {
    table: Arc<ConnectionTable>,
    stats: Arc<BroadcastStats>,
    messaging_timeout: Duration,
}

impl Forwarder {
    pub(crate) fn new(
        table: Arc<ConnectionTable>,
        stats: Arc<BroadcastStats>,
        messaging_timeout: Duration,
    ) -> Self {
        Self {
            table,
            stats,
            messaging_timeout,
        }
    }

    /// Broadcasts `invocation` to every receiver that is or can be
    /// connected. Never fails: unreachable and failing receivers only
    /// lower the outcome.
    pub(crate) async fn forward(&self, invocation: &Invocation) -> BroadcastReply {
        let channels = self.table.raise_all().await;
        let roster_len = channels.len();

        let dispatches = channels
            .into_iter()
            .enumerate()
            .filter_map(|(index, channel)| channel.map(|c| (index, c)))
            .map(|(index, channel)| self.dispatch(index, channel, invocation));
        let dispatched = join_all(dispatches).await;

        let mut results = BTreeMap::new();
        let mut succeeded = 0;
        let mut broken = Vec::new();
        for (index, channel, dispatch) in dispatched {
            let receiver = channel.receiver();
            match dispatch {
                Dispatch::Succeeded(value) => {
                    succeeded += 1;
                    if !invocation.is_oneway() {
                        results.insert(index, value.unwrap_or(Value::Null));
                    }
                }
                ref failure @ Dispatch::Failed(ref e) => {
                    warn!(index, name = %receiver.name, host = %receiver.host, method = %invocation.method, "Dispatch failed: {}", e);
                    if failure.breaks_connection() {
                        broken.push((index, channel.clone()));
                    }
                }
            }
        }

        join_all(
            broken
                .iter()
                .map(|(index, channel)| self.table.mark_channel_broken(*index, channel)),
        )
        .await;

        let outcome = BroadcastOutcome::classify(succeeded, roster_len);
        self.stats.record(invocation.kind, outcome);

        debug!(
            method = %invocation.method,
            kind = ?invocation.kind,
            succeeded,
            receivers = roster_len,
            %outcome,
            "Broadcast complete"
        );

        BroadcastReply { outcome, results }
    }

    async fn dispatch(
        &self,
        index: usize,
        channel: Arc<dyn Channel>,
        invocation: &Invocation,
    ) -> (usize, Arc<dyn Channel>, Dispatch) {
        let dispatch = match tokio::time::timeout(self.messaging_timeout, channel.invoke(invocation)).await {
            Ok(Ok(value)) => Dispatch::Succeeded(value),
            Ok(Err(e)) => Dispatch::Failed(e),
            Err(_) => Dispatch::Failed(BcpError::MessagingTimeout(
                self.messaging_timeout.as_millis() as u64,
            )),
        };
        (index, channel, dispatch)
    }
}
