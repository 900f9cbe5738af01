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
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use bcp_common::protocol::{BcpError, Result};

use crate::connection::{ConnectionEntry, ConnectionState};
use crate::connector::{Channel, Connector};
use crate::invocation::Invocation;
use crate::notifier::Notifier;
use crate::roster::{Receiver, Roster};

/// Index-aligned connection slots for a roster.
///
/// Every slot has its own lock. Raising and breaking a slot both happen
/// under that lock, together with the observer event they cause, so at
/// most one connection attempt is in flight per index and events for an
/// index are never duplicated or reordered.
pub(crate) struct ConnectionTable {
    roster: Arc<Roster>,
    entries: Vec<Mutex<ConnectionEntry>>,
    connector: Arc<dyn Connector>,
    notifier: Arc<Notifier>,
}

impl ConnectionTable {
    pub(crate) fn new(
        roster: Arc<Roster>,
        connector: Arc<dyn Connector>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let entries = (0..roster.len())
            .map(|_| Mutex::new(ConnectionEntry::Absent))
            .collect();

        Self {
            roster,
            entries,
            connector,
            notifier,
        }
    }

    fn slot(&self, index: usize) -> Result<(&Receiver, &Mutex<ConnectionEntry>)> {
        let receiver = self.roster.get(index)?;
        let entry = self.entries.get(index).ok_or(BcpError::InvalidIndex {
            index,
            count: self.entries.len(),
        })?;
        Ok((receiver, entry))
    }

    /// Raises every index that is not connected, concurrently.
    ///
    /// Returns the live channel per index, `None` where the attempt failed.
    pub(crate) async fn raise_all(&self) -> Vec<Option<Arc<dyn Channel>>> {
        let attempts = (0..self.entries.len()).map(|index| async move {
            self.raise_index(index).await.ok()
        });

        join_all(attempts).await
    }

    /// Raises one index. A failed attempt is not an error here; the index
    /// just stays absent.
    pub(crate) async fn raise(&self, index: usize) -> Result<()> {
        self.slot(index)?;
        let _ = self.raise_index(index).await;
        Ok(())
    }

    /// Live channel for `index`, raising it first when needed.
    pub(crate) async fn handle_for(&self, index: usize) -> Result<Arc<dyn Channel>> {
        self.slot(index)?;
        self.raise_index(index).await
    }

    async fn raise_index(&self, index: usize) -> Result<Arc<dyn Channel>> {
        let (receiver, slot) = self.slot(index)?;
        let mut entry = slot.lock().await;

        if let Some(channel) = entry.channel() {
            return Ok(channel.clone());
        }

        match self.connector.connect(receiver).await {
            Ok(channel) => {
                *entry = ConnectionEntry::Connected(channel.clone());
                info!(index, name = %receiver.name, host = %receiver.host, "Made connection");
                self.notifier.made_connection(receiver);
                Ok(channel)
            }
            Err(e) => {
                *entry = ConnectionEntry::Absent;
                debug!(index, name = %receiver.name, host = %receiver.host, "Connection attempt failed: {}", e);
                Err(match e {
                    BcpError::CouldNotConnect { .. } => e,
                    other => BcpError::CouldNotConnect {
                        name: receiver.name.clone(),
                        host: receiver.host.clone(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Marks a connected index broken. Indices that are not connected are
    /// left alone, so only the first detection emits a lost event.
    pub(crate) async fn mark_broken(&self, index: usize) -> Result<bool> {
        self.slot(index)?;
        Ok(self.break_entry(index, None).await)
    }

    /// Like [`mark_broken`](Self::mark_broken), but only if `channel` is
    /// still the one cached for `index`. A failure seen on a channel that
    /// has since been replaced must not break its replacement.
    pub(crate) async fn mark_channel_broken(&self, index: usize, channel: &Arc<dyn Channel>) -> bool {
        self.break_entry(index, Some(channel)).await
    }

    async fn break_entry(&self, index: usize, expected: Option<&Arc<dyn Channel>>) -> bool {
        let Ok((receiver, slot)) = self.slot(index) else {
            return false;
        };
        let mut entry = slot.lock().await;

        let channel = match entry.channel() {
            Some(current) if expected.map_or(true, |e| Arc::ptr_eq(e, current)) => current.clone(),
            _ => return false,
        };

        *entry = ConnectionEntry::Broken;
        warn!(index, name = %receiver.name, host = %receiver.host, "Lost connection");
        self.notifier.lost_connection(receiver);
        drop(entry);

        // The slot is already Broken; the teardown runs on its own.
        tokio::spawn(async move { channel.disconnect().await });
        true
    }

    pub(crate) async fn state(&self, index: usize) -> Result<ConnectionState> {
        let (_, slot) = self.slot(index)?;
        Ok(slot.lock().await.state())
    }

    pub(crate) async fn states(&self) -> Vec<ConnectionState> {
        let mut states = Vec::with_capacity(self.entries.len());
        for slot in &self.entries {
            states.push(slot.lock().await.state());
        }
        states
    }
}

/// A cached channel handed out for direct use of one receiver.
///
/// Calls on it are bounded by the messaging timeout. A timeout or a lost
/// connection marks the index broken, the same as during a broadcast, so
/// the next call reconnects instead of reading a stale reply.
pub(crate) struct TrackedChannel {
    index: usize,
    inner: Arc<dyn Channel>,
    table: Arc<ConnectionTable>,
    messaging_timeout: Duration,
}

impl TrackedChannel {
    pub(crate) fn new(
        index: usize,
        inner: Arc<dyn Channel>,
        table: Arc<ConnectionTable>,
        messaging_timeout: Duration,
    ) -> Self {
        Self {
            index,
            inner,
            table,
            messaging_timeout,
        }
    }
}

#[async_trait]
impl Channel for TrackedChannel {
    fn receiver(&self) -> &Receiver {
        self.inner.receiver()
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<Option<Value>> {
        let result = match tokio::time::timeout(self.messaging_timeout, self.inner.invoke(invocation)).await {
            Ok(result) => result,
            Err(_) => Err(BcpError::MessagingTimeout(self.messaging_timeout.as_millis() as u64)),
        };

        if let Err(e) = &result {
            if e.is_connection_loss() {
                self.table.mark_channel_broken(self.index, &self.inner).await;
            }
        }
        result
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await
    }
}
