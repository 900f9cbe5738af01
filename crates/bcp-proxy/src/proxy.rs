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

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bcp_common::protocol::Result;
use bcp_metrics::{BroadcastOutcome, BroadcastStats, StatsSnapshot};

use crate::config::{load_receivers, ProxyConfig};
use crate::connection::ConnectionState;
use crate::connector::{Channel, Connector, TcpConnector};
use crate::forwarder::Forwarder;
use crate::invocation::{BroadcastReply, Invocation};
use crate::notifier::{BroadcastObserver, Notifier, ProxyId};
use crate::roster::{Receiver, Roster};
use crate::status::{ProxyStatus, ReceiverStatus};
use crate::table::{ConnectionTable, TrackedChannel};

/// One handle for a fixed roster of receivers.
///
/// Broadcast calls ([`forward`](Self::forward), [`invoke`](Self::invoke),
/// [`send`](Self::send)) go to every receiver and never fail as a whole;
/// their [`BroadcastOutcome`] says how far they got. Targeted access to a
/// single receiver goes through [`proxy_for`](Self::proxy_for).
///
/// Connections are raised lazily, at the start of every broadcast and on
/// targeted access. There is no background reconnection.
pub struct BroadcastProxy {
    id: ProxyId,
    roster: Arc<Roster>,
    table: Arc<ConnectionTable>,
    notifier: Arc<Notifier>,
    stats: Arc<BroadcastStats>,
    forwarder: Forwarder,
    messaging_timeout: Duration,
}

impl BroadcastProxy {
    /// Creates a TCP proxy from parallel name and host lists.
    ///
    /// # Errors
    ///
    /// Returns `ConstructionMismatch` if the lists differ in length.
    pub fn new(names: Vec<String>, hosts: Vec<String>, config: ProxyConfig) -> Result<Self> {
        let roster = Roster::new(names, hosts)?;
        let connector = Arc::new(TcpConnector::new(&config));
        Ok(Self::with_connector(roster, connector, &config))
    }

    /// Creates a TCP proxy from (name, host) records.
    pub fn from_receivers(receivers: impl IntoIterator<Item = Receiver>, config: ProxyConfig) -> Self {
        let connector = Arc::new(TcpConnector::new(&config));
        Self::with_connector(Roster::from_receivers(receivers), connector, &config)
    }

    /// Creates a TCP proxy from a JSON receiver list file.
    pub fn from_config_file(path: impl AsRef<Path>, config: ProxyConfig) -> Result<Self> {
        Ok(Self::from_receivers(load_receivers(path)?, config))
    }

    /// Creates a proxy using a caller-supplied transport.
    pub fn with_connector(roster: Roster, connector: Arc<dyn Connector>, config: &ProxyConfig) -> Self {
        let id = ProxyId::next();
        let roster = Arc::new(roster);
        let notifier = Arc::new(Notifier::new(id));
        let stats = Arc::new(BroadcastStats::new());
        let table = Arc::new(ConnectionTable::new(roster.clone(), connector, notifier.clone()));
        let forwarder = Forwarder::new(table.clone(), stats.clone(), config.messaging_timeout);

        Self {
            id,
            roster,
            table,
            notifier,
            stats,
            forwarder,
            messaging_timeout: config.messaging_timeout,
        }
    }

    pub fn id(&self) -> ProxyId {
        self.id
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn names(&self) -> Vec<&str> {
        self.roster.names()
    }

    pub fn hosts(&self) -> Vec<&str> {
        self.roster.hosts()
    }

    pub fn count(&self) -> usize {
        self.roster.len()
    }

    pub fn receiver(&self, index: usize) -> Result<&Receiver> {
        self.roster.get(index)
    }

    pub fn index_of(&self, name: &str, host: &str) -> Option<usize> {
        self.roster.index_of(name, host)
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Tries to connect every receiver that is not connected.
    pub async fn raise_connections(&self) {
        self.table.raise_all().await;
    }

    /// Tries to connect one receiver. A failed attempt leaves it absent
    /// and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if `index` is outside the roster.
    pub async fn raise_connection(&self, index: usize) -> Result<()> {
        self.table.raise(index).await
    }

    /// Channel to one receiver, raising it first if needed.
    ///
    /// Returns `Ok(None)` when the receiver cannot be reached. The channel
    /// shares the proxy's cached connection. Calls on it are bounded by the
    /// messaging timeout, and a timeout or lost connection marks the
    /// receiver broken before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if `index` is outside the roster. No
    /// connection is attempted in that case.
    pub async fn proxy_for(&self, index: usize) -> Result<Option<Arc<dyn Channel>>> {
        self.roster.get(index)?;
        let Ok(inner) = self.table.handle_for(index).await else {
            return Ok(None);
        };
        let channel = TrackedChannel::new(index, inner, self.table.clone(), self.messaging_timeout);
        Ok(Some(Arc::new(channel)))
    }

    pub async fn connection_state(&self, index: usize) -> Result<ConnectionState> {
        self.table.state(index).await
    }

    /// Marks a receiver's connection broken, as a failed dispatch would.
    /// Returns whether a connected entry actually changed state.
    pub async fn mark_broken(&self, index: usize) -> Result<bool> {
        self.table.mark_broken(index).await
    }

    // ------------------------------------------------------------------
    // Observer
    // ------------------------------------------------------------------

    /// Binds the connectivity observer. The proxy keeps only a weak
    /// reference; the caller owns the observer.
    pub fn set_observer<O>(&self, observer: &Arc<O>)
    where
        O: BroadcastObserver + 'static,
    {
        let observer: Arc<dyn BroadcastObserver> = observer.clone();
        self.notifier.set(Some(Arc::downgrade(&observer)));
    }

    pub fn clear_observer(&self) {
        self.notifier.set(None);
    }

    /// Currently bound observer, if it is still alive.
    pub fn observer(&self) -> Option<Arc<dyn BroadcastObserver>> {
        self.notifier.get()
    }

    // ------------------------------------------------------------------
    // Broadcast
    // ------------------------------------------------------------------

    /// Broadcasts an invocation to every receiver.
    pub async fn forward(&self, invocation: Invocation) -> BroadcastReply {
        self.forwarder.forward(&invocation).await
    }

    /// Value-returning broadcast.
    pub async fn invoke(&self, method: impl Into<String>, args: Value) -> BroadcastReply {
        self.forward(Invocation::value_returning(method, args)).await
    }

    /// Oneway broadcast.
    pub async fn send(&self, method: impl Into<String>, args: Value) -> BroadcastOutcome {
        self.forward(Invocation::oneway(method, args)).await.outcome
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn status(&self) -> ProxyStatus {
        let states = self.table.states().await;
        let receivers = self
            .roster
            .iter()
            .zip(states)
            .enumerate()
            .map(|(index, (receiver, state))| ReceiverStatus {
                index,
                name: receiver.name.clone(),
                host: receiver.host.clone(),
                state,
            })
            .collect();

        ProxyStatus {
            proxy: self.id,
            receivers,
            stats: self.stats.snapshot(),
        }
    }
}

impl std::fmt::Debug for BroadcastProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastProxy")
            .field("id", &self.id)
            .field("roster", &self.roster)
            .finish_non_exhaustive()
    }
}
