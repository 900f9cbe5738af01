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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::roster::Receiver;

static PROXY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a proxy instance, passed to observers so one
/// observer can watch several proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProxyId(u64);

impl ProxyId {
    pub(crate) fn next() -> Self {
        ProxyId(PROXY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy-{}", self.0)
    }
}

/// Receives connectivity transitions of a proxy.
///
/// Callbacks run synchronously while the proxy holds the lock of the
/// affected index, so events for one index arrive in order. They must not
/// call back into the same proxy for that index.
pub trait BroadcastObserver: Send + Sync {
    fn on_lost_connection(&self, proxy: ProxyId, name: &str, host: &str);

    fn on_made_connection(&self, proxy: ProxyId, name: &str, host: &str);
}

/// Holds the optional observer binding of one proxy.
///
/// The binding is weak: a dropped observer silently stops receiving events.
pub(crate) struct Notifier {
    proxy: ProxyId,
    observer: RwLock<Option<Weak<dyn BroadcastObserver>>>,
}

impl Notifier {
    pub(crate) fn new(proxy: ProxyId) -> Self {
        Self {
            proxy,
            observer: RwLock::new(None),
        }
    }

    pub(crate) fn set(&self, observer: Option<Weak<dyn BroadcastObserver>>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = observer;
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn BroadcastObserver>> {
        self.observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn made_connection(&self, receiver: &Receiver) {
        if let Some(observer) = self.get() {
            observer.on_made_connection(self.proxy, &receiver.name, &receiver.host);
        }
    }

    pub(crate) fn lost_connection(&self, receiver: &Receiver) {
        if let Some(observer) = self.get() {
            observer.on_lost_connection(self.proxy, &receiver.name, &receiver.host);
        }
    }
}
