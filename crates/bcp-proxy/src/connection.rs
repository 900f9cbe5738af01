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
use std::sync::Arc;

use crate::connector::Channel;

/// Connection state of one roster index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Never connected, or the last attempt failed
    Absent,
    /// A live channel is cached for this index
    Connected,
    /// The cached channel failed; the next raise retries
    Broken,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Absent => "absent",
            ConnectionState::Connected => "connected",
            ConnectionState::Broken => "broken",
        };
        f.write_str(s)
    }
}

/// Connection table slot. Only `Connected` carries a channel.
#[derive(Clone, Default)]
pub(crate) enum ConnectionEntry {
    #[default]
    Absent,
    Connected(Arc<dyn Channel>),
    Broken,
}

impl ConnectionEntry {
    pub(crate) fn state(&self) -> ConnectionState {
        match self {
            ConnectionEntry::Absent => ConnectionState::Absent,
            ConnectionEntry::Connected(_) => ConnectionState::Connected,
            ConnectionEntry::Broken => ConnectionState::Broken,
        }
    }

    pub(crate) fn channel(&self) -> Option<&Arc<dyn Channel>> {
        match self {
            ConnectionEntry::Connected(channel) => Some(channel),
            _ => None,
        }
    }
}

impl fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEntry::Connected(channel) => {
                write!(f, "Connected({})", channel.receiver())
            }
            other => write!(f, "{:?}", other.state()),
        }
    }
}
