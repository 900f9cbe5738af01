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

use bcp_common::protocol::{BcpError, Result};

/// One remote endpoint in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Receiver {
    /// Name the receiver answers to on its host. Not required to be unique.
    pub name: String,
    /// Network location, e.g. "10.0.0.7:7400"
    pub host: String,
}

impl Receiver {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.host)
    }
}

/// Ordered, immutable list of receivers.
///
/// A receiver's position is its index for the lifetime of the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    receivers: Vec<Receiver>,
}

impl Roster {
    /// Builds a roster from parallel name and host lists.
    ///
    /// # Errors
    ///
    /// Returns [`BcpError::ConstructionMismatch`] when the lists differ in
    /// length.
    pub fn new(names: Vec<String>, hosts: Vec<String>) -> Result<Self> {
        if names.len() != hosts.len() {
            return Err(BcpError::ConstructionMismatch {
                names: names.len(),
                hosts: hosts.len(),
            });
        }

        let receivers = names
            .into_iter()
            .zip(hosts)
            .map(|(name, host)| Receiver { name, host })
            .collect();

        Ok(Self { receivers })
    }

    pub fn from_receivers(receivers: impl IntoIterator<Item = Receiver>) -> Self {
        Self {
            receivers: receivers.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Returns the receiver at `index`, or [`BcpError::InvalidIndex`].
    pub fn get(&self, index: usize) -> Result<&Receiver> {
        self.receivers.get(index).ok_or(BcpError::InvalidIndex {
            index,
            count: self.receivers.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Receiver> {
        self.receivers.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.receivers.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn hosts(&self) -> Vec<&str> {
        self.receivers.iter().map(|r| r.host.as_str()).collect()
    }

    /// First index whose receiver has this name and host.
    pub fn index_of(&self, name: &str, host: &str) -> Option<usize> {
        self.receivers
            .iter()
            .position(|r| r.name == name && r.host == host)
    }
}
