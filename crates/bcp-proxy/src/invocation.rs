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
use serde_json::Value;
use std::collections::BTreeMap;

use bcp_metrics::{BroadcastOutcome, ReturnKind};

/// An operation to broadcast: name, arguments and declared return kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub method: String,
    pub args: Value,
    pub kind: ReturnKind,
}

impl Invocation {
    pub fn new(method: impl Into<String>, args: Value, kind: ReturnKind) -> Self {
        Self {
            method: method.into(),
            args,
            kind,
        }
    }

    pub fn value_returning(method: impl Into<String>, args: Value) -> Self {
        Self::new(method, args, ReturnKind::ValueReturning)
    }

    pub fn oneway(method: impl Into<String>, args: Value) -> Self {
        Self::new(method, args, ReturnKind::Oneway)
    }

    pub fn is_oneway(&self) -> bool {
        self.kind == ReturnKind::Oneway
    }
}

/// Result of one broadcast call.
///
/// `results` maps roster index to the value that receiver returned. Only
/// receivers that succeeded appear, and oneway calls never carry results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastReply {
    pub outcome: BroadcastOutcome,
    pub results: BTreeMap<usize, Value>,
}

impl BroadcastReply {
    pub fn is_fully_sent(&self) -> bool {
        self.outcome == BroadcastOutcome::FullySent
    }
}
