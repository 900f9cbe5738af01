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
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

pub type RequestId = u64;
pub type MethodName = String;
pub type RpcArgs = serde_json::Value;

/// Handshake method answered by every receiver server for its own name.
pub const PING_METHOD: &str = "_ping";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A single invocation addressed to one named receiver.
///
/// `oneway` requests are written to the wire and never answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub receiver: String,
    pub method: MethodName,
    pub args: RpcArgs,
    #[serde(default)]
    pub oneway: bool,
}

impl Request {
    pub fn new(receiver: impl Into<String>, method: impl Into<String>, args: RpcArgs) -> Self {
        Request {
            id: generate_request_id(),
            receiver: receiver.into(),
            method: method.into(),
            args,
            oneway: false,
        }
    }

    /// Builds the handshake request a connector sends after opening a stream.
    pub fn ping(receiver: impl Into<String>) -> Self {
        Self::new(receiver, PING_METHOD, serde_json::Value::Null)
    }

    pub fn oneway(mut self) -> Self {
        self.oneway = true;
        self
    }

    pub fn is_ping(&self) -> bool {
        self.method == PING_METHOD
    }
}

fn generate_request_id() -> RequestId {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let counter = REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst);

    // Upper 32 bits from the clock, lower 32 bits from the counter
    (timestamp & 0xFFFFFFFF00000000) | (counter & 0xFFFFFFFF)
}
