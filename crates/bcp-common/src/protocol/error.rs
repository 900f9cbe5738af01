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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BcpError {
    #[error("Could not connect to receiver {name} on {host}: {reason}")]
    CouldNotConnect {
        name: String,
        host: String,
        reason: String,
    },

    #[error("Connection went down: {0}")]
    ConnectionWentDown(String),

    #[error("Messaging timeout after {0}ms")]
    MessagingTimeout(u64),

    #[error("Receiver index {index} out of range (count {count})")]
    InvalidIndex { index: usize, count: usize },

    #[error("Receiver names and hosts differ in length ({names} names, {hosts} hosts)")]
    ConstructionMismatch { names: usize, hosts: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Receiver reported an error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BcpError {
    /// Whether the channel this error was seen on can no longer be trusted:
    /// the peer is gone, or the stream may hold a reply nobody will read.
    ///
    /// Application errors reported by the receiver are not connection loss.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            BcpError::ConnectionWentDown(_)
                | BcpError::MessagingTimeout(_)
                | BcpError::InvalidResponse(_)
                | BcpError::Transport(_)
                | BcpError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BcpError>;
