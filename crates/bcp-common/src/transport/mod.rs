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

//! BCP Transport Layer
//!
//! Length-prefixed JSON over TCP, used between a broadcast proxy and its
//! receivers.
//!
//! # Components
//!
//! - **[`JsonCodec`]**: Encode/decode protocol messages to JSON
//! - **[`TcpTransportAsync`]**: Client side, used by the proxy's TCP channels
//! - **[`TcpServer`]**: Receiver side, serves one named receiver
//!
//! # Wire Format
//!
//! ```text
//! [4-byte length as u32 big-endian] [JSON data]
//! ```
//!
//! Messages larger than [`MAX_MESSAGE_SIZE`] are rejected on read.

pub mod codec;
pub mod tcp;
pub mod tcp_server;

pub use codec::JsonCodec;
pub use tcp::TcpTransportAsync;
pub use tcp_server::TcpServer;

/// Maximum accepted frame size (100 MB)
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;
