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

//! BCP Common Types and Transport
//!
//! This crate provides the protocol definitions and TCP transport layer shared
//! by the BCP broadcast call proxy and the receivers it talks to.
//!
//! # Overview
//!
//! - **Protocol Layer**: [`Request`], [`Response`] and the [`BcpError`] taxonomy
//! - **Transport Layer**: length-prefixed JSON over TCP, client and server side
//!
//! # Wire Format
//!
//! - **Transport**: TCP with keep-alive connections
//! - **Serialization**: JSON
//! - **Message Format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//! - **Max Message Size**: 100 MB
//!
//! # Example
//!
//! ```
//! use bcp_common::{Request, Response};
//! use serde_json::json;
//!
//! let request = Request::new("logger", "record", json!({"line": "hello"}));
//! let response = Response::success(request.id, json!(true));
//! assert_eq!(request.id, response.id);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
