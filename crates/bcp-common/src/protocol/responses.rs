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

//! BCP Response Types
//!
//! This module defines the reply a receiver sends back for a value-returning
//! request.

use super::error::{BcpError, Result};
use super::RequestId;
use serde::{Deserialize, Serialize};

/// Result value carried by a successful response.
pub type RpcResult = serde_json::Value;

/// A reply from a receiver.
///
/// # Fields
///
/// - `id`: The request ID this response corresponds to
/// - `result`: The result value (present on success)
/// - `error`: Error message (present on failure)
/// - `success`: Whether the request succeeded
///
/// # Example
///
/// ```
/// use bcp_common::protocol::responses::Response;
/// use serde_json::json;
///
/// let success = Response::success(7, json!({"accepted": true}));
/// assert!(success.success);
///
/// let error = Response::error(7, "unknown method");
/// assert_eq!(error.error.as_deref(), Some("unknown method"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub result: Option<RpcResult>,
    pub error: Option<String>,
    pub success: bool,
}

impl Response {
    /// Creates a successful response.
    pub fn success(id: RequestId, result: RpcResult) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
            success: true,
        }
    }

    /// Creates an error response.
    pub fn error(id: RequestId, error: impl Into<String>) -> Self {
        Response {
            id,
            result: None,
            error: Some(error.into()),
            success: false,
        }
    }

    /// Converts the response into the value it carries, or a
    /// [`BcpError::Remote`] when the receiver reported a failure.
    ///
    /// A successful response without a result is read as `null`.
    pub fn into_result(self) -> Result<RpcResult> {
        if self.success {
            Ok(self.result.unwrap_or(serde_json::Value::Null))
        } else {
            Err(BcpError::Remote(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}
