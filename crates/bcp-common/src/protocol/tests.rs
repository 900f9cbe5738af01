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

use super::*;
use serde_json::json;

#[test]
fn test_request_creation() {
    let req = Request::new("logger", "record", json!({"line": "boot"}));
    assert_eq!(req.receiver, "logger");
    assert_eq!(req.method, "record");
    assert_eq!(req.args, json!({"line": "boot"}));
    assert!(!req.oneway);
}

#[test]
fn test_request_ids_are_unique() {
    let a = Request::new("r", "m", json!(null));
    let b = Request::new("r", "m", json!(null));
    assert_ne!(a.id, b.id);
}

#[test]
fn test_oneway_request() {
    let req = Request::new("r", "notify", json!([])).oneway();
    assert!(req.oneway);
}

#[test]
fn test_ping_request() {
    let req = Request::ping("alarms");
    assert!(req.is_ping());
    assert_eq!(req.receiver, "alarms");
    assert_eq!(req.method, PING_METHOD);
}

#[test]
fn test_oneway_defaults_to_false_when_missing() {
    let raw = r#"{"id":1,"receiver":"r","method":"m","args":null}"#;
    let req: Request = serde_json::from_str(raw).unwrap();
    assert!(!req.oneway);
}

#[test]
fn test_response_into_result_success() {
    let resp = Response::success(1, json!(42));
    assert_eq!(resp.into_result().unwrap(), json!(42));
}

#[test]
fn test_response_into_result_missing_value_is_null() {
    let resp = Response {
        id: 1,
        result: None,
        error: None,
        success: true,
    };
    assert_eq!(resp.into_result().unwrap(), json!(null));
}

#[test]
fn test_response_into_result_error() {
    let resp = Response::error(1, "boom");
    match resp.into_result() {
        Err(BcpError::Remote(msg)) => assert_eq!(msg, "boom"),
        other => panic!("Expected Remote error, got {:?}", other),
    }
}

#[test]
fn test_connection_loss_classification() {
    assert!(BcpError::ConnectionWentDown("reset".into()).is_connection_loss());
    assert!(BcpError::MessagingTimeout(100).is_connection_loss());
    assert!(BcpError::InvalidResponse("id mismatch".into()).is_connection_loss());
    assert!(BcpError::Io(std::io::Error::from(std::io::ErrorKind::Other)).is_connection_loss());
    assert!(!BcpError::Remote("boom".into()).is_connection_loss());
    assert!(!BcpError::Config("bad".into()).is_connection_loss());
    assert!(!BcpError::InvalidIndex { index: 3, count: 2 }.is_connection_loss());
}

#[test]
fn test_error_messages() {
    let err = BcpError::InvalidIndex { index: 5, count: 3 };
    assert_eq!(err.to_string(), "Receiver index 5 out of range (count 3)");

    let err = BcpError::ConstructionMismatch { names: 2, hosts: 1 };
    assert_eq!(
        err.to_string(),
        "Receiver names and hosts differ in length (2 names, 1 hosts)"
    );
}
