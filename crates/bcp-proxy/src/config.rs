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
use std::path::Path;
use std::time::Duration;

use bcp_common::protocol::{BcpError, Result};

use crate::roster::Receiver;

/// Proxy configuration.
///
/// # Default Configuration
///
/// - `messaging_timeout`: 30 seconds per receiver per call
/// - `connect_timeout`: 5 seconds per connection attempt (including the
///   receiver handshake)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Upper bound on one dispatch to one receiver. A dispatch that takes
    /// longer is abandoned and its connection marked broken.
    pub messaging_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            messaging_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ProxyConfig {
    pub fn with_messaging_timeout(mut self, timeout: Duration) -> Self {
        self.messaging_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// One receiver entry as written in a configuration file.
///
/// ```json
/// [
///   { "Name": "logger", "Host": "10.0.0.1:7400" },
///   { "Name": "logger", "Host": "10.0.0.2:7400" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Host")]
    pub host: String,
}

impl From<ReceiverConfig> for Receiver {
    fn from(config: ReceiverConfig) -> Self {
        Receiver::new(config.name, config.host)
    }
}

/// Parses a JSON receiver list.
pub fn parse_receivers(json: &str) -> Result<Vec<Receiver>> {
    let entries: Vec<ReceiverConfig> = serde_json::from_str(json)
        .map_err(|e| BcpError::Config(format!("Invalid receiver list: {}", e)))?;

    Ok(entries.into_iter().map(Receiver::from).collect())
}

/// Reads and parses a JSON receiver list file.
///
/// # Errors
///
/// Returns [`BcpError::Config`] if the file cannot be read or is not a
/// list of `{"Name", "Host"}` objects.
pub fn load_receivers(path: impl AsRef<Path>) -> Result<Vec<Receiver>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| BcpError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    parse_receivers(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.messaging_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_setters() {
        let config = ProxyConfig::default()
            .with_messaging_timeout(Duration::from_millis(250))
            .with_connect_timeout(Duration::from_millis(100));

        assert_eq!(config.messaging_timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_parse_receivers_keeps_order() {
        let receivers = parse_receivers(
            r#"[{"Name": "b", "Host": "h2:2"}, {"Name": "a", "Host": "h1:1"}]"#,
        )
        .unwrap();

        assert_eq!(
            receivers,
            vec![Receiver::new("b", "h2:2"), Receiver::new("a", "h1:1")]
        );
    }

    #[test]
    fn test_parse_receivers_rejects_missing_host() {
        let err = parse_receivers(r#"[{"Name": "a"}]"#).unwrap_err();
        assert!(matches!(err, BcpError::Config(_)));
    }

    #[test]
    fn test_load_receivers_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Name": "logger", "Host": "127.0.0.1:7400"}}]"#).unwrap();

        let receivers = load_receivers(file.path()).unwrap();
        assert_eq!(receivers, vec![Receiver::new("logger", "127.0.0.1:7400")]);
    }

    #[test]
    fn test_load_receivers_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_receivers(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BcpError::Config(_)));
    }
}
