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

use bcp_metrics::StatsSnapshot;

use crate::connection::ConnectionState;
use crate::notifier::ProxyId;

/// One roster line of a [`ProxyStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverStatus {
    pub index: usize,
    pub name: String,
    pub host: String,
    pub state: ConnectionState,
}

/// Point-in-time report of a proxy: roster, connection states, counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub proxy: ProxyId,
    pub receivers: Vec<ReceiverStatus>,
    pub stats: StatsSnapshot,
}

impl ProxyStatus {
    pub fn connected(&self) -> usize {
        self.receivers
            .iter()
            .filter(|r| r.state == ConnectionState::Connected)
            .count()
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} of {} receivers connected",
            self.proxy,
            self.connected(),
            self.receivers.len()
        )?;
        for r in &self.receivers {
            writeln!(f, "  [{}] {} @ {}: {}", r.index, r.name, r.host, r.state)?;
        }
        writeln!(f, "oneway: {}", self.stats.oneway)?;
        write!(f, "value-returning: {}", self.stats.value_returning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcp_metrics::OutcomeCounts;

    fn sample() -> ProxyStatus {
        ProxyStatus {
            proxy: ProxyId::next(),
            receivers: vec![
                ReceiverStatus {
                    index: 0,
                    name: "a".to_string(),
                    host: "h:1".to_string(),
                    state: ConnectionState::Connected,
                },
                ReceiverStatus {
                    index: 1,
                    name: "b".to_string(),
                    host: "h:2".to_string(),
                    state: ConnectionState::Broken,
                },
            ],
            stats: StatsSnapshot {
                oneway: OutcomeCounts::default(),
                value_returning: OutcomeCounts {
                    fully_sent: 2,
                    partially_sent: 1,
                    failed: 0,
                },
            },
        }
    }

    #[test]
    fn test_display() {
        let status = sample();
        let rendered = status.to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], format!("{}: 1 of 2 receivers connected", status.proxy));
        assert_eq!(lines[1], "  [0] a @ h:1: connected");
        assert_eq!(lines[2], "  [1] b @ h:2: broken");
        assert_eq!(lines[3], "oneway: 0 fully sent, 0 partially sent, 0 failed");
        assert_eq!(lines[4], "value-returning: 2 fully sent, 1 partially sent, 0 failed");
    }

    #[test]
    fn test_serializes_states_snake_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["receivers"][1]["state"], "broken");
        assert_eq!(json["stats"]["value_returning"]["fully_sent"], 2);
    }
}
