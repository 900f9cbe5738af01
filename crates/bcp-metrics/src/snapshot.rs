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

use crate::outcome::{BroadcastOutcome, ReturnKind};

/// Counters for one return kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub fully_sent: u64,
    pub partially_sent: u64,
    pub failed: u64,
}

impl OutcomeCounts {
    pub fn get(&self, outcome: BroadcastOutcome) -> u64 {
        match outcome {
            BroadcastOutcome::FullySent => self.fully_sent,
            BroadcastOutcome::PartiallySent => self.partially_sent,
            BroadcastOutcome::Failed => self.failed,
        }
    }

    pub fn total(&self) -> u64 {
        self.fully_sent + self.partially_sent + self.failed
    }
}

impl fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fully sent, {} partially sent, {} failed",
            self.fully_sent, self.partially_sent, self.failed
        )
    }
}

/// Read-only copy of all six counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub oneway: OutcomeCounts,
    pub value_returning: OutcomeCounts,
}

impl StatsSnapshot {
    pub fn counts(&self, kind: ReturnKind) -> &OutcomeCounts {
        match kind {
            ReturnKind::Oneway => &self.oneway,
            ReturnKind::ValueReturning => &self.value_returning,
        }
    }

    pub fn get(&self, kind: ReturnKind, outcome: BroadcastOutcome) -> u64 {
        self.counts(kind).get(outcome)
    }

    /// Number of completed broadcast calls of either kind.
    pub fn total(&self) -> u64 {
        self.oneway.total() + self.value_returning.total()
    }
}
