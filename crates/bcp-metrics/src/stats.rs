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

use std::sync::atomic::{AtomicU64, Ordering};

use crate::outcome::{BroadcastOutcome, ReturnKind};
use crate::snapshot::{OutcomeCounts, StatsSnapshot};

/// Atomic counter triple for one return kind.
#[derive(Debug, Default)]
struct OutcomeCounters {
    fully_sent: AtomicU64,
    partially_sent: AtomicU64,
    failed: AtomicU64,
}

impl OutcomeCounters {
    fn counter(&self, outcome: BroadcastOutcome) -> &AtomicU64 {
        match outcome {
            BroadcastOutcome::FullySent => &self.fully_sent,
            BroadcastOutcome::PartiallySent => &self.partially_sent,
            BroadcastOutcome::Failed => &self.failed,
        }
    }

    fn load(&self) -> OutcomeCounts {
        OutcomeCounts {
            fully_sent: self.fully_sent.load(Ordering::Relaxed),
            partially_sent: self.partially_sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// The six broadcast counters of one proxy instance.
///
/// Counters only ever grow; the only way to reset them is to build a new
/// `BroadcastStats`.
#[derive(Debug, Default)]
pub struct BroadcastStats {
    oneway: OutcomeCounters,
    value_returning: OutcomeCounters,
}

impl BroadcastStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed broadcast call.
    pub fn record(&self, kind: ReturnKind, outcome: BroadcastOutcome) {
        let counters = match kind {
            ReturnKind::Oneway => &self.oneway,
            ReturnKind::ValueReturning => &self.value_returning,
        };
        counters.counter(outcome).fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            oneway: self.oneway.load(),
            value_returning: self.value_returning.load(),
        }
    }
}
