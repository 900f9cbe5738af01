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

/// Declared return contract of a broadcast operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// Fire-and-forget: no value comes back
    Oneway,
    /// Each receiver returns a value
    ValueReturning,
}

/// Aggregate classification of one broadcast call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastOutcome {
    /// Every receiver in the roster got the call
    FullySent,
    /// At least one receiver got it and at least one did not
    PartiallySent,
    /// No receiver got it (including an empty roster)
    Failed,
}

impl BroadcastOutcome {
    /// Classifies a call from the number of receivers that succeeded out of
    /// the roster size.
    pub fn classify(succeeded: usize, roster_len: usize) -> Self {
        if succeeded == 0 {
            BroadcastOutcome::Failed
        } else if succeeded >= roster_len {
            BroadcastOutcome::FullySent
        } else {
            BroadcastOutcome::PartiallySent
        }
    }
}

impl fmt::Display for BroadcastOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BroadcastOutcome::FullySent => "fully sent",
            BroadcastOutcome::PartiallySent => "partially sent",
            BroadcastOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}
