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

//! BCP Broadcast Statistics
//!
//! Lock-free counters recording how each broadcast call ended, split by the
//! call's return kind.
//!
//! # Model
//!
//! Every forwarded call is either [`ReturnKind::Oneway`] or
//! [`ReturnKind::ValueReturning`], and ends as exactly one
//! [`BroadcastOutcome`]. That gives six counters:
//!
//! | | fully sent | partially sent | failed |
//! |---|---|---|---|
//! | oneway | x | x | x |
//! | value-returning | x | x | x |
//!
//! Each call increments exactly one of them, once. Counters are never
//! decremented and live as long as the [`BroadcastStats`] that owns them.
//!
//! # Usage Example
//!
//! ```rust
//! use bcp_metrics::{BroadcastOutcome, BroadcastStats, ReturnKind};
//!
//! let stats = BroadcastStats::new();
//! stats.record(ReturnKind::ValueReturning, BroadcastOutcome::PartiallySent);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.value_returning.partially_sent, 1);
//! assert_eq!(snapshot.total(), 1);
//! ```
//!
//! # Thread Safety
//!
//! [`BroadcastStats`] is `Send + Sync`; every increment is a single atomic
//! add, so no update is ever partially observed.

mod outcome;
mod snapshot;
mod stats;

pub use outcome::{BroadcastOutcome, ReturnKind};
pub use snapshot::{OutcomeCounts, StatsSnapshot};
pub use stats::BroadcastStats;
