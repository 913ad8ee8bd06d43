//! Memo types for the formation event channel.
//!
//! A memo is a named string event. Phases publish completion memos, the
//! viability monitor publishes the critical-loss memo, and the host
//! publishes its own memos (disruptions, rest finished, destination reached).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Published by the animal gathering phase once every animal has been gathered.
pub const ALL_ANIMALS_GATHERED: &str = "AllAnimalsGathered";
/// Published by the cargo phase once nothing is left to load.
pub const ALL_ITEMS_GATHERED: &str = "AllItemsGathered";
/// Published by the detainee gathering phase once every detainee has been gathered.
pub const ALL_SLAVES_GATHERED: &str = "AllSlavesGathered";
/// Host memo: a member's morale broke, the current phase must pause.
pub const FORMATION_DISRUPTED: &str = "FormationDisrupted";
/// Host memo: the disruption is over, resume the paused phase.
pub const FORMATION_DISRUPTION_RESOLVED: &str = "FormationDisruptionResolved";

const CRITICAL_PAWN_LOST_SUFFIX: &str = "CriticalPawnLost";

/// A named event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memo(String);

impl Memo {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The critical-loss memo of a group, e.g. `CaravanCriticalPawnLost`.
    pub fn critical_pawn_lost(group: &str) -> Self {
        Self(format!("{}{}", group, CRITICAL_PAWN_LOST_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this memo matches a trigger name.
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Memo {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// FIFO memo channel shared by the phases of one group.
///
/// Publishers push, the formation drains once per entry point and hands each
/// memo to the graph's transition triggers.
#[derive(Debug, Clone, Default)]
pub struct MemoBus {
    pending: VecDeque<Memo>,
    published: u64,
}

impl MemoBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, memo: Memo) {
        self.published += 1;
        self.pending.push_back(memo);
    }

    /// Take the next memo in publication order.
    pub fn next(&mut self) -> Option<Memo> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of memos published over the bus lifetime.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Drop anything still queued.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
