//! Memo signaling for the formation state machine.
//!
//! Completion, critical-loss and host memos all travel over the same named
//! event channel:
//!
//! - `AllAnimalsGathered`, `AllItemsGathered`, `AllSlavesGathered` - phase completion
//! - `<group>CriticalPawnLost` - the group can no longer form
//! - `FormationDisrupted` / `FormationDisruptionResolved` - pause and resume
//!
//! Transitions subscribe to memos by name through their trigger lists.

mod types;

pub use types::{
    ALL_ANIMALS_GATHERED, ALL_ITEMS_GATHERED, ALL_SLAVES_GATHERED, FORMATION_DISRUPTED,
    FORMATION_DISRUPTION_RESOLVED, Memo, MemoBus,
};
