//! Rendezvous tracking for gather phases.

mod rendezvous;

pub use rendezvous::{
    DEFAULT_GATHER_RADIUS, GatherCriteria, Membership, RendezvousTracker, TrackerState,
};
