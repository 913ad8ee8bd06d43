//! Sticky rendezvous tracking.
//!
//! A pawn that reached the meeting point once stays counted even after it
//! walks off to eat, so a gather phase can finish while members come and go.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::actor::{Actor, ActorId, Position};
use crate::host::{Danger, Host};

/// Selects which roster members a phase waits for.
pub type Membership = fn(&Actor) -> bool;

/// Default proximity tolerance around the meeting point.
pub const DEFAULT_GATHER_RADIUS: f32 = 10.0;

/// Conditions an actor must meet to be recorded as present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatherCriteria {
    /// Horizontal distance tolerance around the meeting point
    pub radius: f32,
    /// Worst danger a path to the meeting point may cross
    pub max_danger: Danger,
    /// Presence only counts while the actor is being escorted or following
    pub require_following: bool,
}

impl Default for GatherCriteria {
    fn default() -> Self {
        Self {
            radius: DEFAULT_GATHER_RADIUS,
            max_danger: Danger::Deadly,
            require_following: true,
        }
    }
}

impl GatherCriteria {
    pub fn with_following(mut self, require_following: bool) -> Self {
        self.require_following = require_following;
        self
    }
}

/// Serialized shape of a tracker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerState {
    pub meeting_point: Position,
    #[serde(default)]
    pub gathered: Vec<ActorId>,
}

/// Remembers every qualifying actor that has been at the meeting point since
/// the meeting point was last set.
#[derive(Debug, Clone, PartialEq)]
pub struct RendezvousTracker {
    location: Position,
    ever_present: BTreeSet<ActorId>,
}

impl RendezvousTracker {
    pub fn new(location: Position) -> Self {
        Self {
            location,
            ever_present: BTreeSet::new(),
        }
    }

    pub fn location(&self) -> Position {
        self.location
    }

    /// Move the meeting point. Everything gathered so far is forgotten.
    pub fn reset(&mut self, location: Position) {
        self.location = location;
        self.ever_present.clear();
    }

    /// Record every member currently present at the meeting point.
    ///
    /// Returns true if at least one actor was recorded for the first time.
    pub fn evaluate(&mut self, host: &dyn Host, members: Membership, criteria: &GatherCriteria) -> bool {
        let mut newly_ready = false;

        for actor in host.roster() {
            if !members(actor) || self.ever_present.contains(&actor.id) {
                continue;
            }
            if criteria.require_following && !actor.following {
                continue;
            }
            if !actor.spawned || !actor.position.within(self.location, criteria.radius) {
                continue;
            }
            if !host.can_reach(actor, self.location, criteria.max_danger) {
                continue;
            }

            debug!(actor = %actor.id, meeting_point = %self.location, "actor gathered");
            self.ever_present.insert(actor.id.clone());
            newly_ready = true;
        }

        newly_ready
    }

    /// Every member has been recorded at least once. True for an empty membership.
    pub fn is_complete(&self, roster: &[Actor], members: Membership) -> bool {
        roster
            .iter()
            .filter(|a| members(a))
            .all(|a| self.ever_present.contains(&a.id))
    }

    /// (gathered, required) counts over the current roster.
    pub fn progress(&self, roster: &[Actor], members: Membership) -> (usize, usize) {
        roster
            .iter()
            .filter(|a| members(a))
            .fold((0, 0), |(gathered, required), a| {
                let seen = usize::from(self.ever_present.contains(&a.id));
                (gathered + seen, required + 1)
            })
    }

    pub fn has_gathered(&self, actor: &ActorId) -> bool {
        self.ever_present.contains(actor)
    }

    pub fn gathered(&self) -> impl Iterator<Item = &ActorId> {
        self.ever_present.iter()
    }

    pub fn gathered_count(&self) -> usize {
        self.ever_present.len()
    }

    pub fn state(&self) -> TrackerState {
        TrackerState {
            meeting_point: self.location,
            gathered: self.ever_present.iter().cloned().collect(),
        }
    }

    pub fn from_state(state: TrackerState) -> Self {
        Self {
            location: state.meeting_point,
            ever_present: state.gathered.into_iter().collect(),
        }
    }
}
