//! Duties written into the host's per-actor duty slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::actor::{ActorId, Position};

/// Which kind of member a gather-pawns duty herds toward the meeting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PawnsToGather {
    Animals,
    Slaves,
}

/// A duty handed to one actor. Execution is up to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "duty", rename_all = "snake_case")]
pub enum Duty {
    TravelTo { target: Position },
    GatherItems { meeting_point: Position },
    GatherPawns {
        meeting_point: Position,
        pawns: PawnsToGather,
    },
    Wait { near: Option<Position> },
    Wander { around: Position },
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duty::TravelTo { target } => write!(f, "travel to {}", target),
            Duty::GatherItems { meeting_point } => write!(f, "gather items at {}", meeting_point),
            Duty::GatherPawns {
                meeting_point,
                pawns,
            } => {
                let what = match pawns {
                    PawnsToGather::Animals => "animals",
                    PawnsToGather::Slaves => "slaves",
                };
                write!(f, "gather {} at {}", what, meeting_point)
            }
            Duty::Wait { near: Some(p) } => write!(f, "wait near {}", p),
            Duty::Wait { near: None } => write!(f, "wait"),
            Duty::Wander { around } => write!(f, "wander around {}", around),
        }
    }
}

/// Host-owned duty slots.
pub trait DutySink {
    fn assign(&mut self, actor: &ActorId, duty: Duty);
}

/// A plain duty table, used by the simulated host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DutyBoard {
    duties: BTreeMap<ActorId, Duty>,
}

impl DutyBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, actor: &ActorId) -> Option<&Duty> {
        self.duties.get(actor)
    }

    pub fn len(&self) -> usize {
        self.duties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &Duty)> {
        self.duties.iter()
    }

    /// Drop the slot of an actor that left the group.
    pub fn clear(&mut self, actor: &ActorId) {
        self.duties.remove(actor);
    }
}

impl DutySink for DutyBoard {
    fn assign(&mut self, actor: &ActorId, duty: Duty) {
        self.duties.insert(actor.clone(), duty);
    }
}
