//! Phase definition for the formation state machine.
//!
//! This module provides:
//! - `Phase`, one node of the state machine, composed from a duty plan and a
//!   completion rule instead of per-phase subclasses
//! - Membership predicates and duty plans for the caravan phases
//! - Constructors for the three sticky gather phases

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::actor::{Actor, Position};
use crate::duty::{Duty, DutySink, PawnsToGather};
use crate::host::Host;
use crate::signals::{ALL_ANIMALS_GATHERED, ALL_ITEMS_GATHERED, ALL_SLAVES_GATHERED, Memo, MemoBus};
use crate::tracker::{GatherCriteria, Membership, RendezvousTracker, TrackerState};

pub const GATHER_ANIMALS: &str = "GatherAnimals";
pub const GATHER_ITEMS: &str = "GatherItems";
pub const GATHER_SLAVES: &str = "GatherSlaves";

/// Ticks between two completion checks.
pub const DEFAULT_CHECK_INTERVAL: u64 = 100;

const PAUSE_PREFIX: &str = "Pause_";

/// Maps one roster member to its duty for the current meeting point.
pub type DutyPlan = fn(&Actor, Position) -> Duty;

/// Host-state readiness check for phases without gather semantics.
pub type Readiness = fn(&dyn Host) -> bool;

/// Symbolic phase name (e.g. `GatherAnimals`, `Pause_GatherAnimals`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseId(String);

impl PhaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the pause phase paired with this phase.
    pub fn pause(&self) -> PhaseId {
        PhaseId(format!("{}{}", PAUSE_PREFIX, self.0))
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What kind of node a phase is in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseKind {
    /// Orchestrator phase with its own completion rule
    Gather,
    /// Phase implemented by the host; it completes through host memos
    Host,
    /// Holding phase entered on disruption, returns to `origin`
    Pause { origin: PhaseId },
    /// End of the process, no outgoing transitions
    Terminal,
}

/// When a phase is done.
#[derive(Clone)]
pub enum Completion {
    /// Every member has been at the meeting point at least once
    Rendezvous {
        tracker: RendezvousTracker,
        members: Membership,
        criteria: GatherCriteria,
    },
    /// A readiness predicate over the host state holds
    Ready(Readiness),
    /// The host signals completion itself
    External,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Rendezvous {
                tracker, criteria, ..
            } => f
                .debug_struct("Rendezvous")
                .field("tracker", tracker)
                .field("criteria", criteria)
                .finish_non_exhaustive(),
            Completion::Ready(_) => f.write_str("Ready"),
            Completion::External => f.write_str("External"),
        }
    }
}

/// One state of the formation state machine.
#[derive(Clone)]
pub struct Phase {
    id: PhaseId,
    kind: PhaseKind,
    meeting_point: Position,
    duties: DutyPlan,
    completion: Completion,
    /// Memo published once the completion rule holds
    memo: Option<Memo>,
    /// Skip the completion rule and publish on the first check
    fast_forward: bool,
    check_interval: u64,
    next_check: Option<u64>,
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("meeting_point", &self.meeting_point)
            .field("completion", &self.completion)
            .field("memo", &self.memo)
            .field("fast_forward", &self.fast_forward)
            .field("check_interval", &self.check_interval)
            .finish_non_exhaustive()
    }
}

impl Phase {
    fn with_parts(
        id: PhaseId,
        kind: PhaseKind,
        meeting_point: Position,
        duties: DutyPlan,
        completion: Completion,
        memo: Option<Memo>,
    ) -> Self {
        Self {
            id,
            kind,
            meeting_point,
            duties,
            completion,
            memo,
            fast_forward: false,
            check_interval: DEFAULT_CHECK_INTERVAL,
            next_check: None,
        }
    }

    /// A sticky gather phase waiting for every `members` actor to show up once.
    pub fn gather(
        id: impl Into<PhaseId>,
        meeting_point: Position,
        members: Membership,
        duties: DutyPlan,
        criteria: GatherCriteria,
        memo: Memo,
    ) -> Self {
        Self::with_parts(
            id.into(),
            PhaseKind::Gather,
            meeting_point,
            duties,
            Completion::Rendezvous {
                tracker: RendezvousTracker::new(meeting_point),
                members,
                criteria,
            },
            Some(memo),
        )
    }

    /// A phase that completes as soon as `ready` holds.
    pub fn ready(
        id: impl Into<PhaseId>,
        meeting_point: Position,
        duties: DutyPlan,
        ready: Readiness,
        memo: Memo,
    ) -> Self {
        Self::with_parts(
            id.into(),
            PhaseKind::Gather,
            meeting_point,
            duties,
            Completion::Ready(ready),
            Some(memo),
        )
    }

    /// A phase the host implements; only its duties run here.
    pub fn host(id: impl Into<PhaseId>, meeting_point: Position, duties: DutyPlan) -> Self {
        Self::with_parts(
            id.into(),
            PhaseKind::Host,
            meeting_point,
            duties,
            Completion::External,
            None,
        )
    }

    /// The pause counterpart of `origin`.
    pub fn pause(origin: &Phase) -> Self {
        Self::with_parts(
            origin.id.pause(),
            PhaseKind::Pause {
                origin: origin.id.clone(),
            },
            origin.meeting_point,
            pause_duty,
            Completion::External,
            None,
        )
    }

    /// A terminal phase.
    pub fn terminal(id: impl Into<PhaseId>, meeting_point: Position) -> Self {
        Self::with_parts(
            id.into(),
            PhaseKind::Terminal,
            meeting_point,
            disbanded_duty,
            Completion::External,
            None,
        )
    }

    pub fn with_fast_forward(mut self, fast_forward: bool) -> Self {
        self.fast_forward = fast_forward;
        self
    }

    pub fn with_check_interval(mut self, ticks: u64) -> Self {
        self.check_interval = ticks.max(1);
        self
    }

    pub fn id(&self) -> &PhaseId {
        &self.id
    }

    pub fn kind(&self) -> &PhaseKind {
        &self.kind
    }

    pub fn memo(&self) -> Option<&Memo> {
        self.memo.as_ref()
    }

    pub fn meeting_point(&self) -> Position {
        self.meeting_point
    }

    pub fn is_fast_forward(&self) -> bool {
        self.fast_forward
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, PhaseKind::Terminal)
    }

    pub fn is_pause(&self) -> bool {
        matches!(self.kind, PhaseKind::Pause { .. })
    }

    pub fn tracker(&self) -> Option<&RendezvousTracker> {
        match &self.completion {
            Completion::Rendezvous { tracker, .. } => Some(tracker),
            _ => None,
        }
    }

    /// Move the meeting point. A tracker, if any, starts over.
    pub fn set_meeting_point(&mut self, meeting_point: Position) {
        self.meeting_point = meeting_point;
        if let Completion::Rendezvous { tracker, .. } = &mut self.completion {
            tracker.reset(meeting_point);
        }
    }

    /// Give every roster member its duty for this phase.
    pub fn assign_duties(&self, roster: &[Actor], sink: &mut dyn DutySink) {
        for actor in roster {
            sink.assign(&actor.id, (self.duties)(actor, self.meeting_point));
        }
    }

    /// Called when the graph makes this phase current. The first tick after
    /// entry always runs a completion check.
    pub fn on_enter(&mut self) {
        self.next_check = None;
    }

    /// Run the completion check if it is due and publish the memo when done.
    ///
    /// Returns true if the memo was published on this call.
    pub fn tick(&mut self, host: &dyn Host, bus: &mut MemoBus) -> bool {
        let now = host.ticks_game();
        if self.next_check.is_some_and(|due| now < due) {
            return false;
        }
        self.next_check = Some(now.saturating_add(self.check_interval));

        let Some(memo) = self.memo.clone() else {
            return false;
        };

        let done = self.fast_forward || self.check_complete(host);
        if done {
            debug!(phase = %self.id, memo = %memo, fast_forward = self.fast_forward, "phase complete");
            bus.publish(memo);
        }
        done
    }

    fn check_complete(&mut self, host: &dyn Host) -> bool {
        match &mut self.completion {
            Completion::Rendezvous {
                tracker,
                members,
                criteria,
            } => {
                tracker.evaluate(host, *members, criteria);
                let (gathered, required) = tracker.progress(host.roster(), *members);
                debug!(phase = %self.id, gathered, required, "rendezvous check");
                tracker.is_complete(host.roster(), *members)
            }
            Completion::Ready(ready) => ready(host),
            Completion::External => false,
        }
    }

    /// Tracker state to persist, if this phase gathers.
    pub fn tracker_state(&self) -> Option<TrackerState> {
        self.tracker().map(RendezvousTracker::state)
    }

    /// Restore persisted state before the next tick.
    pub fn restore(&mut self, meeting_point: Position, tracker: Option<TrackerState>) {
        self.meeting_point = meeting_point;
        if let Completion::Rendezvous { tracker: current, .. } = &mut self.completion {
            *current = match tracker {
                Some(state) => RendezvousTracker::from_state(state),
                None => RendezvousTracker::new(meeting_point),
            };
        }
    }
}

// =========================================
// Membership predicates
// =========================================

pub fn is_leader(actor: &Actor) -> bool {
    actor.role.is_leader()
}

pub fn is_animal(actor: &Actor) -> bool {
    actor.role.is_animal()
}

/// Neither a leader nor an animal.
pub fn is_detainee(actor: &Actor) -> bool {
    !actor.role.is_leader() && !actor.role.is_animal()
}

// =========================================
// Duty plans
// =========================================

/// Leaders herd the animals in; animals head there too; detainees wait.
pub fn gather_animals_duty(actor: &Actor, meeting_point: Position) -> Duty {
    if actor.role.is_leader() || actor.role.is_animal() {
        Duty::GatherPawns {
            meeting_point,
            pawns: PawnsToGather::Animals,
        }
    } else {
        Duty::Wait { near: None }
    }
}

/// Leaders haul cargo; everyone else waits at the meeting point.
pub fn gather_items_duty(actor: &Actor, meeting_point: Position) -> Duty {
    if actor.role.is_leader() {
        Duty::GatherItems { meeting_point }
    } else {
        Duty::Wait {
            near: Some(meeting_point),
        }
    }
}

/// Every non-animal takes part in escorting detainees; animals wait.
pub fn gather_slaves_duty(actor: &Actor, meeting_point: Position) -> Duty {
    if actor.role.is_animal() {
        Duty::Wait {
            near: Some(meeting_point),
        }
    } else {
        Duty::GatherPawns {
            meeting_point,
            pawns: PawnsToGather::Slaves,
        }
    }
}

/// Everyone holds position until the disruption clears.
pub fn pause_duty(_actor: &Actor, meeting_point: Position) -> Duty {
    Duty::Wait {
        near: Some(meeting_point),
    }
}

fn disbanded_duty(_actor: &Actor, meeting_point: Position) -> Duty {
    Duty::Wander {
        around: meeting_point,
    }
}

fn cargo_loaded(host: &dyn Host) -> bool {
    host.cargo().all_loaded()
}

// =========================================
// Caravan phases
// =========================================

/// Sticky animal gathering. `fast_forward` maps to `fast_animal_collection`.
pub fn gather_animals(meeting_point: Position, criteria: GatherCriteria, fast_forward: bool) -> Phase {
    Phase::gather(
        GATHER_ANIMALS,
        meeting_point,
        is_animal,
        gather_animals_duty,
        criteria,
        Memo::from(ALL_ANIMALS_GATHERED),
    )
    .with_fast_forward(fast_forward)
}

/// Cargo loading, done when nothing is left pending.
pub fn gather_items(meeting_point: Position) -> Phase {
    Phase::ready(
        GATHER_ITEMS,
        meeting_point,
        gather_items_duty,
        cargo_loaded,
        Memo::from(ALL_ITEMS_GATHERED),
    )
}

/// Sticky detainee gathering.
pub fn gather_slaves(meeting_point: Position, criteria: GatherCriteria) -> Phase {
    Phase::gather(
        GATHER_SLAVES,
        meeting_point,
        is_detainee,
        gather_slaves_duty,
        criteria,
        Memo::from(ALL_SLAVES_GATHERED),
    )
}
