//! The formation runner.
//!
//! A `Formation` owns one group's grafted phase graph and drives it from the
//! host's three entry points: the periodic tick, incoming host memos and
//! member losses. Every entry point runs to completion and returns the
//! events it produced.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::{ActorId, Position};
use crate::caravan_config::{FormationSettings, GraftMode};
use crate::duty::DutySink;
use crate::errors::{FormationError, GraphError};
use crate::graph::{PhaseGraph, PhaseGraphBuilder};
use crate::host::Host;
use crate::phase::{self, Phase, PhaseId, PhaseKind};
use crate::signals::{ALL_ANIMALS_GATHERED, ALL_ITEMS_GATHERED, ALL_SLAVES_GATHERED, Memo, MemoBus};
use crate::tracker::TrackerState;
use crate::viability::{LossReport, ViabilityMonitor};

use super::state::{FormationSnapshot, PhaseSnapshot};

/// Events produced while driving a formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormationEvent {
    /// A phase became current and handed out its duties.
    PhaseEntered { phase: PhaseId, terminal: bool },
    /// The graph advanced on a memo.
    Transitioned {
        from: PhaseId,
        to: PhaseId,
        memo: Memo,
    },
    /// No transition out of the current phase listens to this memo.
    MemoIgnored { phase: PhaseId, memo: Memo },
    /// A member was permanently removed.
    MemberLost { report: LossReport },
}

/// Graft the sticky gather phases into `host_graph`.
pub fn graft(
    host_graph: PhaseGraph,
    settings: &FormationSettings,
    meeting_point: Position,
    critical: Memo,
) -> Result<PhaseGraph, GraphError> {
    let criteria = settings.criteria();
    let animals = phase::gather_animals(meeting_point, criteria, settings.fast_animal_collection)
        .with_check_interval(settings.check_interval);
    let slaves =
        phase::gather_slaves(meeting_point, criteria).with_check_interval(settings.check_interval);

    let mut builder = PhaseGraphBuilder::new(host_graph, critical)?;
    match settings.graft {
        GraftMode::Replace => {
            for sticky in [animals, slaves] {
                let id = sticky.id().clone();
                builder.replace_phase(&id, sticky)?;
                builder.ensure_pause(&id)?;
            }
        }
        GraftMode::Insert => {
            let items =
                phase::gather_items(meeting_point).with_check_interval(settings.check_interval);
            builder.insert_sequence(
                vec![animals, items, slaves],
                &[
                    Memo::from(ALL_ANIMALS_GATHERED),
                    Memo::from(ALL_ITEMS_GATHERED),
                    Memo::from(ALL_SLAVES_GATHERED),
                ],
                &PhaseId::new(settings.insert_before.as_str()),
                true,
            )?;
        }
    }
    debug!(mode = %settings.graft, grafted = ?builder.added(), "gather phases grafted");

    builder.build()
}

/// One group's formation process.
#[derive(Debug)]
pub struct Formation {
    group: String,
    graph: PhaseGraph,
    current: PhaseId,
    monitor: ViabilityMonitor,
    bus: MemoBus,
    started: bool,
}

impl Formation {
    /// Graft the gather phases into `host_graph` and validate the result.
    pub fn new(
        group: impl Into<String>,
        host_graph: PhaseGraph,
        settings: &FormationSettings,
        meeting_point: Position,
    ) -> Result<Self, FormationError> {
        let group = group.into();
        let monitor = ViabilityMonitor::new(&group);
        let graph = graft(
            host_graph,
            settings,
            meeting_point,
            monitor.critical_memo().clone(),
        )?;
        let current = graph.starting_phase().clone();
        info!(group = %group, start = %current, phases = graph.len(), "formation ready");

        Ok(Self {
            group,
            graph,
            current,
            monitor,
            bus: MemoBus::new(),
            started: false,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn graph(&self) -> &PhaseGraph {
        &self.graph
    }

    pub fn current(&self) -> &PhaseId {
        &self.current
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.graph.phase(&self.current)
    }

    /// The group reached a terminal phase (disbanded or aborted).
    pub fn is_finished(&self) -> bool {
        self.current_phase().is_some_and(Phase::is_terminal)
    }

    /// Enter the starting phase. Later calls do nothing.
    pub fn start(&mut self, host: &dyn Host, duties: &mut dyn DutySink) -> Vec<FormationEvent> {
        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.enter(host, duties, &mut events);
            self.dispatch(host, duties, &mut events);
        }
        events
    }

    /// Host tick: let the current phase check for completion.
    pub fn tick(&mut self, host: &dyn Host, duties: &mut dyn DutySink) -> Vec<FormationEvent> {
        let mut events = self.start(host, duties);
        if let Some(phase) = self.graph.phase_mut(&self.current)
            && !phase.is_terminal()
        {
            phase.tick(host, &mut self.bus);
        }
        self.dispatch(host, duties, &mut events);
        events
    }

    /// A memo published by the host (disruption, rest finished, arrival, ...).
    pub fn receive_memo(
        &mut self,
        memo: Memo,
        host: &dyn Host,
        duties: &mut dyn DutySink,
    ) -> Vec<FormationEvent> {
        let mut events = self.start(host, duties);
        self.bus.publish(memo);
        self.dispatch(host, duties, &mut events);
        events
    }

    /// `lost` was permanently removed from the group.
    pub fn on_member_lost(
        &mut self,
        lost: &ActorId,
        host: &dyn Host,
        duties: &mut dyn DutySink,
    ) -> Vec<FormationEvent> {
        let mut events = self.start(host, duties);
        let report = self
            .monitor
            .on_member_lost(lost, host.roster(), host.cargo(), &mut self.bus);
        let critical = report.verdict.is_critical();
        events.push(FormationEvent::MemberLost { report });

        let before = self.current.clone();
        self.dispatch(host, duties, &mut events);
        if !critical && self.current == before {
            self.assign_current(host, duties);
        }
        events
    }

    /// The roster changed; hand out duties again.
    pub fn roster_changed(&self, host: &dyn Host, duties: &mut dyn DutySink) {
        self.assign_current(host, duties);
    }

    /// Move the meeting point of every gather phase and its pause.
    ///
    /// Trackers start over at the new location.
    pub fn set_meeting_point(
        &mut self,
        meeting_point: Position,
        host: &dyn Host,
        duties: &mut dyn DutySink,
    ) {
        for phase in self.graph.phases_mut() {
            if matches!(phase.kind(), PhaseKind::Gather | PhaseKind::Pause { .. }) {
                phase.set_meeting_point(meeting_point);
            }
        }
        info!(group = %self.group, meeting_point = %meeting_point, "meeting point moved");
        if self.started {
            self.assign_current(host, duties);
        }
    }

    pub fn snapshot(&self, host: &dyn Host) -> FormationSnapshot {
        FormationSnapshot {
            group: self.group.clone(),
            current: self.current.clone(),
            tick: host.ticks_game(),
            phases: self
                .graph
                .phases()
                .iter()
                .map(|p| PhaseSnapshot {
                    id: p.id().clone(),
                    meeting_point: p.meeting_point(),
                    gathered: p.tracker_state().map(|t| t.gathered),
                })
                .collect(),
            saved_at: Utc::now(),
        }
    }

    /// Restore a snapshot taken from a formation over the same graph.
    ///
    /// The current phase runs its completion check on the next tick. Duties
    /// are not reassigned; the host restores its own duty slots.
    pub fn restore(&mut self, snapshot: FormationSnapshot) -> Result<(), FormationError> {
        if snapshot.group != self.group {
            return Err(FormationError::GroupMismatch {
                expected: self.group.clone(),
                found: snapshot.group,
            });
        }
        if let Some(unknown) = std::iter::once(&snapshot.current)
            .chain(snapshot.phases.iter().map(|p| &p.id))
            .find(|id| !self.graph.contains(id))
        {
            return Err(FormationError::UnknownPhase {
                phase: unknown.clone(),
            });
        }

        for saved in snapshot.phases {
            if let Some(phase) = self.graph.phase_mut(&saved.id) {
                let tracker = saved.gathered.map(|gathered| TrackerState {
                    meeting_point: saved.meeting_point,
                    gathered,
                });
                phase.restore(saved.meeting_point, tracker);
            }
        }

        self.current = snapshot.current;
        if let Some(phase) = self.graph.phase_mut(&self.current) {
            phase.on_enter();
        }
        self.started = true;
        self.bus.clear();
        info!(group = %self.group, current = %self.current, "formation restored");
        Ok(())
    }

    /// Drain the memo bus, firing at most one transition per memo.
    fn dispatch(
        &mut self,
        host: &dyn Host,
        duties: &mut dyn DutySink,
        events: &mut Vec<FormationEvent>,
    ) {
        while let Some(memo) = self.bus.next() {
            let Some(transition) = self.graph.next(&self.current, &memo) else {
                if self.is_finished() {
                    warn!(group = %self.group, phase = %self.current, memo = %memo, "memo after formation finished");
                } else {
                    debug!(group = %self.group, phase = %self.current, memo = %memo, "memo ignored");
                }
                events.push(FormationEvent::MemoIgnored {
                    phase: self.current.clone(),
                    memo,
                });
                continue;
            };

            let to = transition.target.clone();
            let from = std::mem::replace(&mut self.current, to.clone());
            info!(group = %self.group, from = %from, to = %to, memo = %memo, "transition");
            events.push(FormationEvent::Transitioned { from, to, memo });
            self.enter(host, duties, events);
        }
    }

    fn enter(&mut self, host: &dyn Host, duties: &mut dyn DutySink, events: &mut Vec<FormationEvent>) {
        let terminal = match self.graph.phase_mut(&self.current) {
            Some(phase) => {
                phase.on_enter();
                phase.assign_duties(host.roster(), duties);
                phase.is_terminal()
            }
            None => false,
        };
        info!(group = %self.group, phase = %self.current, terminal, "phase entered");
        events.push(FormationEvent::PhaseEntered {
            phase: self.current.clone(),
            terminal,
        });
    }

    fn assign_current(&self, host: &dyn Host, duties: &mut dyn DutySink) {
        if let Some(phase) = self.current_phase() {
            phase.assign_duties(host.roster(), duties);
        }
    }
}
