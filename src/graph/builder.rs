//! Grafting orchestrator phases into a host phase graph.
//!
//! The builder takes ownership of the host graph, rewires it once at setup
//! time and hands it back validated. Old phases that end up unreferenced are
//! left in place; they are simply unreachable.

use tracing::debug;

use crate::errors::GraphError;
use crate::phase::{Phase, PhaseId};
use crate::signals::{FORMATION_DISRUPTED, FORMATION_DISRUPTION_RESOLVED, Memo};

use super::phase_graph::{PhaseGraph, Transition};

/// Builder that extends a host graph with orchestrator phases.
#[derive(Debug)]
pub struct PhaseGraphBuilder {
    graph: PhaseGraph,
    /// Phases added or replaced by this builder, pauses included
    added: Vec<PhaseId>,
}

impl PhaseGraphBuilder {
    /// Take over `graph` and make `critical` the only trigger of its failure
    /// transition. Whatever the host fired it with before is dropped.
    pub fn new(mut graph: PhaseGraph, critical: Memo) -> Result<Self, GraphError> {
        let failure = graph
            .failure_transition_mut()
            .ok_or(GraphError::MissingFailureTransition)?;
        failure.triggers = vec![critical];

        Ok(Self {
            graph,
            added: Vec::new(),
        })
    }

    pub fn graph(&self) -> &PhaseGraph {
        &self.graph
    }

    /// Phases this builder has added so far.
    pub fn added(&self) -> &[PhaseId] {
        &self.added
    }

    /// Substitute `new` for every occurrence of `old`: as a node, as a
    /// transition target, as a transition source and as the starting phase.
    ///
    /// Everything else about the graph is preserved.
    pub fn replace_phase(&mut self, old: &PhaseId, new: Phase) -> Result<&mut Self, GraphError> {
        let new_id = new.id().clone();
        self.graph.swap_phase(old, new)?;
        debug!(old = %old, new = %new_id, "phase replaced");
        self.guard(new_id)?;
        Ok(self)
    }

    /// Insert an ordered chain of phases.
    ///
    /// `triggers[i]` moves `phases[i]` to `phases[i + 1]`; the last trigger
    /// moves on to `then`. Every inserted phase gets a pause counterpart and
    /// becomes a source of the failure transition. With `run_first` the
    /// starting pointer moves to the head of the chain.
    pub fn insert_sequence(
        &mut self,
        phases: Vec<Phase>,
        triggers: &[Memo],
        then: &PhaseId,
        run_first: bool,
    ) -> Result<&mut Self, GraphError> {
        if phases.is_empty() {
            return Err(GraphError::EmptySequence);
        }
        if triggers.len() != phases.len() {
            return Err(GraphError::TriggerCountMismatch {
                phases: phases.len(),
                triggers: triggers.len(),
            });
        }
        if !self.graph.contains(then) {
            return Err(GraphError::PhaseNotFound {
                phase: then.clone(),
            });
        }

        // Every id the chain will introduce, pauses included, must be free
        // before the graph is touched.
        let ids: Vec<PhaseId> = phases.iter().map(|p| p.id().clone()).collect();
        let pauses: Vec<PhaseId> = ids.iter().map(PhaseId::pause).collect();
        let mut claimed: Vec<&PhaseId> = Vec::with_capacity(ids.len() + pauses.len());
        for id in ids.iter().chain(&pauses) {
            if self.graph.contains(id) || claimed.contains(&id) {
                return Err(GraphError::DuplicatePhase { phase: id.clone() });
            }
            claimed.push(id);
        }

        for phase in phases {
            self.graph.add_phase(phase)?;
        }

        for (i, (id, trigger)) in ids.iter().zip(triggers).enumerate() {
            let next = ids.get(i + 1).unwrap_or(then);
            self.graph.add_transition(Transition::new(
                [id.clone()],
                next.clone(),
                [trigger.clone()],
            ));
            self.guard(id.clone())?;
            self.attach_pause(id)?;
        }

        if run_first {
            self.graph.set_starting_phase(ids[0].clone());
        }
        debug!(phases = ?ids, then = %then, run_first, "sequence inserted");

        Ok(self)
    }

    /// Add the pause counterpart of `origin`: disruption moves to the pause,
    /// resolution moves back to the very same `origin` phase.
    pub fn attach_pause(&mut self, origin: &PhaseId) -> Result<&mut Self, GraphError> {
        let pause = {
            let phase = self
                .graph
                .phase(origin)
                .ok_or_else(|| GraphError::PhaseNotFound {
                    phase: origin.clone(),
                })?;
            Phase::pause(phase)
        };
        let pause_id = pause.id().clone();
        self.graph.add_phase(pause)?;

        self.graph.add_transition(Transition::new(
            [origin.clone()],
            pause_id.clone(),
            [Memo::from(FORMATION_DISRUPTED)],
        ));
        self.graph.add_transition(Transition::new(
            [pause_id.clone()],
            origin.clone(),
            [Memo::from(FORMATION_DISRUPTION_RESOLVED)],
        ));
        self.guard(pause_id)?;

        Ok(self)
    }

    /// Guard the host's own pause of `origin`, or attach one if it has none.
    pub fn ensure_pause(&mut self, origin: &PhaseId) -> Result<&mut Self, GraphError> {
        let pause = origin.pause();
        if self.graph.contains(&pause) {
            self.guard(pause)?;
            Ok(self)
        } else {
            self.attach_pause(origin)
        }
    }

    /// Make `phase` a source of the failure transition.
    fn guard(&mut self, phase: PhaseId) -> Result<(), GraphError> {
        let failure = self
            .graph
            .failure_transition_mut()
            .ok_or(GraphError::MissingFailureTransition)?;
        failure.add_source(phase.clone());
        if !self.added.contains(&phase) {
            self.added.push(phase);
        }
        Ok(())
    }

    /// Validate and return the rewired graph.
    pub fn build(self) -> Result<PhaseGraph, GraphError> {
        self.graph.validate()?;
        Ok(self.graph)
    }
}
