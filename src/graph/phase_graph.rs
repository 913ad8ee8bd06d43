//! The phase graph: phases as nodes, memo-triggered transitions as edges.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::GraphError;
use crate::phase::{Phase, PhaseId};
use crate::signals::Memo;

/// Index into the transition list.
pub type TransitionIndex = usize;

/// A directed edge that fires when one of its triggers is received while the
/// current phase is one of its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub sources: Vec<PhaseId>,
    pub target: PhaseId,
    pub triggers: Vec<Memo>,
}

impl Transition {
    pub fn new(
        sources: impl IntoIterator<Item = PhaseId>,
        target: impl Into<PhaseId>,
        triggers: impl IntoIterator<Item = Memo>,
    ) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            target: target.into(),
            triggers: triggers.into_iter().collect(),
        }
    }

    pub fn has_source(&self, phase: &PhaseId) -> bool {
        self.sources.contains(phase)
    }

    /// Whether this transition fires for `memo` received in `current`.
    pub fn fires_on(&self, current: &PhaseId, memo: &Memo) -> bool {
        self.has_source(current) && self.triggers.contains(memo)
    }

    pub fn add_source(&mut self, phase: PhaseId) {
        if !self.has_source(&phase) {
            self.sources.push(phase);
        }
    }

    pub fn add_trigger(&mut self, memo: Memo) {
        if !self.triggers.contains(&memo) {
            self.triggers.push(memo);
        }
    }

    /// Swap every occurrence of `old` for `new`, as target and as source.
    pub fn replace_phase(&mut self, old: &PhaseId, new: &PhaseId) {
        if &self.target == old {
            self.target = new.clone();
        }
        for source in self.sources.iter_mut().filter(|s| *s == old) {
            *source = new.clone();
        }
    }
}

/// A directed graph of phases. Cycles are allowed (pause and resume).
#[derive(Debug, Clone)]
pub struct PhaseGraph {
    /// Phases indexed by their position
    phases: Vec<Phase>,
    /// Map from phase id to index
    index_map: HashMap<PhaseId, usize>,
    transitions: Vec<Transition>,
    starting: PhaseId,
    /// The abort transition, if the graph has one
    failure: Option<TransitionIndex>,
}

impl PhaseGraph {
    /// Create an empty graph that will start in `starting`.
    pub fn new(starting: impl Into<PhaseId>) -> Self {
        Self {
            phases: Vec::new(),
            index_map: HashMap::new(),
            transitions: Vec::new(),
            starting: starting.into(),
            failure: None,
        }
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn add_phase(&mut self, phase: Phase) -> Result<(), GraphError> {
        if self.index_map.contains_key(phase.id()) {
            return Err(GraphError::DuplicatePhase {
                phase: phase.id().clone(),
            });
        }
        self.index_map.insert(phase.id().clone(), self.phases.len());
        self.phases.push(phase);
        Ok(())
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionIndex {
        self.transitions.push(transition);
        self.transitions.len() - 1
    }

    /// Add the transition every critical loss is routed through.
    pub fn add_failure_transition(&mut self, transition: Transition) -> TransitionIndex {
        let index = self.add_transition(transition);
        self.failure = Some(index);
        index
    }

    pub fn contains(&self, id: &PhaseId) -> bool {
        self.index_map.contains_key(id)
    }

    pub fn phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.index_map.get(id).and_then(|&i| self.phases.get(i))
    }

    pub fn phase_mut(&mut self, id: &PhaseId) -> Option<&mut Phase> {
        let index = *self.index_map.get(id)?;
        self.phases.get_mut(index)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phases_mut(&mut self) -> impl Iterator<Item = &mut Phase> {
        self.phases.iter_mut()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn starting_phase(&self) -> &PhaseId {
        &self.starting
    }

    pub fn set_starting_phase(&mut self, id: PhaseId) {
        self.starting = id;
    }

    pub fn failure_index(&self) -> Option<TransitionIndex> {
        self.failure
    }

    pub fn failure_transition(&self) -> Option<&Transition> {
        self.failure.and_then(|i| self.transitions.get(i))
    }

    pub(crate) fn failure_transition_mut(&mut self) -> Option<&mut Transition> {
        self.failure.and_then(|i| self.transitions.get_mut(i))
    }

    /// Substitute `new` for the phase `old` as node, transition endpoint and
    /// starting pointer. The old phase value is returned.
    pub(crate) fn swap_phase(&mut self, old: &PhaseId, new: Phase) -> Result<Phase, GraphError> {
        let index = *self
            .index_map
            .get(old)
            .ok_or_else(|| GraphError::PhaseNotFound { phase: old.clone() })?;

        let new_id = new.id().clone();
        if &new_id != old && self.index_map.contains_key(&new_id) {
            return Err(GraphError::DuplicatePhase { phase: new_id });
        }

        let previous = std::mem::replace(&mut self.phases[index], new);
        self.index_map.remove(old);
        self.index_map.insert(new_id.clone(), index);

        for transition in &mut self.transitions {
            transition.replace_phase(old, &new_id);
        }
        if &self.starting == old {
            self.starting = new_id;
        }

        Ok(previous)
    }

    /// First transition that fires for `memo` while in `current`.
    pub fn next(&self, current: &PhaseId, memo: &Memo) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.fires_on(current, memo))
    }

    /// Transitions leaving `phase`.
    pub fn outgoing(&self, phase: &PhaseId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.has_source(phase))
    }

    /// Phases reachable from the starting phase, in breadth-first order.
    pub fn reachable(&self) -> Vec<PhaseId> {
        let mut seen: HashSet<&PhaseId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([&self.starting]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id.clone());
            for transition in self.outgoing(id) {
                queue.push_back(&transition.target);
            }
        }

        order
    }

    /// Check the structure:
    /// - The starting phase and every transition endpoint exist
    /// - Every reachable non-terminal phase has an outgoing transition
    pub fn validate(&self) -> Result<(), GraphError> {
        if !self.contains(&self.starting) {
            return Err(GraphError::PhaseNotFound {
                phase: self.starting.clone(),
            });
        }

        for transition in &self.transitions {
            for id in transition.sources.iter().chain([&transition.target]) {
                if !self.contains(id) {
                    return Err(GraphError::DanglingTransition { phase: id.clone() });
                }
            }
        }

        for id in self.reachable() {
            let terminal = self.phase(&id).is_some_and(Phase::is_terminal);
            if !terminal && self.outgoing(&id).next().is_none() {
                return Err(GraphError::DeadEnd { phase: id });
            }
        }

        Ok(())
    }
}
