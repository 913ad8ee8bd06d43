//! Host phase graphs.
//!
//! These are the graphs a host hands to the orchestrator before grafting:
//! its own gather phases (non-sticky, completed by host memos), a rest phase,
//! a travel phase and two terminal phases.

use crate::actor::{Actor, Position};
use crate::duty::Duty;
use crate::errors::GraphError;
use crate::graph::{PhaseGraph, Transition};
use crate::phase::{
    self, GATHER_ANIMALS, GATHER_ITEMS, GATHER_SLAVES, Phase, PhaseId, gather_animals_duty,
    gather_slaves_duty, pause_duty,
};
use crate::signals::{
    ALL_ANIMALS_GATHERED, ALL_ITEMS_GATHERED, ALL_SLAVES_GATHERED, FORMATION_DISRUPTED,
    FORMATION_DISRUPTION_RESOLVED, Memo,
};

pub const REST: &str = "Rest";
pub const LEAVE: &str = "Leave";
pub const DISBAND: &str = "Disband";
pub const ABORT: &str = "Abort";

/// Host memo: fatigue is low enough to set off.
pub const RESTED: &str = "Rested";
/// Host memo: the group reached its exit spot.
pub const ARRIVED: &str = "Arrived";
/// Host memo: the player cancelled the formation. Fires the abort edge of an
/// ungrafted host graph only; grafting makes critical loss its sole trigger.
pub const FORMATION_CANCELED: &str = "FormationCanceled";

fn travel_duty(_actor: &Actor, exit: Position) -> Duty {
    Duty::TravelTo { target: exit }
}

/// Build the host graph with its own gather phases, the shape the sticky
/// phases replace in place.
pub fn vanilla_graph(meeting_point: Position, exit: Position) -> Result<PhaseGraph, GraphError> {
    let animals = Phase::host(GATHER_ANIMALS, meeting_point, gather_animals_duty);
    let items = phase::gather_items(meeting_point);
    let slaves = Phase::host(GATHER_SLAVES, meeting_point, gather_slaves_duty);

    let mut graph = PhaseGraph::new(GATHER_ANIMALS);
    let mut gather_ids = Vec::new();
    for gather in [animals, items, slaves] {
        let pause = Phase::pause(&gather);
        gather_ids.push(gather.id().clone());
        gather_ids.push(pause.id().clone());
        graph.add_phase(gather)?;
        graph.add_phase(pause)?;
    }
    add_tail(&mut graph, meeting_point, exit)?;

    let chain = [
        (GATHER_ANIMALS, GATHER_ITEMS, ALL_ANIMALS_GATHERED),
        (GATHER_ITEMS, GATHER_SLAVES, ALL_ITEMS_GATHERED),
        (GATHER_SLAVES, REST, ALL_SLAVES_GATHERED),
    ];
    for (from, to, memo) in chain {
        let from = PhaseId::from(from);
        graph.add_transition(Transition::new(
            [from.clone()],
            from.pause(),
            [Memo::from(FORMATION_DISRUPTED)],
        ));
        graph.add_transition(Transition::new(
            [from.pause()],
            from.clone(),
            [Memo::from(FORMATION_DISRUPTION_RESOLVED)],
        ));
        graph.add_transition(Transition::new([from], to, [Memo::from(memo)]));
    }
    add_tail_transitions(&mut graph, gather_ids);

    Ok(graph)
}

/// Build a host graph without gather phases. The gather chain is inserted
/// in front of [`REST`].
pub fn bare_graph(meeting_point: Position, exit: Position) -> Result<PhaseGraph, GraphError> {
    let mut graph = PhaseGraph::new(REST);
    add_tail(&mut graph, meeting_point, exit)?;
    add_tail_transitions(&mut graph, Vec::new());
    Ok(graph)
}

fn add_tail(graph: &mut PhaseGraph, meeting_point: Position, exit: Position) -> Result<(), GraphError> {
    graph.add_phase(Phase::host(REST, meeting_point, pause_duty))?;
    graph.add_phase(Phase::host(LEAVE, exit, travel_duty))?;
    graph.add_phase(Phase::terminal(DISBAND, exit))?;
    graph.add_phase(Phase::terminal(ABORT, meeting_point))?;
    Ok(())
}

fn add_tail_transitions(graph: &mut PhaseGraph, mut guarded: Vec<PhaseId>) {
    graph.add_transition(Transition::new(
        [PhaseId::from(REST)],
        LEAVE,
        [Memo::from(RESTED)],
    ));
    graph.add_transition(Transition::new(
        [PhaseId::from(LEAVE)],
        DISBAND,
        [Memo::from(ARRIVED)],
    ));

    guarded.push(PhaseId::from(REST));
    guarded.push(PhaseId::from(LEAVE));
    graph.add_failure_transition(Transition::new(
        guarded,
        ABORT,
        [Memo::from(FORMATION_CANCELED)],
    ));
}
