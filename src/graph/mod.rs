//! Phase graph and grafting.
//!
//! The host owns a phase graph with its own rest, travel and disband phases
//! plus one failure transition. The orchestrator takes that graph by value,
//! grafts its gather phases into it and runs the result.
//!
//! ## Components
//!
//! 1. **PhaseGraph** - Phases, memo-triggered transitions and the starting pointer
//! 2. **PhaseGraphBuilder** - One-shot rewiring of a host graph at setup time
//!
//! ## Example
//!
//! ```
//! use caravan::actor::Position;
//! use caravan::graph::{PhaseGraph, PhaseGraphBuilder, Transition};
//! use caravan::phase::{Phase, PhaseId, gather_slaves, pause_duty};
//! use caravan::signals::{Memo, ALL_SLAVES_GATHERED};
//! use caravan::tracker::GatherCriteria;
//!
//! # fn example() -> anyhow::Result<()> {
//! let at = Position::new(0, 0);
//! let mut host = PhaseGraph::new("Rest");
//! host.add_phase(Phase::host("Rest", at, pause_duty))?;
//! host.add_phase(Phase::terminal("Abort", at))?;
//! host.add_transition(Transition::new([PhaseId::from("Rest")], "Abort", [Memo::from("Rested")]));
//! host.add_failure_transition(Transition::new([PhaseId::from("Rest")], "Abort", [Memo::from("Canceled")]));
//!
//! let mut builder = PhaseGraphBuilder::new(host, Memo::critical_pawn_lost("Caravan"))?;
//! builder.insert_sequence(
//!     vec![gather_slaves(at, GatherCriteria::default())],
//!     &[Memo::from(ALL_SLAVES_GATHERED)],
//!     &PhaseId::from("Rest"),
//!     true,
//! )?;
//! let graph = builder.build()?;
//! assert_eq!(graph.starting_phase().as_str(), "GatherSlaves");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod builder;
mod phase_graph;

pub use builder::PhaseGraphBuilder;
pub use phase_graph::{PhaseGraph, Transition, TransitionIndex};
