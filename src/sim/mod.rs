//! Scripted host simulation.
//!
//! The orchestrator never owns actors, maps or cargo. This module stands in
//! for the host so that formations can be exercised end to end from a
//! scenario file: a host phase graph to graft into, an in-memory host and a
//! tick loop that plays scripted events against a [`Formation`].
//!
//! [`Formation`]: crate::orchestrator::Formation

pub mod graphs;
pub mod host;
pub mod runner;
pub mod scenario;

pub use graphs::{bare_graph, vanilla_graph};
pub use host::ScenarioHost;
pub use runner::{LogEntry, SimOutcome, Simulation};
pub use scenario::{HostGraphKind, Scenario, ScenarioEvent, ScriptedAction};
