//! Typed error hierarchy for the caravan orchestrator.
//!
//! - `GraphError`: building or grafting the phase graph
//! - `FormationError`: running or restoring a formation
//!
//! Critical member losses are not errors. They are memos routed through the
//! graph's failure transition.

use thiserror::Error;

use crate::phase::PhaseId;

/// Errors from building or grafting a phase graph. All of them are fatal at
/// setup time.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Phase {phase} not found in graph")]
    PhaseNotFound { phase: PhaseId },

    #[error("Duplicate phase {phase}")]
    DuplicatePhase { phase: PhaseId },

    #[error("Graph has no failure transition to route critical losses through")]
    MissingFailureTransition,

    #[error("Cannot insert an empty phase sequence")]
    EmptySequence,

    #[error("Sequence of {phases} phases needs one trigger per phase, got {triggers}")]
    TriggerCountMismatch { phases: usize, triggers: usize },

    #[error("Transition references unknown phase {phase}")]
    DanglingTransition { phase: PhaseId },

    #[error("Phase {phase} is reachable but has no outgoing transition")]
    DeadEnd { phase: PhaseId },
}

/// Errors from running or restoring a formation.
#[derive(Debug, Error)]
pub enum FormationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Snapshot belongs to group {found}, expected {expected}")]
    GroupMismatch { expected: String, found: String },

    #[error("Snapshot references unknown phase {phase}")]
    UnknownPhase { phase: PhaseId },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
