pub mod formation;
pub mod state;

pub use formation::{Formation, FormationEvent, graft};
pub use state::{FormationSnapshot, PhaseSnapshot, StateManager};
