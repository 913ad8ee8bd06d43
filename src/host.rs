//! The host collaborator interface.
//!
//! The host simulation owns the actors, the map and the cargo. The
//! orchestrator asks it for the roster, reachability and cargo totals on
//! demand and never caches any of it between calls.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::{Actor, Position};

/// How much danger a path may pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Danger {
    None,
    Some,
    /// Anything short of certain death
    #[default]
    Deadly,
}

impl fmt::Display for Danger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Danger::None => write!(f, "none"),
            Danger::Some => write!(f, "some"),
            Danger::Deadly => write!(f, "deadly"),
        }
    }
}

impl std::str::FromStr for Danger {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Danger::None),
            "some" => Ok(Danger::Some),
            "deadly" => Ok(Danger::Deadly),
            _ => anyhow::bail!("Invalid danger level '{}'. Valid values: none, some, deadly", s),
        }
    }
}

/// Cargo mass still to be loaded and already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CargoManifest {
    #[serde(default)]
    pub pending_mass: f32,
    #[serde(default)]
    pub loaded_mass: f32,
}

impl CargoManifest {
    pub fn new(pending_mass: f32, loaded_mass: f32) -> Self {
        Self {
            pending_mass,
            loaded_mass,
        }
    }

    /// Total mass the group has to carry once everything is loaded.
    pub fn required_mass(&self) -> f32 {
        self.pending_mass + self.loaded_mass
    }

    pub fn all_loaded(&self) -> bool {
        self.pending_mass <= 0.0
    }
}

/// What the orchestrator needs from the host simulation.
pub trait Host {
    /// Current game tick.
    fn ticks_game(&self) -> u64;

    /// Live members of the group. Removed members are not listed.
    fn roster(&self) -> &[Actor];

    /// Whether `actor` can path to `target` without exceeding `max_danger`.
    fn can_reach(&self, actor: &Actor, target: Position, max_danger: Danger) -> bool;

    /// Cargo still to load and cargo already loaded.
    fn cargo(&self) -> CargoManifest;
}
