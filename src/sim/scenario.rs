//! Scripted scenario files.
//!
//! A scenario describes a group, its cargo, the host graph to graft into and
//! a list of scripted host events:
//!
//! ```toml
//! group = "Caravan"
//! meeting_point = { x = 10, z = 10 }
//! exit = { x = 120, z = 10 }
//! host_graph = "vanilla"
//!
//! [cargo]
//! pending_mass = 40.0
//!
//! [[actors]]
//! id = "ada"
//! role = "leader"
//! position = { x = 10, z = 10 }
//! carry_capacity = 35.0
//!
//! [[events]]
//! at = 150
//! action = "move"
//! actor = "ada"
//! to = { x = 40, z = 10 }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::actor::{Actor, ActorId, Position};
use crate::caravan_config::FormationSettings;
use crate::errors::GraphError;
use crate::graph::PhaseGraph;
use crate::host::CargoManifest;

use super::graphs::{bare_graph, vanilla_graph};

/// Which host graph the scenario grafts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostGraphKind {
    /// Host graph with its own gather phases
    #[default]
    Vanilla,
    /// Rest, leave and the terminal phases only
    Bare,
}

impl HostGraphKind {
    pub fn build(self, meeting_point: Position, exit: Position) -> Result<PhaseGraph, GraphError> {
        match self {
            HostGraphKind::Vanilla => vanilla_graph(meeting_point, exit),
            HostGraphKind::Bare => bare_graph(meeting_point, exit),
        }
    }
}

/// A host-side change applied at a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptedAction {
    /// Teleport an actor
    Move { actor: ActorId, to: Position },
    /// Start or stop following
    Follow {
        actor: ActorId,
        #[serde(default = "default_true")]
        following: bool,
    },
    /// Permanently remove an actor from the group
    Lose { actor: ActorId },
    /// Cut off the actor's path to any target
    Block { actor: ActorId },
    Unblock { actor: ActorId },
    /// Publish a host memo
    Memo { name: String },
    /// Move the meeting point of the gather phases
    MeetingPoint { to: Position },
    /// Add cargo that still has to be loaded
    AddCargo { mass: f32 },
}

fn default_true() -> bool {
    true
}

/// A scripted action and the tick it fires on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub at: u64,
    #[serde(flatten)]
    pub action: ScriptedAction,
}

/// A complete scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_group")]
    pub group: String,
    pub meeting_point: Position,
    pub exit: Position,
    #[serde(default)]
    pub host_graph: HostGraphKind,
    #[serde(default)]
    pub cargo: CargoManifest,
    /// Mass loaded per tick while the cargo phase is current
    #[serde(default = "default_load_rate")]
    pub load_rate: f32,
    /// Ticks the host rests before publishing `Rested`
    #[serde(default = "default_rest_ticks")]
    pub rest_ticks: u64,
    /// Ticks the host travels before publishing `Arrived`
    #[serde(default = "default_travel_ticks")]
    pub travel_ticks: u64,
    /// Actors whose route crosses some danger
    #[serde(default)]
    pub hazardous: Vec<ActorId>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
    /// Per-scenario override of the `[formation]` settings
    #[serde(default)]
    pub formation: Option<FormationSettings>,
}

fn default_group() -> String {
    "Caravan".to_string()
}

fn default_load_rate() -> f32 {
    1.0
}

fn default_rest_ticks() -> u64 {
    200
}

fn default_travel_ticks() -> u64 {
    300
}

impl Scenario {
    /// Load a scenario from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid scenario file: {}", path.display()))
    }

    /// Parse a scenario from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let mut scenario: Scenario =
            toml::from_str(content).context("Failed to parse scenario")?;
        scenario.validate()?;
        scenario.events.sort_by_key(|e| e.at);
        Ok(scenario)
    }

    /// The scenario's own `[formation]` section if it has one, else `fallback`.
    pub fn settings(&self, fallback: &FormationSettings) -> FormationSettings {
        match &self.formation {
            Some(own) => own.clone().with_env_overrides(),
            None => fallback.clone(),
        }
    }

    /// Check that every scripted reference names a known actor.
    pub fn validate(&self) -> Result<()> {
        let known = |id: &ActorId| self.actors.iter().any(|a| &a.id == id);

        for (i, actor) in self.actors.iter().enumerate() {
            if self.actors[..i].iter().any(|a| a.id == actor.id) {
                anyhow::bail!("Duplicate actor '{}'", actor.id);
            }
        }
        for id in &self.hazardous {
            if !known(id) {
                anyhow::bail!("Unknown actor '{}' in hazardous list", id);
            }
        }
        for event in &self.events {
            let actor = match &event.action {
                ScriptedAction::Move { actor, .. }
                | ScriptedAction::Follow { actor, .. }
                | ScriptedAction::Lose { actor }
                | ScriptedAction::Block { actor }
                | ScriptedAction::Unblock { actor } => Some(actor),
                _ => None,
            };
            if let Some(actor) = actor
                && !known(actor)
            {
                anyhow::bail!("Event at tick {} references unknown actor '{}'", event.at, actor);
            }
        }
        Ok(())
    }
}
