use std::collections::BTreeSet;

use crate::actor::{Actor, ActorId, Position};
use crate::host::{CargoManifest, Danger, Host};

/// In-memory host used by scenarios and tests.
#[derive(Debug, Clone, Default)]
pub struct ScenarioHost {
    tick: u64,
    actors: Vec<Actor>,
    cargo: CargoManifest,
    /// Actors that cannot reach anything
    blocked: BTreeSet<ActorId>,
    /// Actors whose route crosses some danger
    hazardous: BTreeSet<ActorId>,
}

impl ScenarioHost {
    pub fn new(actors: Vec<Actor>, cargo: CargoManifest) -> Self {
        Self {
            actors,
            cargo,
            ..Self::default()
        }
    }

    pub fn with_hazardous(mut self, hazardous: impl IntoIterator<Item = ActorId>) -> Self {
        self.hazardous.extend(hazardous);
        self
    }

    pub fn advance(&mut self, ticks: u64) {
        self.tick += ticks;
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| &a.id == id)
    }

    pub fn actor_mut(&mut self, id: &ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| &a.id == id)
    }

    pub fn move_actor(&mut self, id: &ActorId, to: Position) {
        if let Some(actor) = self.actor_mut(id) {
            actor.position = to;
        }
    }

    pub fn set_following(&mut self, id: &ActorId, following: bool) {
        if let Some(actor) = self.actor_mut(id) {
            actor.following = following;
        }
    }

    /// Remove an actor from the roster, returning it if it was present.
    pub fn remove(&mut self, id: &ActorId) -> Option<Actor> {
        let index = self.actors.iter().position(|a| &a.id == id)?;
        Some(self.actors.remove(index))
    }

    pub fn block(&mut self, id: ActorId) {
        self.blocked.insert(id);
    }

    pub fn unblock(&mut self, id: &ActorId) {
        self.blocked.remove(id);
    }

    pub fn add_cargo(&mut self, mass: f32) {
        self.cargo.pending_mass += mass;
    }

    /// Move up to `mass` from pending to loaded.
    pub fn load_cargo(&mut self, mass: f32) {
        let moved = mass.min(self.cargo.pending_mass).max(0.0);
        self.cargo.pending_mass -= moved;
        self.cargo.loaded_mass += moved;
    }
}

impl Host for ScenarioHost {
    fn ticks_game(&self) -> u64 {
        self.tick
    }

    fn roster(&self) -> &[Actor] {
        &self.actors
    }

    fn can_reach(&self, actor: &Actor, _target: Position, max_danger: Danger) -> bool {
        if self.blocked.contains(&actor.id) {
            return false;
        }
        !self.hazardous.contains(&actor.id) || max_danger >= Danger::Some
    }

    fn cargo(&self) -> CargoManifest {
        self.cargo
    }
}
