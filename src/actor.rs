//! Actor references and positions.
//!
//! Actors are owned by the host. The orchestrator only ever holds an
//! [`ActorId`] and reads the roster the host hands it on each call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable reference to a host-owned actor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Role classification of a group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Colonist-equivalent member able to lead and herd
    Leader,
    /// Animal that can carry cargo
    PackAnimal,
    /// Animal that travels with the group but carries nothing
    Livestock,
    /// Prisoner or slave escorted by the group
    Detainee,
}

impl Role {
    pub fn is_leader(self) -> bool {
        matches!(self, Role::Leader)
    }

    pub fn is_animal(self) -> bool {
        matches!(self, Role::PackAnimal | Role::Livestock)
    }

    pub fn is_detainee(self) -> bool {
        matches!(self, Role::Detainee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => write!(f, "leader"),
            Role::PackAnimal => write!(f, "pack_animal"),
            Role::Livestock => write!(f, "livestock"),
            Role::Detainee => write!(f, "detainee"),
        }
    }
}

/// A map cell. Distance checks are horizontal (x/z plane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Squared horizontal distance to another cell.
    pub fn distance_squared(&self, other: Position) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dz * dz
    }

    /// Whether `other` lies within `radius` of this cell (inclusive).
    /// A negative or NaN radius contains nothing.
    pub fn within(&self, other: Position, radius: f32) -> bool {
        if radius.is_nan() || radius < 0.0 {
            return false;
        }
        (self.distance_squared(other) as f64) <= f64::from(radius) * f64::from(radius)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A member of the group as seen by the orchestrator on a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
    pub position: Position,
    /// Whether the actor is currently on the map
    #[serde(default = "default_spawned")]
    pub spawned: bool,
    /// Whether the actor is being escorted or is following someone
    #[serde(default)]
    pub following: bool,
    /// Mass this actor can carry
    #[serde(default)]
    pub carry_capacity: f32,
}

fn default_spawned() -> bool {
    true
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, position: Position) -> Self {
        Self {
            id: ActorId::new(id),
            role,
            position,
            spawned: true,
            following: false,
            carry_capacity: 0.0,
        }
    }

    pub fn with_capacity(mut self, carry_capacity: f32) -> Self {
        self.carry_capacity = carry_capacity;
        self
    }

    pub fn following(mut self, following: bool) -> Self {
        self.following = following;
        self
    }
}
