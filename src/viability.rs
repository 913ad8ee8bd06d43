//! Group viability on member loss.
//!
//! Viability is derived, never stored: every loss recomputes it from the
//! roster and cargo the host reports at that moment, so rapid sequential
//! losses need no bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::actor::{Actor, ActorId};
use crate::host::CargoManifest;
use crate::signals::{Memo, MemoBus};

/// Outcome of a member loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossVerdict {
    /// No leader-role actor remains
    LacksLeadership,
    /// Remaining carry capacity is below the cargo mass
    LacksCapacity,
    /// Informational, the group carries on
    ContinuesWithoutMember,
}

impl LossVerdict {
    pub fn is_critical(self) -> bool {
        !matches!(self, LossVerdict::ContinuesWithoutMember)
    }
}

impl fmt::Display for LossVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossVerdict::LacksLeadership => write!(f, "lacks leadership"),
            LossVerdict::LacksCapacity => write!(f, "lacks capacity"),
            LossVerdict::ContinuesWithoutMember => write!(f, "continues without member"),
        }
    }
}

/// Numbers behind a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReport {
    pub lost: ActorId,
    pub verdict: LossVerdict,
    pub leaders: usize,
    pub capacity: f32,
    pub required_mass: f32,
}

/// Checks leadership and carrying capacity whenever a member is lost.
#[derive(Debug, Clone)]
pub struct ViabilityMonitor {
    critical: Memo,
}

impl ViabilityMonitor {
    pub fn new(group: &str) -> Self {
        Self {
            critical: Memo::critical_pawn_lost(group),
        }
    }

    /// The memo wired as trigger of the failure transition.
    pub fn critical_memo(&self) -> &Memo {
        &self.critical
    }

    /// Judge the group formed by `remaining`: leadership first, then capacity.
    pub fn assess<'a>(
        remaining: impl IntoIterator<Item = &'a Actor>,
        cargo: CargoManifest,
    ) -> (LossVerdict, usize, f32) {
        let (leaders, capacity) = remaining
            .into_iter()
            .fold((0usize, 0.0f32), |(leaders, capacity), actor| {
                (
                    leaders + usize::from(actor.role.is_leader()),
                    capacity + actor.carry_capacity,
                )
            });

        let verdict = if leaders == 0 {
            LossVerdict::LacksLeadership
        } else if cargo.required_mass() > capacity {
            LossVerdict::LacksCapacity
        } else {
            LossVerdict::ContinuesWithoutMember
        };
        (verdict, leaders, capacity)
    }

    /// Handle the permanent removal of `lost`.
    ///
    /// `roster` may or may not still contain the lost actor; it is excluded
    /// either way. A critical verdict publishes the critical memo on `bus`.
    pub fn on_member_lost(
        &self,
        lost: &ActorId,
        roster: &[Actor],
        cargo: CargoManifest,
        bus: &mut MemoBus,
    ) -> LossReport {
        let remaining = roster.iter().filter(|a| &a.id != lost);
        let (verdict, leaders, capacity) = Self::assess(remaining, cargo);
        let required_mass = cargo.required_mass();

        if verdict.is_critical() {
            warn!(
                actor = %lost,
                %verdict,
                leaders,
                capacity,
                required_mass,
                "critical member loss"
            );
            bus.publish(self.critical.clone());
        } else {
            info!(actor = %lost, capacity, required_mass, "member lost, group continues");
        }

        LossReport {
            lost: lost.clone(),
            verdict,
            leaders,
            capacity,
            required_mass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Position, Role};

    const AT: Position = Position::new(0, 0);

    /// One leader, one pack animal and a hen; total capacity 100.
    fn group() -> Vec<Actor> {
        vec![
            Actor::new("lead", Role::Leader, AT).with_capacity(35.0),
            Actor::new("muffalo", Role::PackAnimal, AT).with_capacity(65.0),
            Actor::new("hen", Role::Livestock, AT),
        ]
    }

    #[test]
    fn test_losing_last_leader_lacks_leadership() {
        let monitor = ViabilityMonitor::new("Caravan");
        let mut bus = MemoBus::new();
        let report = monitor.on_member_lost(
            &ActorId::new("lead"),
            &group(),
            CargoManifest::new(30.0, 50.0),
            &mut bus,
        );

        assert_eq!(report.verdict, LossVerdict::LacksLeadership);
        assert_eq!(report.leaders, 0);
        assert_eq!(bus.next().unwrap().as_str(), "CaravanCriticalPawnLost");
    }

    #[test]
    fn test_heavy_cargo_lacks_capacity() {
        let monitor = ViabilityMonitor::new("Caravan");
        let mut bus = MemoBus::new();
        let report = monitor.on_member_lost(
            &ActorId::new("hen"),
            &group(),
            CargoManifest::new(60.0, 60.0),
            &mut bus,
        );

        assert_eq!(report.verdict, LossVerdict::LacksCapacity);
        assert_eq!(report.capacity, 100.0);
        assert_eq!(report.required_mass, 120.0);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn test_non_essential_loss_continues() {
        let monitor = ViabilityMonitor::new("Caravan");
        let mut bus = MemoBus::new();
        let report = monitor.on_member_lost(
            &ActorId::new("hen"),
            &group(),
            CargoManifest::new(30.0, 50.0),
            &mut bus,
        );

        assert_eq!(report.verdict, LossVerdict::ContinuesWithoutMember);
        assert!(!report.verdict.is_critical());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_lost_member_excluded_when_already_gone() {
        let mut roster = group();
        roster.retain(|a| a.id.as_str() != "muffalo");
        let (verdict, _, capacity) =
            ViabilityMonitor::assess(&roster, CargoManifest::new(0.0, 80.0));
        assert_eq!(capacity, 35.0);
        assert_eq!(verdict, LossVerdict::LacksCapacity);
    }

    #[test]
    fn test_sequential_losses_are_independent() {
        let monitor = ViabilityMonitor::new("Caravan");
        let mut bus = MemoBus::new();
        let mut roster = group();
        let cargo = CargoManifest::new(0.0, 30.0);

        let first = monitor.on_member_lost(&ActorId::new("muffalo"), &roster, cargo, &mut bus);
        assert_eq!(first.verdict, LossVerdict::ContinuesWithoutMember);
        roster.retain(|a| a.id.as_str() != "muffalo");

        let second = monitor.on_member_lost(&ActorId::new("lead"), &roster, cargo, &mut bus);
        assert_eq!(second.verdict, LossVerdict::LacksLeadership);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn test_leadership_is_checked_before_capacity() {
        let nobody: Vec<Actor> = Vec::new();
        let (verdict, _, _) = ViabilityMonitor::assess(&nobody, CargoManifest::new(500.0, 0.0));
        assert_eq!(verdict, LossVerdict::LacksLeadership);
    }
}
