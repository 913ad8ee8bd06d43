//! Behavioural properties of formations, driven through the public API
//! against the in-memory scenario host.

use caravan::actor::{Actor, ActorId, Position, Role};
use caravan::caravan_config::{FormationSettings, GraftMode};
use caravan::duty::{Duty, DutyBoard, PawnsToGather};
use caravan::host::CargoManifest;
use caravan::orchestrator::{Formation, FormationEvent};
use caravan::phase::{self, PhaseId};
use caravan::signals::{FORMATION_DISRUPTED, FORMATION_DISRUPTION_RESOLVED, Memo, MemoBus};
use caravan::sim::{ScenarioHost, bare_graph, vanilla_graph};
use caravan::tracker::{GatherCriteria, RendezvousTracker};
use caravan::viability::{LossVerdict, ViabilityMonitor};

const MEET: Position = Position::new(10, 10);
const EXIT: Position = Position::new(200, 10);
const FAR: Position = Position::new(90, 90);

fn leader(id: &str) -> Actor {
    Actor::new(id, Role::Leader, MEET).with_capacity(35.0)
}

fn animal(id: &str, at: Position) -> Actor {
    Actor::new(id, Role::PackAnimal, at)
        .following(true)
        .with_capacity(65.0)
}

fn formation(settings: &FormationSettings) -> Formation {
    Formation::new("Caravan", vanilla_graph(MEET, EXIT).unwrap(), settings, MEET).unwrap()
}

fn gathered(formation: &Formation) -> usize {
    formation
        .current_phase()
        .and_then(|p| p.tracker())
        .map(RendezvousTracker::gathered_count)
        .unwrap_or(0)
}

fn transitioned_to<'a>(events: &'a [FormationEvent], target: &str) -> Option<&'a Memo> {
    events.iter().find_map(|e| match e {
        FormationEvent::Transitioned { to, memo, .. } if to.as_str() == target => Some(memo),
        _ => None,
    })
}

mod rendezvous {
    use super::*;

    #[test]
    fn test_presence_is_monotonic() {
        let mut host = ScenarioHost::new(
            vec![animal("a", MEET), animal("b", FAR)],
            CargoManifest::default(),
        );
        let mut tracker = RendezvousTracker::new(MEET);
        let criteria = GatherCriteria::default();
        let mut counts = Vec::new();

        for (tick, (a_at, b_at)) in [(MEET, FAR), (FAR, FAR), (FAR, MEET), (FAR, FAR)]
            .into_iter()
            .enumerate()
        {
            host.set_tick(tick as u64);
            host.move_actor(&ActorId::new("a"), a_at);
            host.move_actor(&ActorId::new("b"), b_at);
            tracker.evaluate(&host, phase::is_animal, &criteria);
            counts.push(tracker.gathered_count());
        }

        assert_eq!(counts, vec![1, 1, 2, 2]);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_completion_is_sticky() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), animal("a", MEET), animal("b", FAR)],
            CargoManifest::default(),
        );
        let mut gather = phase::gather_animals(MEET, GatherCriteria::default(), false);
        let mut bus = MemoBus::new();

        assert!(!gather.tick(&host, &mut bus));

        // First arrival wanders off before the second one shows up.
        host.move_actor(&ActorId::new("a"), FAR);
        host.move_actor(&ActorId::new("b"), MEET);
        host.set_tick(100);

        assert!(gather.tick(&host, &mut bus));
        assert_eq!(bus.next(), Some(Memo::from("AllAnimalsGathered")));
    }

    #[test]
    fn test_empty_membership_completes_immediately() {
        let host = ScenarioHost::new(vec![leader("ada")], CargoManifest::default());
        let mut gather = phase::gather_slaves(MEET, GatherCriteria::default());
        let mut bus = MemoBus::new();

        assert!(gather.tick(&host, &mut bus));
        assert_eq!(bus.next(), Some(Memo::from("AllSlavesGathered")));
    }

    #[test]
    fn test_unreachable_member_blocks_completion() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), animal("a", MEET)],
            CargoManifest::default(),
        );
        host.block(ActorId::new("a"));
        let mut gather = phase::gather_animals(MEET, GatherCriteria::default(), false);
        let mut bus = MemoBus::new();

        assert!(!gather.tick(&host, &mut bus));
        assert!(bus.is_empty());
    }
}

mod formation_runs {
    use super::*;

    #[test]
    fn test_emission_fires_one_transition() {
        let host = ScenarioHost::new(
            vec![leader("ada"), animal("a", MEET)],
            CargoManifest::new(10.0, 0.0),
        );
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());

        let events = f.tick(&host, &mut duties);
        assert_eq!(
            transitioned_to(&events, "GatherItems"),
            Some(&Memo::from("AllAnimalsGathered"))
        );

        let events = f.receive_memo(Memo::from("AllAnimalsGathered"), &host, &mut duties);
        assert_eq!(f.current().as_str(), "GatherItems");
        assert!(matches!(
            events.as_slice(),
            [FormationEvent::MemoIgnored { phase, .. }] if phase.as_str() == "GatherItems"
        ));
    }

    #[test]
    fn test_vacuous_group_walks_straight_to_rest() {
        let mut host = ScenarioHost::new(vec![leader("ada")], CargoManifest::default());
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());

        for _ in 0..3 {
            f.tick(&host, &mut duties);
            host.advance(1);
        }
        assert_eq!(f.current().as_str(), "Rest");
    }

    #[test]
    fn test_pause_keeps_recorded_presence() {
        let mut actors = vec![leader("ada")];
        for (i, id) in ["a1", "a2", "a3", "a4", "a5"].into_iter().enumerate() {
            actors.push(animal(id, if i < 3 { MEET } else { FAR }));
        }
        let mut host = ScenarioHost::new(actors, CargoManifest::default());
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());

        f.tick(&host, &mut duties);
        assert_eq!(gathered(&f), 3);

        for id in ["a1", "a2", "a3"] {
            host.move_actor(&ActorId::new(id), FAR);
        }
        f.receive_memo(Memo::from(FORMATION_DISRUPTED), &host, &mut duties);
        assert_eq!(f.current().as_str(), "Pause_GatherAnimals");
        assert_eq!(
            duties.get(&ActorId::new("a1")),
            Some(&Duty::Wait { near: Some(MEET) })
        );

        host.advance(10);
        f.receive_memo(Memo::from(FORMATION_DISRUPTION_RESOLVED), &host, &mut duties);
        assert_eq!(f.current().as_str(), "GatherAnimals");
        assert_eq!(gathered(&f), 3);

        for id in ["a4", "a5"] {
            host.move_actor(&ActorId::new(id), MEET);
        }
        host.advance(1);
        let events = f.tick(&host, &mut duties);
        assert!(transitioned_to(&events, "GatherItems").is_some());
    }

    #[test]
    fn test_fast_forward_skips_presence() {
        let host = ScenarioHost::new(
            vec![leader("ada"), animal("a", FAR), animal("b", FAR)],
            CargoManifest::new(5.0, 0.0),
        );
        let mut duties = DutyBoard::new();
        let settings = FormationSettings {
            fast_animal_collection: true,
            ..FormationSettings::default()
        };
        let mut f = formation(&settings);

        let events = f.start(&host, &mut duties);
        assert!(matches!(
            events.as_slice(),
            [FormationEvent::PhaseEntered { phase, .. }] if phase.as_str() == "GatherAnimals"
        ));
        assert_eq!(
            duties.get(&ActorId::new("a")),
            Some(&Duty::GatherPawns {
                meeting_point: MEET,
                pawns: PawnsToGather::Animals,
            })
        );

        let events = f.tick(&host, &mut duties);
        assert!(transitioned_to(&events, "GatherItems").is_some());
    }

    #[test]
    fn test_leader_loss_aborts() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), animal("a", FAR)],
            CargoManifest::new(20.0, 0.0),
        );
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());
        f.tick(&host, &mut duties);

        let lost = ActorId::new("ada");
        host.remove(&lost);
        let events = f.on_member_lost(&lost, &host, &mut duties);

        assert_eq!(f.current().as_str(), "Abort");
        assert!(f.is_finished());
        assert_eq!(
            transitioned_to(&events, "Abort"),
            Some(&Memo::from("CaravanCriticalPawnLost"))
        );
    }

    #[test]
    fn test_loss_during_pause_aborts() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), animal("a", FAR)],
            CargoManifest::new(20.0, 0.0),
        );
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());
        f.tick(&host, &mut duties);

        f.receive_memo(Memo::from(FORMATION_DISRUPTED), &host, &mut duties);
        assert_eq!(f.current().as_str(), "Pause_GatherAnimals");

        let lost = ActorId::new("ada");
        host.remove(&lost);
        let events = f.on_member_lost(&lost, &host, &mut duties);

        assert_eq!(f.current().as_str(), "Abort");
        assert!(f.is_finished());
        assert_eq!(
            transitioned_to(&events, "Abort"),
            Some(&Memo::from("CaravanCriticalPawnLost"))
        );
    }

    #[test]
    fn test_non_critical_loss_continues() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), leader("bram"), animal("a", FAR)],
            CargoManifest::new(20.0, 0.0),
        );
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());
        f.tick(&host, &mut duties);

        let lost = ActorId::new("bram");
        host.remove(&lost);
        duties.clear(&lost);
        let events = f.on_member_lost(&lost, &host, &mut duties);

        assert_eq!(f.current().as_str(), "GatherAnimals");
        assert!(matches!(
            events.as_slice(),
            [FormationEvent::MemberLost { report }]
                if report.verdict == LossVerdict::ContinuesWithoutMember
        ));
        assert_eq!(duties.len(), 2);
    }

    #[test]
    fn test_snapshot_restores_presence() {
        let mut host = ScenarioHost::new(
            vec![leader("ada"), animal("a", MEET), animal("b", FAR)],
            CargoManifest::default(),
        );
        let mut duties = DutyBoard::new();
        let mut f = formation(&FormationSettings::default());
        f.tick(&host, &mut duties);
        let snapshot = f.snapshot(&host);
        assert_eq!(
            snapshot
                .phase(&PhaseId::from("GatherAnimals"))
                .and_then(|p| p.gathered.clone()),
            Some(vec![ActorId::new("a")])
        );

        let mut reloaded = formation(&FormationSettings::default());
        reloaded.restore(snapshot).unwrap();
        assert_eq!(gathered(&reloaded), 1);

        host.move_actor(&ActorId::new("a"), FAR);
        host.move_actor(&ActorId::new("b"), MEET);
        host.advance(1);
        let events = reloaded.tick(&host, &mut duties);
        assert!(transitioned_to(&events, "GatherItems").is_some());
    }

    #[test]
    fn test_restore_rejects_other_group() {
        let host = ScenarioHost::new(vec![leader("ada")], CargoManifest::default());
        let f = formation(&FormationSettings::default());
        let mut snapshot = f.snapshot(&host);
        snapshot.group = "Traders".to_string();

        let mut other = formation(&FormationSettings::default());
        assert!(other.restore(snapshot).is_err());
    }
}

mod viability {
    use super::*;

    fn roster() -> Vec<Actor> {
        vec![
            leader("ada"),
            animal("muffalo", MEET),
            Actor::new("hen", Role::Livestock, MEET),
        ]
    }

    fn lose(id: &str, pending: f32) -> LossVerdict {
        let monitor = ViabilityMonitor::new("Caravan");
        let mut bus = MemoBus::new();
        let roster = roster();
        let report = monitor.on_member_lost(
            &ActorId::new(id),
            &roster,
            CargoManifest::new(pending, 0.0),
            &mut bus,
        );
        assert_eq!(report.verdict.is_critical(), !bus.is_empty());
        report.verdict
    }

    #[test]
    fn test_leader_removed_lacks_leadership() {
        assert_eq!(lose("ada", 80.0), LossVerdict::LacksLeadership);
    }

    #[test]
    fn test_heavy_cargo_lacks_capacity() {
        assert_eq!(lose("hen", 120.0), LossVerdict::LacksCapacity);
    }

    #[test]
    fn test_non_essential_member_removed_continues() {
        assert_eq!(lose("hen", 80.0), LossVerdict::ContinuesWithoutMember);
    }
}

mod wiring {
    use super::*;

    fn inserted() -> Formation {
        let settings = FormationSettings {
            graft: GraftMode::Insert,
            ..FormationSettings::default()
        };
        Formation::new("Caravan", bare_graph(MEET, EXIT).unwrap(), &settings, MEET).unwrap()
    }

    #[test]
    fn test_abort_guards_every_inserted_phase() {
        let f = inserted();
        let graph = f.graph();
        let failure = graph.failure_transition().unwrap();

        for id in ["GatherAnimals", "GatherItems", "GatherSlaves"] {
            let id = PhaseId::from(id);
            assert!(failure.has_source(&id), "{} not guarded", id);
            assert!(failure.has_source(&id.pause()), "{} not guarded", id.pause());
        }
        assert!(failure.triggers.contains(&Memo::from("CaravanCriticalPawnLost")));
        assert_eq!(graph.starting_phase().as_str(), "GatherAnimals");
    }

    #[test]
    fn test_host_tail_untouched() {
        let f = inserted();
        let graph = f.graph();
        let host = bare_graph(MEET, EXIT).unwrap();

        for id in ["Rest", "Leave"] {
            let id = PhaseId::from(id);
            let before: Vec<_> = host
                .outgoing(&id)
                .filter(|t| t.target.as_str() != "Abort")
                .collect();
            let after: Vec<_> = graph
                .outgoing(&id)
                .filter(|t| t.target.as_str() != "Abort")
                .collect();
            assert_eq!(before, after);
        }
        let done = graph.next(&PhaseId::from("GatherSlaves"), &Memo::from("AllSlavesGathered"));
        assert!(done.is_some_and(|t| t.target.as_str() == "Rest"));
    }

    #[test]
    fn test_replace_keeps_host_gather_items() {
        let f = formation(&FormationSettings::default());
        let graph = f.graph();
        assert_eq!(graph.len(), 10);
        assert!(graph.phase(&PhaseId::from("GatherAnimals")).unwrap().tracker().is_some());
        assert!(graph.phase(&PhaseId::from("GatherItems")).unwrap().tracker().is_none());
        graph.validate().unwrap();
    }
}
