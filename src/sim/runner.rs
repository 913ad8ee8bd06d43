use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::caravan_config::FormationSettings;
use crate::duty::DutyBoard;
use crate::host::Host;
use crate::orchestrator::{Formation, FormationEvent, FormationSnapshot};
use crate::phase::{GATHER_ITEMS, PhaseId};
use crate::signals::Memo;

use super::graphs::{ARRIVED, LEAVE, REST, RESTED};
use super::host::ScenarioHost;
use super::scenario::{Scenario, ScenarioEvent, ScriptedAction};

/// A formation event stamped with the tick it happened on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub tick: u64,
    #[serde(flatten)]
    pub event: FormationEvent,
}

/// Result of running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct SimOutcome {
    pub group: String,
    pub final_phase: PhaseId,
    pub finished: bool,
    pub ticks: u64,
    pub log: Vec<LogEntry>,
}

/// Drives a formation through a scripted scenario one tick at a time.
///
/// The simulation plays the host: it applies scripted events, loads cargo
/// during the cargo phase and publishes `Rested`/`Arrived` once the rest and
/// travel phases have lasted long enough.
pub struct Simulation {
    host: ScenarioHost,
    formation: Formation,
    duties: DutyBoard,
    events: Vec<ScenarioEvent>,
    cursor: usize,
    load_rate: f32,
    rest_ticks: u64,
    travel_ticks: u64,
    entered_at: u64,
    log: Vec<LogEntry>,
}

impl Simulation {
    pub fn new(scenario: Scenario, settings: &FormationSettings) -> Result<Self> {
        let host_graph = scenario
            .host_graph
            .build(scenario.meeting_point, scenario.exit)?;
        let formation = Formation::new(
            scenario.group.as_str(),
            host_graph,
            settings,
            scenario.meeting_point,
        )?;
        let host = ScenarioHost::new(scenario.actors, scenario.cargo)
            .with_hazardous(scenario.hazardous);

        Ok(Self {
            host,
            formation,
            duties: DutyBoard::new(),
            events: scenario.events,
            cursor: 0,
            load_rate: scenario.load_rate,
            rest_ticks: scenario.rest_ticks,
            travel_ticks: scenario.travel_ticks,
            entered_at: 0,
            log: Vec::new(),
        })
    }

    pub fn host(&self) -> &ScenarioHost {
        &self.host
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn duties(&self) -> &DutyBoard {
        &self.duties
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn snapshot(&self) -> FormationSnapshot {
        self.formation.snapshot(&self.host)
    }

    /// Resume from a saved snapshot. Game time continues at the snapshot's
    /// tick and scripted events before it are skipped.
    pub fn restore(&mut self, snapshot: FormationSnapshot) -> Result<()> {
        let saved_tick = snapshot.tick;
        self.formation.restore(snapshot)?;
        self.host.set_tick(saved_tick);
        self.entered_at = saved_tick;
        self.cursor = self.events.partition_point(|e| e.at < saved_tick);
        self.formation.roster_changed(&self.host, &mut self.duties);
        Ok(())
    }

    /// Run until the formation finishes or `max_ticks` is reached.
    pub fn run(&mut self, max_ticks: u64) -> SimOutcome {
        let events = self.formation.start(&self.host, &mut self.duties);
        self.record(events);

        while !self.formation.is_finished() && self.host.ticks_game() < max_ticks {
            self.step();
        }

        let outcome = SimOutcome {
            group: self.formation.group().to_string(),
            final_phase: self.formation.current().clone(),
            finished: self.formation.is_finished(),
            ticks: self.host.ticks_game(),
            log: self.log.clone(),
        };
        info!(
            group = %outcome.group,
            phase = %outcome.final_phase,
            finished = outcome.finished,
            ticks = outcome.ticks,
            "simulation finished"
        );
        outcome
    }

    /// Advance one game tick.
    pub fn step(&mut self) {
        let now = self.host.ticks_game();

        while let Some(event) = self.events.get(self.cursor).filter(|e| e.at <= now) {
            let action = event.action.clone();
            self.cursor += 1;
            self.apply(action);
        }

        self.host_behaviour(now);

        let events = self.formation.tick(&self.host, &mut self.duties);
        self.record(events);
        self.host.advance(1);
    }

    fn apply(&mut self, action: ScriptedAction) {
        debug!(tick = self.host.ticks_game(), ?action, "scripted event");
        match action {
            ScriptedAction::Move { actor, to } => self.host.move_actor(&actor, to),
            ScriptedAction::Follow { actor, following } => {
                self.host.set_following(&actor, following)
            }
            ScriptedAction::Lose { actor } => {
                if self.host.remove(&actor).is_some() {
                    self.duties.clear(&actor);
                    let events = self
                        .formation
                        .on_member_lost(&actor, &self.host, &mut self.duties);
                    self.record(events);
                }
            }
            ScriptedAction::Block { actor } => self.host.block(actor),
            ScriptedAction::Unblock { actor } => self.host.unblock(&actor),
            ScriptedAction::Memo { name } => self.publish(Memo::new(name)),
            ScriptedAction::MeetingPoint { to } => {
                self.formation
                    .set_meeting_point(to, &self.host, &mut self.duties)
            }
            ScriptedAction::AddCargo { mass } => self.host.add_cargo(mass),
        }
    }

    /// What the host itself does in the phases it implements.
    fn host_behaviour(&mut self, now: u64) {
        let current = self.formation.current().clone();
        let current = current.as_str();
        let elapsed = now.saturating_sub(self.entered_at);

        if current == GATHER_ITEMS {
            self.host.load_cargo(self.load_rate);
        } else if current == REST && elapsed >= self.rest_ticks {
            self.publish(Memo::from(RESTED));
        } else if current == LEAVE && elapsed >= self.travel_ticks {
            self.publish(Memo::from(ARRIVED));
        }
    }

    fn publish(&mut self, memo: Memo) {
        let events = self
            .formation
            .receive_memo(memo, &self.host, &mut self.duties);
        self.record(events);
    }

    fn record(&mut self, events: Vec<FormationEvent>) {
        let tick = self.host.ticks_game();
        for event in events {
            if matches!(event, FormationEvent::PhaseEntered { .. }) {
                self.entered_at = tick;
            }
            self.log.push(LogEntry { tick, event });
        }
    }
}
