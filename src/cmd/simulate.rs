//! Scenario runs: `caravan simulate`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tracing::warn;

use caravan::caravan_config::CaravanConfig;
use caravan::orchestrator::{FormationEvent, StateManager};
use caravan::sim::{Scenario, SimOutcome, Simulation};

/// Flags of the `simulate` command.
pub struct SimulateOptions<'a> {
    pub max_ticks: u64,
    pub snapshot: Option<&'a Path>,
    pub resume: Option<&'a Path>,
    pub fast_animals: bool,
    pub json: bool,
}

pub fn cmd_simulate(project_dir: &Path, scenario_path: &Path, opts: SimulateOptions<'_>) -> Result<()> {
    let config = CaravanConfig::new(project_dir.to_path_buf())?;
    for warning in config.validate() {
        warn!(config = %config.config_path().display(), "{}", warning);
    }

    let scenario = Scenario::load(scenario_path)?;
    let mut settings = scenario.settings(&config.formation());
    if opts.fast_animals {
        settings.fast_animal_collection = true;
    }
    let actors = scenario.actors.len();

    let mut sim = Simulation::new(scenario, &settings)?;
    if let Some(path) = opts.resume {
        let snapshot = StateManager::new(path.to_path_buf())
            .load()?
            .with_context(|| format!("No snapshot found at {}", path.display()))?;
        sim.restore(snapshot)?;
    }

    let outcome = sim.run(opts.max_ticks);

    if let Some(path) = opts.snapshot {
        StateManager::new(path.to_path_buf()).save(&sim.snapshot())?;
    }

    if opts.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?;
        println!("{}", json);
        return Ok(());
    }

    println!();
    println!(
        "Group {} ({} actors, graft mode {})",
        style(&outcome.group).bold(),
        actors,
        settings.graft
    );
    println!();
    print_log(&outcome);
    println!();
    print_result(&outcome);
    if let Some(path) = opts.snapshot {
        println!("Snapshot saved to {}", path.display());
    }
    println!();

    Ok(())
}

fn print_log(outcome: &SimOutcome) {
    println!("{:<8} Event", "Tick");
    println!("{:<8} -----", "--------");
    for entry in &outcome.log {
        println!("{:<8} {}", entry.tick, describe(&entry.event));
    }
}

fn describe(event: &FormationEvent) -> String {
    match event {
        FormationEvent::PhaseEntered { phase, terminal } => {
            if *terminal {
                format!("entered {} (terminal)", style(phase).bold())
            } else {
                format!("entered {}", style(phase).bold())
            }
        }
        FormationEvent::Transitioned { from, to, memo } => {
            format!("{} -> {} on {}", from, to, style(memo).cyan())
        }
        FormationEvent::MemoIgnored { phase, memo } => {
            style(format!("ignored {} in {}", memo, phase)).dim().to_string()
        }
        FormationEvent::MemberLost { report } => {
            let line = format!(
                "lost {}: {} (leaders {}, capacity {:.1}, cargo {:.1})",
                report.lost, report.verdict, report.leaders, report.capacity, report.required_mass
            );
            if report.verdict.is_critical() {
                style(line).red().to_string()
            } else {
                style(line).yellow().to_string()
            }
        }
    }
}

fn print_result(outcome: &SimOutcome) {
    if outcome.finished {
        println!(
            "{} Finished in {} after {} ticks",
            style("✓").green().bold(),
            style(&outcome.final_phase).bold(),
            outcome.ticks
        );
    } else {
        println!(
            "{} Stopped in {} after {} ticks (not finished)",
            style("…").yellow().bold(),
            style(&outcome.final_phase).bold(),
            outcome.ticks
        );
    }
}
