//! Phase graph inspection: `caravan graph`.

use anyhow::Result;
use console::style;
use std::path::Path;

use caravan::caravan_config::CaravanConfig;
use caravan::graph::PhaseGraph;
use caravan::orchestrator::Formation;
use caravan::phase::{Phase, PhaseKind};
use caravan::sim::Scenario;

pub fn cmd_graph(project_dir: &Path, scenario_path: &Path) -> Result<()> {
    let config = CaravanConfig::new(project_dir.to_path_buf())?;
    let scenario = Scenario::load(scenario_path)?;
    let settings = scenario.settings(&config.formation());

    let host_graph = scenario
        .host_graph
        .build(scenario.meeting_point, scenario.exit)?;
    let formation = Formation::new(
        scenario.group.as_str(),
        host_graph,
        &settings,
        scenario.meeting_point,
    )?;
    let graph = formation.graph();

    println!();
    println!(
        "Phase graph for {} (graft mode {})",
        style(formation.group()).bold(),
        settings.graft
    );
    println!();
    print_phases(graph);
    println!();
    print_transitions(graph);
    println!();

    Ok(())
}

fn kind_label(phase: &Phase) -> String {
    match phase.kind() {
        PhaseKind::Gather if phase.is_fast_forward() => "gather (fast)".to_string(),
        PhaseKind::Gather => "gather".to_string(),
        PhaseKind::Host => "host".to_string(),
        PhaseKind::Pause { origin } => format!("pause of {}", origin),
        PhaseKind::Terminal => "terminal".to_string(),
    }
}

fn print_phases(graph: &PhaseGraph) {
    println!("{:<22} {:<24} {:<12} Completes with", "Phase", "Kind", "Meeting");
    println!(
        "{:<22} {:<24} {:<12} --------------",
        "----------------------", "------------------------", "------------"
    );
    for phase in graph.phases() {
        let marker = if phase.id() == graph.starting_phase() {
            " *"
        } else {
            ""
        };
        let memo = phase
            .memo()
            .map(|m| m.to_string())
            .unwrap_or_else(|| style("-").dim().to_string());
        println!(
            "{:<22} {:<24} {:<12} {}",
            format!("{}{}", phase.id(), marker),
            kind_label(phase),
            phase.meeting_point().to_string(),
            memo
        );
    }
    println!("{}", style("* starting phase").dim());
}

fn print_transitions(graph: &PhaseGraph) {
    println!("Transitions (first match wins):");
    let failure = graph.failure_index();
    for (index, transition) in graph.transitions().iter().enumerate() {
        let sources: Vec<String> = transition.sources.iter().map(|s| s.to_string()).collect();
        let triggers: Vec<String> = transition.triggers.iter().map(|t| t.to_string()).collect();
        let line = format!(
            "  [{}] -> {} on {}",
            sources.join(", "),
            transition.target,
            triggers.join(" | ")
        );
        if failure == Some(index) {
            println!("{} {}", line, style("(failure)").red());
        } else {
            println!("{}", line);
        }
    }
}
