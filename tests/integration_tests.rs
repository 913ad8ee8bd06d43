//! Integration tests for the caravan CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DEMO: &str = include_str!("../demos/caravan.toml");

/// Helper to create a caravan Command
fn caravan() -> Command {
    cargo_bin_cmd!("caravan")
}

/// Temp project with the demo scenario written into it
fn demo_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let scenario = dir.path().join("scenario.toml");
    fs::write(&scenario, DEMO).unwrap();
    (dir, scenario)
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_caravan_help() {
        caravan()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("simulate"));
    }

    #[test]
    fn test_caravan_version() {
        caravan().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_command_fails() {
        caravan().arg("gather").assert().failure();
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        caravan()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No caravan.toml found"))
            .stdout(predicate::str::contains("check_interval = 100"))
            .stdout(predicate::str::contains("graft = \"replace\""));
    }

    #[test]
    fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        caravan()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created caravan.toml"));

        let content = fs::read_to_string(dir.path().join("caravan.toml")).unwrap();
        assert!(content.contains("[formation]"));

        caravan()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("caravan.toml"),
            "[formation]\ngather_radius = -1.0\n",
        )
        .unwrap();

        caravan()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings"))
            .stdout(predicate::str::contains("gather_radius"));
    }

    #[test]
    fn test_config_validate_without_file() {
        let dir = TempDir::new().unwrap();
        caravan()
            .args(["--project-dir", dir.path().to_str().unwrap(), "config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using defaults (valid)"));
    }

    #[test]
    fn test_config_show_env_override() {
        let dir = TempDir::new().unwrap();
        caravan()
            .current_dir(dir.path())
            .env("CARAVAN_FAST_ANIMALS", "1")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "fast_animal_collection = true (from CARAVAN_FAST_ANIMALS)",
            ));
    }
}

// =============================================================================
// Simulation Tests
// =============================================================================

mod simulate {
    use super::*;

    #[test]
    fn test_demo_reaches_disband() {
        let (dir, scenario) = demo_project();
        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .assert()
            .success()
            .stdout(predicate::str::contains("entered Pause_GatherItems"))
            .stdout(predicate::str::contains("lost bram: continues without member"))
            .stdout(predicate::str::contains("Finished in Disband"));
    }

    #[test]
    fn test_json_outcome() {
        let (dir, scenario) = demo_project();
        let output = caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .arg("--json")
            .output()
            .unwrap();
        assert!(output.status.success());

        let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(outcome["group"], "Caravan");
        assert_eq!(outcome["final_phase"], "Disband");
        assert_eq!(outcome["finished"], true);
        assert!(outcome["log"].as_array().unwrap().iter().any(|e| {
            e["type"] == "transitioned" && e["memo"] == "AllSlavesGathered"
        }));
    }

    #[test]
    fn test_max_ticks_stops_early() {
        let (dir, scenario) = demo_project();
        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .args(["--max-ticks", "50"])
            .assert()
            .success()
            .stdout(predicate::str::contains("not finished"));
    }

    #[test]
    fn test_snapshot_and_resume() {
        let (dir, scenario) = demo_project();
        let snapshot = dir.path().join("saves").join("formation.json");

        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .args(["--max-ticks", "150", "--snapshot"])
            .arg(&snapshot)
            .assert()
            .success()
            .stdout(predicate::str::contains("Stopped in Pause_GatherItems"));

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&snapshot).unwrap()).unwrap();
        assert_eq!(saved["current"], "Pause_GatherItems");
        assert_eq!(saved["tick"], 150);

        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .arg("--resume")
            .arg(&snapshot)
            .assert()
            .success()
            .stdout(predicate::str::contains("GatherAnimals").not())
            .stdout(predicate::str::contains("Finished in Disband"));
    }

    #[test]
    fn test_resume_without_snapshot_fails() {
        let (dir, scenario) = demo_project();
        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .arg("--resume")
            .arg(dir.path().join("missing.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("No snapshot found"));
    }

    #[test]
    fn test_missing_scenario_fails() {
        let dir = TempDir::new().unwrap();
        caravan()
            .current_dir(dir.path())
            .args(["simulate", "nowhere.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read scenario file"));
    }

    #[test]
    fn test_insert_mode_from_config() {
        let (dir, scenario) = demo_project();
        let bare = fs::read_to_string(&scenario)
            .unwrap()
            .replace("host_graph = \"vanilla\"", "host_graph = \"bare\"");
        fs::write(&scenario, bare).unwrap();
        fs::write(
            dir.path().join("caravan.toml"),
            "[formation]\ngraft = \"insert\"\n",
        )
        .unwrap();

        caravan()
            .current_dir(dir.path())
            .arg("simulate")
            .arg(&scenario)
            .assert()
            .success()
            .stdout(predicate::str::contains("graft mode insert"))
            .stdout(predicate::str::contains("Finished in Disband"));
    }
}

// =============================================================================
// Graph Tests
// =============================================================================

mod graph {
    use super::*;

    #[test]
    fn test_graph_shows_grafted_phases() {
        let (dir, scenario) = demo_project();
        caravan()
            .current_dir(dir.path())
            .arg("graph")
            .arg(&scenario)
            .assert()
            .success()
            .stdout(predicate::str::contains("GatherAnimals *"))
            .stdout(predicate::str::contains("pause of GatherSlaves"))
            .stdout(predicate::str::contains("CaravanCriticalPawnLost"))
            .stdout(predicate::str::contains("(failure)"));
    }

    #[test]
    fn test_graph_rejects_bare_host_in_replace_mode() {
        let (dir, scenario) = demo_project();
        let bare = fs::read_to_string(&scenario)
            .unwrap()
            .replace("host_graph = \"vanilla\"", "host_graph = \"bare\"");
        fs::write(&scenario, bare).unwrap();

        caravan()
            .current_dir(dir.path())
            .arg("graph")
            .arg(&scenario)
            .assert()
            .failure()
            .stderr(predicate::str::contains("GatherAnimals"));
    }
}
