//! Configuration view and validation commands: `caravan config`.

use anyhow::Result;
use std::path::Path;

use caravan::caravan_config::{CONFIG_FILE, CaravanToml, FAST_ANIMALS_ENV, FormationSettings};

use super::super::ConfigCommands;

fn print_formation(formation: &FormationSettings) {
    println!("  fast_animal_collection = {}", formation.fast_animal_collection);
    println!("  check_interval = {}", formation.check_interval);
    println!("  gather_radius = {}", formation.gather_radius);
    println!(
        "  require_follower_confirmation = {}",
        formation.require_follower_confirmation
    );
    println!("  reach_danger = \"{}\"", formation.reach_danger);
    println!("  graft = \"{}\"", formation.graft);
    println!("  insert_before = \"{}\"", formation.insert_before);
}

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = project_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Caravan Configuration");
            println!("=====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                CaravanToml::load(&config_path)?
            } else {
                println!("No caravan.toml found at {}", config_path.display());
                println!("Using default configuration.");
                println!();
                CaravanToml::default()
            };

            println!("[formation]");
            print_formation(&toml.formation);
            println!();

            println!("Effective values (with env overrides):");
            let effective = toml.formation.clone().with_env_overrides();
            println!(
                "  fast_animal_collection = {}{}",
                effective.fast_animal_collection,
                if std::env::var_os(FAST_ANIMALS_ENV).is_some() {
                    format!(" (from {})", FAST_ANIMALS_ENV)
                } else {
                    String::new()
                }
            );
            println!();

            if !config_path.exists() {
                println!("Run 'caravan config init' to create a caravan.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No caravan.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = CaravanToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("caravan.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !project_dir.exists() {
                std::fs::create_dir_all(project_dir)?;
            }

            CaravanToml::default().save(&config_path)?;

            println!("Created caravan.toml at {}", config_path.display());
            println!();
            println!("You can now customize [formation]:");
            println!("  - fast_animal_collection, check_interval");
            println!("  - gather_radius, require_follower_confirmation, reach_danger");
            println!("  - graft (replace or insert) and insert_before");
            println!();
        }
    }

    Ok(())
}
