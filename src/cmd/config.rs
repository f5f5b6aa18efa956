//! Configuration view and validation commands (`kanban config`).

use anyhow::{Context, Result};
use std::path::Path;

use super::super::ConfigCommands;
use kanban::config::{KanbanConfig, KanbanToml};

fn print_toml(toml: &KanbanToml) {
    println!("[server]");
    println!("  host = \"{}\"", toml.server.host);
    println!("  port = {}", toml.server.port);
    println!("  dev_mode = {}", toml.server.dev_mode);
    println!();
    println!("[database]");
    println!("  path = \"{}\"", toml.database.path.display());
    println!();
    println!("[log]");
    println!("  level = \"{}\"", toml.log.level);
    println!("  format = \"{}\"", toml.log.format);
    if let Some(dir) = &toml.log.dir {
        println!("  dir = \"{}\"", dir.display());
    }
    println!();
}

/// `explicit` is the `--config` flag. `init` never loads an existing file, so
/// it works when that path does not exist yet.
pub fn cmd_config(explicit: Option<&Path>, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => show(&KanbanConfig::load(explicit)?),
        Some(ConfigCommands::Validate) => validate(&KanbanConfig::load(explicit)?),
        Some(ConfigCommands::Init) => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            init_at(&KanbanConfig::init_path(&cwd, explicit))?;
        }
    }

    Ok(())
}

fn show(config: &KanbanConfig) {
    println!();
    println!("Kanban Configuration");
    println!("====================");
    println!();

    match &config.source {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("No kanban.toml found. Using defaults."),
    }
    println!();

    println!("Effective values (with env overrides):");
    println!();
    print_toml(&config.toml);
}

fn validate(config: &KanbanConfig) {
    println!();
    println!("Validating configuration...");
    println!();

    if config.source.is_none() {
        println!("No kanban.toml found. Using defaults (valid).");
        return;
    }

    let warnings = config.validate();
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

fn init_at(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("kanban.toml already exists at {}", config_path.display());
        println!("Delete it first if you want to recreate it.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    KanbanToml::default().save(config_path)?;

    println!("Created kanban.toml at {}", config_path.display());
    println!();
    println!("You can now customize:");
    println!("  - [server] host, port, dev_mode");
    println!("  - [database] path");
    println!("  - [log] level, format, dir");
    println!();
    Ok(())
}
