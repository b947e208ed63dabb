use std::path::PathBuf;

use anyhow::Result;
use blueprint_fitness::Config;
use colored::Colorize;

fn resolve(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Config::config_file(),
    }
}

pub async fn show_config(path: Option<PathBuf>) -> Result<()> {
    let path = resolve(path)?;
    let config = Config::load_from(&path)?;
    let config_str = toml::to_string_pretty(&config)?;

    println!("{}", "Current Configuration".bold());
    println!("────────────────────────────────");
    println!("File:     {}", path.display());
    println!("Database: {}", config.db_path()?.display());
    println!();
    println!("{}", config_str);

    Ok(())
}

pub async fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_file = resolve(path)?;

    if config_file.exists() && !force {
        println!(
            "Configuration file already exists at: {}",
            config_file.display()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    config.save_to(&config_file)?;

    println!("✓ Configuration initialized at: {}", config_file.display());

    Ok(())
}
