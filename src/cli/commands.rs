use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{get_config_dir, init_config, Config},
    ollama::{find_binary, Generator, InferenceService, OllamaClient},
};

use super::Commands;

/// Handle CLI subcommands
pub async fn handle_command(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Initializing ollama-prompt configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
        }
        Commands::List => list_models(config).await?,
        Commands::Version => show_version(),
        Commands::Status => show_status(config).await?,
    }
    Ok(())
}

/// List models installed on the server, starting it if needed
pub async fn list_models(config: &Config) -> Result<()> {
    let generator = Generator::from_config(config)?;
    generator.ensure_server_ready().await?;

    let listing = generator.service().list_models().await?;
    let names = listing.names();
    if names.is_empty() {
        println!("No models installed. Pull one with: ollama-prompt -m <model> <prompt>");
        return Ok(());
    }
    println!("Installed models:");
    for name in names {
        println!("  • {}", name.green());
    }
    Ok(())
}

/// Show version information
pub fn show_version() {
    println!("ollama-prompt v{}", env!("CARGO_PKG_VERSION"));
    println!("   Prompt a local Ollama model from the command line");
}

/// Show status of all dependencies
async fn show_status(config: &Config) -> Result<()> {
    println!("ollama-prompt Status:");
    println!();

    match find_binary(&config.ollama.binary) {
        Some(path) => println!("  [OK] Ollama binary: {}", path.display()),
        None => println!("  [ERROR] Ollama binary: `{}` not found on PATH", config.ollama.binary),
    }

    let client = OllamaClient::new(config.ollama.base_url())?;
    let base_url = client.base_url();
    match client.list_models().await {
        Ok(listing) => {
            let names = listing.names();
            println!(
                "  [OK] Ollama server: Running at {} ({} models installed)",
                base_url,
                names.len()
            );
            for model in names.iter().take(3) {
                println!("      • {}", model);
            }
            if names.len() > 3 {
                println!("      ... and {} more", names.len() - 3);
            }
            if names.iter().any(|n| n == &config.default_model.name) {
                println!("  [OK] Default model: {}", config.default_model.name);
            } else {
                println!(
                    "  [WARNING] Default model: {} (will be pulled on first use)",
                    config.default_model.name
                );
            }
        }
        Err(e) => println!("  [ERROR] Ollama server: Not reachable at {} ({})", base_url, e),
    }

    if config.server.auto_start {
        println!("  [OK] Auto-start: enabled");
    } else {
        println!("  [WARNING] Auto-start: disabled");
    }

    match get_config_dir() {
        Ok(dir) => {
            let config_path = dir.join("config.toml");
            if config_path.exists() {
                println!("  [OK] Configuration: {}", config_path.display());
            } else {
                println!("  [WARNING] Configuration: Not found (using defaults)");
            }
        }
        Err(e) => println!("  [WARNING] Configuration: {}", e),
    }

    println!();
    Ok(())
}
