use anyhow::Result;
use clap::Parser;

use ollama_prompt::{
    app::load_config,
    cli::{handle_command, Cli},
    constants::DEMO_PROMPT,
    ollama::{detect_and_guide, Generator},
    utils::init_logger,
    GenerateError,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Load configuration
    let mut config = load_config(cli.config.as_deref())?;
    if cli.no_auto_start {
        config.server.auto_start = false;
    }

    if let Some(command) = &cli.command {
        return handle_command(command, &config).await;
    }

    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| config.default_model.name.clone());
    let prompt = cli.prompt.as_deref().unwrap_or(DEMO_PROMPT);
    let system_prompt = cli.system_prompt(config.default_model.system_prompt());

    let generator = Generator::from_config(&config)?;
    match generator.generate(prompt, &model, system_prompt).await {
        Ok(response) => {
            println!("{}", response);
            Ok(())
        }
        Err(e) => {
            if let GenerateError::ServerUnavailable(cause) = &e {
                if cause.is_missing_binary() {
                    detect_and_guide(&config.ollama.binary);
                }
            }
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
