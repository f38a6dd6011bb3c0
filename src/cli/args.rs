use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ollama-prompt")]
#[command(version)]
#[command(about = "Send a prompt to a local Ollama model, starting the server and pulling the model if needed", long_about = None)]
pub struct Cli {
    /// Prompt to send (defaults to a demo prompt)
    pub prompt: Option<String>,

    /// Model to use (e.g., codellama:7b, llama2, mistral)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt sent before the user prompt
    #[arg(short, long, conflicts_with = "no_system")]
    pub system: Option<String>,

    /// Send no system prompt, even if one is configured
    #[arg(long)]
    pub no_system: bool,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't auto-start the Ollama server
    #[arg(long)]
    pub no_auto_start: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// List models installed on the server
    List,
    /// Show version information
    Version,
    /// Check status of dependencies
    Status,
}

impl Cli {
    /// The system prompt to send, given the configured default
    pub fn system_prompt<'a>(&'a self, configured: Option<&'a str>) -> Option<&'a str> {
        if self.no_system {
            None
        } else {
            self.system.as_deref().or(configured)
        }
    }
}
