use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_MODEL, DEFAULT_OLLAMA_BINARY, DEFAULT_OLLAMA_HOST,
    DEFAULT_OLLAMA_PORT, DEFAULT_SYSTEM_PROMPT, LOCAL_CONFIG_DIR, OLLAMA_HOST_ENV,
    SERVER_CHECK_INTERVAL_SECS, SERVER_MAX_STARTUP_ATTEMPTS, SERVER_STARTUP_WAIT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model used when none is given on the command line
    #[serde(default)]
    pub default_model: ModelSettings,

    /// Where the server lives and how to start it
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Auto-start and readiness polling
    #[serde(default)]
    pub server: ServerConfig,
}

/// Default model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier
    pub name: String,
    /// System prompt; empty means none
    #[serde(default, serialize_with = "none_as_empty")]
    pub system_prompt: Option<String>,
}

impl ModelSettings {
    /// The system prompt to send, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.is_empty())
    }
}

/// TOML has no null, so "no system prompt" is written as an empty string.
/// Leaving the key out would let the default layer fill it back in.
fn none_as_empty<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    pub host: String,
    /// Ollama server port
    pub port: u16,
    /// Full base URL; takes precedence over host and port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Executable used to start the server
    pub binary: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            port: DEFAULT_OLLAMA_PORT,
            url: None,
            binary: DEFAULT_OLLAMA_BINARY.to_string(),
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        match &self.url {
            Some(url) => normalize_host(url),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

/// Server start-up configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Launch the server when it is not reachable
    pub auto_start: bool,
    /// Seconds to wait after launching before the first probe
    pub startup_grace_secs: u64,
    /// Seconds between readiness probes
    pub check_interval_secs: u64,
    /// Readiness probes before giving up
    pub max_startup_attempts: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            startup_grace_secs: SERVER_STARTUP_WAIT_SECS,
            check_interval_secs: SERVER_CHECK_INTERVAL_SECS,
            max_startup_attempts: SERVER_MAX_STARTUP_ATTEMPTS,
        }
    }
}

/// Turn an `OLLAMA_HOST`-style value into a base URL.
///
/// `0.0.0.0`, `myhost:1234` and `https://myhost/` are all accepted; the scheme
/// defaults to http and the port to 11434.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", raw),
    };
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let has_port = match authority.rfind(':') {
        // a colon inside an IPv6 literal is not a port separator
        Some(idx) => !authority[idx..].contains(']'),
        None => false,
    };
    if has_port {
        format!("{}://{}{}", scheme, authority, path)
    } else {
        format!("{}://{}:{}{}", scheme, authority, DEFAULT_OLLAMA_PORT, path)
    }
}

/// Layer defaults, then each existing file in order
fn figment_from_files(files: &[PathBuf]) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }
    figment
}

/// Load configuration from multiple sources
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut files = vec![
        get_config_dir()?.join("config.toml"),
        PathBuf::from(LOCAL_CONFIG_DIR).join("config.toml"),
    ];
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        files.push(path.to_path_buf());
    }

    let mut figment = figment_from_files(&files);

    // Honour the variable the Ollama tooling itself reads
    if let Ok(host) = std::env::var(OLLAMA_HOST_ENV) {
        if !host.trim().is_empty() {
            figment = figment.merge(Serialized::default("ollama.url", host));
        }
    }

    // Add environment variables (OLLAMA_PROMPT_ prefix, nested with __)
    figment = figment.merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"));

    figment
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ollama-prompt") {
        Ok(proj_dirs.config_dir().to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".config").join("ollama-prompt"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    } else {
        println!("Configuration already exists at: {}", config_file.display());
    }

    let local_example = PathBuf::from(LOCAL_CONFIG_DIR).join("config.toml.example");
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# ollama-prompt project configuration
# This file overrides global settings for this project

[default_model]
name = "codellama:7b"
system_prompt = "You are a helpful coding assistant."

[server]
auto_start = true
max_startup_attempts = 30
"#;
        std::fs::write(&local_example, example_config)?;
        println!("Created example configuration at: {}", local_example.display());
    }

    Ok(())
}
