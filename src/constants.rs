/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_OLLAMA_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_OLLAMA_BINARY: &str = "ollama";
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

// Timeouts
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const SERVER_STARTUP_WAIT_SECS: u64 = 1;
pub const SERVER_CHECK_INTERVAL_SECS: u64 = 1;
pub const SERVER_MAX_STARTUP_ATTEMPTS: usize = 15;

// Default Model Configuration
pub const DEFAULT_MODEL: &str = "codellama:7b";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant.";
pub const DEMO_PROMPT: &str = "Write a function to calculate the Fibonacci sequence in Python";

// Config locations
pub const CONFIG_ENV_PREFIX: &str = "OLLAMA_PROMPT_";
pub const LOCAL_CONFIG_DIR: &str = ".ollama-prompt";
