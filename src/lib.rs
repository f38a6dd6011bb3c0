pub mod app;
pub mod cli;
pub mod constants;
pub mod ollama;
pub mod utils;

pub use app::{load_config, Config};
pub use ollama::{Generator, InferenceService, OllamaClient};
pub use utils::{GenerateError, ServerError, ServiceError};
