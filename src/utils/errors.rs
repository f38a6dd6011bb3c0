use std::time::Duration;

use thiserror::Error;

/// Failure talking to the inference service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

/// Why the server could not be brought up
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("could not launch `{binary} serve`: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server did not respond within {waited:?} after launch")]
    NotReady { waited: Duration },

    #[error("server is not running and auto-start is disabled")]
    AutoStartDisabled,
}

impl ServerError {
    /// True when the server binary could not be found at all
    pub fn is_missing_binary(&self) -> bool {
        matches!(
            self,
            ServerError::Launch { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Failure of a generation request
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to start Ollama server: {0}")]
    ServerUnavailable(#[from] ServerError),

    #[error("Failed to pull model {model}: {message}")]
    ModelPull { model: String, message: String },

    #[error("Error generating response: {0}")]
    Chat(String),
}
