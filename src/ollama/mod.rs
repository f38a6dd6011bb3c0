/// Ollama integration module - Gateway
mod detector;
mod generate;
mod guide;
mod server;
mod service;
mod types;

pub use detector::find_binary;
pub use generate::Generator;
pub use guide::detect_and_guide;
pub use server::{ensure_server_ready, OllamaServe, ReadinessPolicy, ServerLauncher, ServerState};
pub use service::{InferenceService, OllamaClient};
pub use types::{
    build_messages, ChatMessage, ChatReply, ChatResponse, MessageRole, ModelListing, ModelRecord,
    ResponseMessage,
};
