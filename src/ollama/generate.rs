use tracing::{debug, info, warn};

use super::server::{ensure_server_ready, OllamaServe, ReadinessPolicy, ServerLauncher, ServerState};
use super::service::{InferenceService, OllamaClient};
use super::types::{build_messages, ChatReply};
use crate::app::Config;
use crate::utils::{GenerateError, ServerError, ServiceError};

/// Drives a prompt through bootstrap, model acquisition and chat
pub struct Generator {
    service: Box<dyn InferenceService>,
    launcher: Box<dyn ServerLauncher>,
    policy: ReadinessPolicy,
}

impl Generator {
    pub fn new(
        service: Box<dyn InferenceService>,
        launcher: Box<dyn ServerLauncher>,
        policy: ReadinessPolicy,
    ) -> Self {
        Self {
            service,
            launcher,
            policy,
        }
    }

    /// Build a generator talking to the server described by `config`
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self::new(
            Box::new(OllamaClient::new(config.ollama.base_url())?),
            Box::new(OllamaServe::new(config.ollama.binary.clone())),
            ReadinessPolicy::from(&config.server),
        ))
    }

    pub fn service(&self) -> &dyn InferenceService {
        self.service.as_ref()
    }

    /// Make sure the server answers, launching it if needed
    pub async fn ensure_server_ready(&self) -> Result<ServerState, ServerError> {
        ensure_server_ready(self.service.as_ref(), self.launcher.as_ref(), &self.policy).await
    }

    /// Whether `model` is listed by the server. Listing failures count as absent.
    pub async fn model_exists(&self, model: &str) -> bool {
        match self.service.list_models().await {
            Ok(listing) => {
                debug!("Available models: {:?}", listing.names());
                listing.contains(model)
            }
            Err(e) => {
                warn!("Error checking models: {}", e);
                false
            }
        }
    }

    /// Pull `model` unless the server already has it
    pub async fn ensure_model(&self, model: &str) -> Result<(), GenerateError> {
        if self.model_exists(model).await {
            return Ok(());
        }

        info!("Model {} not found. Pulling it now...", model);
        self.service
            .pull_model(model)
            .await
            .map_err(|e| GenerateError::ModelPull {
                model: model.to_string(),
                message: e.to_string(),
            })?;
        info!("Pulled model {}", model);
        Ok(())
    }

    /// Send `prompt` to `model` and return the generated text.
    ///
    /// The server is started and the model pulled first when necessary. An empty
    /// prompt is sent as is.
    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, GenerateError> {
        self.ensure_server_ready().await?;
        self.ensure_model(model).await?;

        info!("Generating response...");
        let messages = build_messages(prompt, system_prompt);
        let reply = self
            .service
            .chat(model, &messages)
            .await
            .map_err(|e| GenerateError::Chat(e.to_string()))?;

        match &reply {
            ChatReply::Structured(response) => debug!(
                "Response from {:?}: done_reason={:?} eval_count={:?} total_duration={:?}",
                response.model, response.done_reason, response.eval_count, response.total_duration
            ),
            ChatReply::Raw(body) => warn!("Unexpected chat response shape: {}", body),
        }

        Ok(reply.into_text())
    }

    /// Like [`Generator::generate`], but failures come back as their message
    pub async fn generate_text(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<&str>,
    ) -> String {
        match self.generate(prompt, model, system_prompt).await {
            Ok(text) => text,
            Err(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ollama::server::MockServerLauncher;
    use crate::ollama::service::MockInferenceService;
    use crate::ollama::types::{ChatMessage, ChatResponse, ModelListing, ModelRecord, ResponseMessage};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const FIB_PROMPT: &str = "Write a function to calculate the Fibonacci sequence";
    const CODING_SYSTEM: &str = "You are a helpful coding assistant.";

    fn quick_policy() -> ReadinessPolicy {
        ReadinessPolicy {
            startup_grace: Duration::ZERO,
            check_interval: Duration::ZERO,
            max_attempts: 2,
            auto_start: true,
        }
    }

    fn listing(names: &[&str]) -> ModelListing {
        ModelListing::from(names.iter().map(|n| ModelRecord::named(*n)).collect::<Vec<_>>())
    }

    fn structured(content: &str) -> ChatReply {
        ChatReply::Structured(ChatResponse {
            model: Some("codellama:7b".to_string()),
            message: ResponseMessage {
                role: None,
                content: content.to_string(),
            },
            done: Some(true),
            done_reason: None,
            total_duration: None,
            eval_count: None,
        })
    }

    fn idle_launcher() -> MockServerLauncher {
        let mut launcher = MockServerLauncher::new();
        launcher.expect_launch().never();
        launcher
    }

    fn generator(service: MockInferenceService, launcher: MockServerLauncher) -> Generator {
        Generator::new(Box::new(service), Box::new(launcher), quick_policy())
    }

    #[tokio::test]
    async fn test_present_model_returns_content_without_pull() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .returning(|| Ok(listing(&["codellama:7b"])));
        service.expect_pull_model().never();
        service
            .expect_chat()
            .times(1)
            .withf(|model, messages| {
                model == "codellama:7b"
                    && messages
                        == [
                            ChatMessage::system(CODING_SYSTEM),
                            ChatMessage::user(FIB_PROMPT),
                        ]
            })
            .returning(|_, _| Ok(structured("def fib(n):\n    ...")));

        let generator = generator(service, idle_launcher());
        let text = generator
            .generate(FIB_PROMPT, "codellama:7b", Some(CODING_SYSTEM))
            .await
            .unwrap();
        assert_eq!(text, "def fib(n):\n    ...");
    }

    #[tokio::test]
    async fn test_no_system_prompt_sends_only_user_message() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .returning(|| Ok(listing(&["llama2"])));
        service
            .expect_chat()
            .times(1)
            .withf(|_, messages| messages == [ChatMessage::user("")])
            .returning(|_, _| Ok(structured("ok")));

        let generator = generator(service, idle_launcher());
        assert_eq!(generator.generate("", "llama2", None).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_empty_system_prompt_sends_only_user_message() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .returning(|| Ok(listing(&["llama2"])));
        service
            .expect_chat()
            .times(1)
            .withf(|_, messages| messages == [ChatMessage::user("hi")])
            .returning(|_, _| Ok(structured("ok")));

        let generator = generator(service, idle_launcher());
        assert_eq!(
            generator.generate("hi", "llama2", Some("")).await.unwrap(),
            "ok"
        );
    }

    #[tokio::test]
    async fn test_server_start_failure_skips_pull_and_chat() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .times(1)
            .returning(|| Err(ServiceError::Network("connection refused".to_string())));
        service.expect_pull_model().never();
        service.expect_chat().never();
        let mut launcher = MockServerLauncher::new();
        launcher.expect_launch().times(1).returning(|| {
            Err(ServerError::Launch {
                binary: "ollama".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        });

        let generator = generator(service, launcher);
        let err = generator
            .generate("hi", "llama2", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::ServerUnavailable(_)));
        assert!(err.to_string().contains("Failed to start Ollama server"));
    }

    #[tokio::test]
    async fn test_missing_model_is_pulled_once_before_chat() {
        let mut seq = Sequence::new();
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .times(2)
            .returning(|| Ok(listing(&["mistral"])));
        service
            .expect_pull_model()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|model| model == "codellama:7b")
            .returning(|_| Ok(()));
        service
            .expect_chat()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(structured("pulled and answered")));

        let generator = generator(service, idle_launcher());
        let text = generator
            .generate("hi", "codellama:7b", None)
            .await
            .unwrap();
        assert_eq!(text, "pulled and answered");
    }

    #[tokio::test]
    async fn test_listing_failure_counts_as_missing() {
        let mut service = MockInferenceService::new();
        let mut calls = 0;
        service.expect_list_models().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(listing(&[]))
            } else {
                Err(ServiceError::Decode("unexpected shape".to_string()))
            }
        });
        service.expect_pull_model().times(1).returning(|_| Ok(()));
        service
            .expect_chat()
            .times(1)
            .returning(|_, _| Ok(structured("fine")));

        let generator = generator(service, idle_launcher());
        assert_eq!(generator.generate("hi", "llama2", None).await.unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_pull_failure_embeds_model_and_skips_chat() {
        let mut service = MockInferenceService::new();
        service.expect_list_models().returning(|| Ok(listing(&[])));
        service
            .expect_pull_model()
            .times(1)
            .returning(|_| Err(ServiceError::Api("file does not exist".to_string())));
        service.expect_chat().never();

        let generator = generator(service, idle_launcher());
        let err = generator
            .generate("hi", "nope:13b", None)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope:13b"), "msg = {msg}");
        assert!(msg.contains("file does not exist"), "msg = {msg}");
    }

    #[tokio::test]
    async fn test_raw_chat_reply_is_returned_as_text() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .returning(|| Ok(listing(&["llama2"])));
        service
            .expect_chat()
            .returning(|_, _| Ok(ChatReply::Raw(r#"{"response":"hi"}"#.to_string())));

        let generator = generator(service, idle_launcher());
        let text = generator.generate("hi", "llama2", None).await.unwrap();
        assert!(!text.is_empty());
        assert_eq!(text, r#"{"response":"hi"}"#);
    }

    #[tokio::test]
    async fn test_chat_failure() {
        let mut service = MockInferenceService::new();
        service
            .expect_list_models()
            .returning(|| Ok(listing(&["llama2"])));
        service.expect_chat().returning(|_, _| {
            Err(ServiceError::Status {
                status: 500,
                body: "out of memory".to_string(),
            })
        });

        let generator = generator(service, idle_launcher());
        let err = generator.generate("hi", "llama2", None).await.unwrap_err();
        assert!(matches!(err, GenerateError::Chat(_)));
        assert!(err.to_string().contains("out of memory"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_each_pull() {
        let mut service = MockInferenceService::new();
        service.expect_list_models().returning(|| Ok(listing(&[])));
        service.expect_pull_model().times(2).returning(|_| Ok(()));
        service
            .expect_chat()
            .times(2)
            .returning(|_, _| Ok(structured("same answer")));

        let generator = generator(service, idle_launcher());
        let (a, b) = tokio::join!(
            generator.generate("one", "llama2", None),
            generator.generate("two", "llama2", None)
        );
        assert_eq!(a.unwrap(), "same answer");
        assert_eq!(b.unwrap(), "same answer");
    }

    #[test]
    fn test_from_config_builds_client() {
        let generator = Generator::from_config(&Config::default()).unwrap();
        assert_eq!(generator.policy, ReadinessPolicy::default());
    }

    #[tokio::test]
    async fn test_generate_text_renders_failures() {
        let mut service = MockInferenceService::new();
        service.expect_list_models().returning(|| Ok(listing(&[])));
        service
            .expect_pull_model()
            .returning(|_| Err(ServiceError::Network("reset".to_string())));

        let generator = generator(service, idle_launcher());
        let text = generator.generate_text("hi", "llama2", None).await;
        assert_eq!(text, "Failed to pull model llama2: Network error: reset");
    }
}
