//! Completion backends over rig-core providers.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionError, CompletionModel as RigCompletionModel};
use rig::message::Message;
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};
use vitae_core::{ErrorKind, Result};

use crate::TRACING_TARGET;
use crate::conversation::{ThreadMessage, ThreadRole};

/// Which hosted model family serves tailoring completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailorModel {
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for TailorModel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown tailor provider '{other}'")),
        }
    }
}

/// Provider selection plus credentials.
#[derive(Debug, Clone)]
pub struct TailorProviderConfig {
    pub provider: TailorModel,
    pub api_key: String,
    pub model: String,
}

/// The seam tests and alternative providers plug into.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends `prompt` with prior thread history and returns the raw
    /// assistant text.
    async fn complete(&self, prompt: &str, history: &[ThreadMessage]) -> Result<String>;
}

enum ModelService {
    OpenAi(openai::CompletionModel),
    Anthropic(anthropic::completion::CompletionModel),
}

/// rig-core backed completion backend.
pub struct RigBackend {
    service: ModelService,
    model_name: String,
}

impl RigBackend {
    /// Builds the configured provider client.
    pub fn new(config: &TailorProviderConfig) -> Result<Self> {
        let service = match config.provider {
            TailorModel::OpenAi => {
                let client = openai::Client::new(&config.api_key)
                    .map_err(|error| provider_error("openai", error))?
                    .completions_api();
                ModelService::OpenAi(client.completion_model(&config.model))
            }
            TailorModel::Anthropic => {
                let client = anthropic::Client::new(&config.api_key)
                    .map_err(|error| provider_error("anthropic", error))?;
                ModelService::Anthropic(client.completion_model(&config.model))
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            provider = ?config.provider,
            model = %config.model,
            "tailor completion backend initialized"
        );

        Ok(Self {
            service,
            model_name: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for RigBackend {
    async fn complete(&self, prompt: &str, history: &[ThreadMessage]) -> Result<String> {
        let chat_history: Vec<Message> = history.iter().map(to_rig_message).collect();
        let map_err = |error: CompletionError| {
            ErrorKind::UpstreamFailure
                .with_message(format!("completion via {} failed", self.model_name))
                .with_source(error)
        };

        match &self.service {
            ModelService::OpenAi(model) => model
                .completion_request(prompt)
                .messages(chat_history)
                .send()
                .await
                .map(|response| extract_text_content(&response.choice))
                .map_err(map_err),
            ModelService::Anthropic(model) => model
                .completion_request(prompt)
                .messages(chat_history)
                .send()
                .await
                .map(|response| extract_text_content(&response.choice))
                .map_err(map_err),
        }
    }
}

fn to_rig_message(message: &ThreadMessage) -> Message {
    match message.role {
        ThreadRole::User => Message::user(message.content.clone()),
        ThreadRole::Assistant => Message::assistant(message.content.clone()),
    }
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

fn provider_error(provider: &str, error: impl std::fmt::Display) -> vitae_core::Error {
    ErrorKind::ConfigurationError.with_message(format!("{provider} client setup failed: {error}"))
}
