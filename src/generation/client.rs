// file: src/generation/client.rs
// description: commit message generation through an OpenAI-compatible chat completions API
// reference: https://console.groq.com/docs/api-reference#chat

use crate::config::GenerationConfig;
use crate::error::{PipelineError, Result};
use crate::generation::prompt::{self, SYSTEM_PROMPT};
use crate::models::{ChangeKind, ModelName};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Turns one file's diff into a commit message.
pub trait MessageGenerator: Send + Sync {
    fn generate_message(
        &self,
        model: &ModelName,
        file_path: &str,
        diff: &str,
        kind: ChangeKind,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct ChatCompletionClient {
    client: Client,
    config: GenerationConfig,
}

impl ChatCompletionClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl MessageGenerator for ChatCompletionClient {
    async fn generate_message(
        &self,
        model: &ModelName,
        file_path: &str,
        diff: &str,
        kind: ChangeKind,
    ) -> Result<String> {
        let user_prompt = prompt::build_user_prompt(file_path, diff, kind, self.config.max_diff_chars);
        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.config.temperature,
            stream: false,
        };

        debug!(
            "Requesting commit message for {} from {} ({} diff chars)",
            file_path,
            model,
            diff.len()
        );

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            PipelineError::Generation(format!("Failed to send generation request: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Generation(format!(
                "Generation request failed with status {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            PipelineError::Generation(format!("Failed to parse generation response: {}", e))
        })?;

        let raw = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("No choices returned".to_string()))?;

        let message = prompt::clean_message(&raw);
        if message.is_empty() {
            return Err(PipelineError::Generation(
                "Backend returned an empty message".to_string(),
            ));
        }

        Ok(message)
    }
}
