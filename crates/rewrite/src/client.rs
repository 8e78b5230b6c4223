use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{Rewrite, config::RewriteConfig};

/// Rewrite client for any OpenAI-compatible chat-completions endpoint.
///
/// The link's directive becomes the system prompt (with the configured
/// preamble appended); the post text is the user message. Every failure path
/// logs and returns the source unchanged.
pub struct OpenAiRewriter {
    client: reqwest::Client,
    config: RewriteConfig,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("rewrite endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("rewrite response had no usable choice")]
    EmptyResponse,
}

impl OpenAiRewriter {
    #[must_use]
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn call(&self, source: &str, directive: &str) -> Result<String, CallError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let system = if self.config.preamble.is_empty() {
            directive.to_string()
        } else {
            format!("{directive}\n{}", self.config.preamble)
        };
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: source.to_string(),
                },
            ],
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Status(status));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CallError::EmptyResponse)
    }
}

#[async_trait]
impl Rewrite for OpenAiRewriter {
    async fn rewrite(&self, source: &str, directive: &str) -> String {
        if directive.trim().is_empty() || source.is_empty() {
            return source.to_string();
        }
        if source.chars().count() > self.config.max_source_chars {
            debug!(
                len = source.chars().count(),
                max = self.config.max_source_chars,
                "source too long for rewrite, passing through"
            );
            return source.to_string();
        }

        match self.call(source, directive).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "rewrite failed, passing source through");
                source.to_string()
            },
        }
    }
}
