use crate::config::GenerationSettings;
use crate::error::{CaseReviewError, Result};
use crate::prompts::{FEW_SHOT_CASE, FEW_SHOT_REVIEW, TITLE_INSTRUCTION};
use crate::sanitize::{strip_forbidden, DEFAULT_DENYLIST};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// A text-generation service. Returns every completion the service produced,
/// in the order it produced them; an empty list is not an error here.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        (**self).complete(request).await
    }
}

/// Wraps a [`TextGenerator`] with the message layout, settings and output
/// clean-up used for case reviews.
pub struct GenerationClient<G> {
    generator: G,
    settings: GenerationSettings,
    denylist: Vec<String>,
}

impl<G: TextGenerator> GenerationClient<G> {
    pub fn new(generator: G, settings: GenerationSettings) -> Self {
        Self {
            generator,
            settings,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_denylist<I, S>(mut self, denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist = denylist.into_iter().map(Into::into).collect();
        self
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The opening messages for a new review: system instruction, the
    /// optional example exchange, then the assembled prompt.
    pub fn initial_messages(&self, prompt: &str, system_prompt: Option<&str>) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        if self.settings.few_shot {
            messages.push(ChatMessage::user(FEW_SHOT_CASE));
            messages.push(ChatMessage::assistant(FEW_SHOT_REVIEW));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    pub async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let messages = self.initial_messages(prompt, system_prompt);
        self.generate_messages(messages).await
    }

    /// Send `messages` as-is and return the cleaned first completion.
    pub async fn generate_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_output_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
        };
        info!(
            "Requesting completion from {} ({} messages)",
            request.model,
            request.messages.len()
        );
        let text = self.first_completion(&request).await?;
        debug!("Received {} characters of generated text", text.len());
        Ok(text)
    }

    pub async fn generate_title(&self, case_description: &str) -> Result<String> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(TITLE_INSTRUCTION),
                ChatMessage::user(case_description),
            ],
            max_output_tokens: self.settings.title_max_tokens,
            temperature: self.settings.temperature,
        };
        let text = self.first_completion(&request).await?;
        let title = text
            .lines()
            .map(|line| line.trim().trim_matches('"').trim())
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();
        Ok(title)
    }

    async fn first_completion(&self, request: &CompletionRequest) -> Result<String> {
        let completions = self.generator.complete(request).await?;
        let first = completions
            .into_iter()
            .next()
            .ok_or_else(|| CaseReviewError::generation("service returned no completions"))?;
        let denylist: Vec<&str> = self.denylist.iter().map(String::as_str).collect();
        let cleaned = strip_forbidden(&first, &denylist);
        if cleaned.trim().is_empty() {
            return Err(CaseReviewError::generation(
                "service returned an empty completion",
            ));
        }
        Ok(cleaned)
    }
}
