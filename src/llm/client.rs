use crate::config::GenerationSettings;
use crate::error::{CaseReviewError, Result};
use crate::generation::{CompletionRequest, TextGenerator};
use crate::llm::types::*;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions backend for OpenAI and compatible endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, GenerationSettings::default().timeout)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Reads `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env(settings: &GenerationSettings) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CaseReviewError::Config("OPENAI_API_KEY must be set".to_string()))?;
        let client = Self::with_timeout(api_key, settings.timeout)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(api_error(status, &err_text));
        }

        let body: ChatCompletionResponse = res.json().await?;
        let texts = body.into_texts();
        debug!("OpenAI returned {} completion(s)", texts.len());
        Ok(texts)
    }
}

fn api_error(status: StatusCode, body: &str) -> CaseReviewError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let kind = parsed
                .error
                .kind
                .as_deref()
                .map(|kind| format!(", {}", kind))
                .unwrap_or_default();
            CaseReviewError::generation_with_source(
                format!(
                    "OpenAI API Error (status {}{}): {}",
                    status, kind, parsed.error.message
                ),
                parsed.error,
            )
        }
        Err(_) => CaseReviewError::generation(format!(
            "OpenAI API Error (status {}): {}",
            status, body
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_api_error_keeps_cause() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        let err = api_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            err.to_string(),
            "Generation failed: OpenAI API Error (status 429 Too Many Requests, requests): Rate limit reached"
        );
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("Rate limit reached"));
    }

    #[test]
    fn test_api_error_with_unparsed_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, CaseReviewError::Generation { source: None, .. }));
        assert!(err.to_string().ends_with("(status 502 Bad Gateway): upstream down"));
    }

    #[test]
    fn test_base_url_is_normalised() {
        let client = OpenAiClient::new("key".to_string())
            .unwrap()
            .with_base_url("http://localhost:11434/v1/");
        assert_eq!(client.base_url(), "http://localhost:11434/v1");
    }
}
