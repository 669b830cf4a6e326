//! Gemini backend implementation
//!
//! HTTP client for the Google Generative Language API:
//! - `GET {base}/models` lists models visible to the key
//! - `POST {base}/models/{model}:generateContent` generates text
//!
//! The key travels in the `x-goog-api-key` header so it never appears in a
//! URL (and therefore never in a reqwest error message).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::error::RemoteError;

use super::types::GenerationOptions;
use super::RemoteBackend;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    batch_timeout: Duration,
    validation_timeout: Duration,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        Self::from_config(&ClassifierConfig {
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
            base_url: base_url.to_string(),
            ..ClassifierConfig::default()
        })
    }

    /// Create from a loaded configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            batch_timeout: config.batch_timeout,
            validation_timeout: config.validation_timeout,
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    fn api_key(&self) -> Result<&str, RemoteError> {
        self.api_key
            .as_deref()
            .ok_or_else(RemoteError::missing_credential)
    }

    /// Turn a non-success response into a classified error
    async fn check_status(&self, response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), &self.model, &body))
    }
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.response_mime_type.is_none() && self.max_output_tokens.is_none()
    }
}

/// generateContent response body
#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate (empty when absent)
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// models listing response body
#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[async_trait]
impl RemoteBackend for GeminiBackend {
    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .timeout(self.validation_timeout)
            .send()
            .await?;

        let response = self.check_status(response).await?;
        let listing: ListModelsResponse = response.json().await?;

        Ok(listing.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RemoteError> {
        let api_key = self.api_key()?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: options
                    .json_response
                    .then(|| "application/json".to_string()),
                max_output_tokens: options.max_output_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header(API_KEY_HEADER, api_key)
            .timeout(options.timeout.unwrap_or(self.batch_timeout))
            .json(&request)
            .send()
            .await?;

        let response = self.check_status(response).await?;
        let body: GenerateContentResponse = response.json().await?;
        let text = body.first_text();
        debug!("Gemini response: {}", text);

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
