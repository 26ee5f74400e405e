use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::Model;
use super::types::{ConversationState, GenerateRequest, GenerateResponse};
use crate::app::Config;
use crate::constants::{MALFORMED_PREVIEW_CHARS, OLLAMA_GENERATE_PATH};
use crate::utils::GatewayError;

/// Model served by a local Ollama instance through `/api/generate`
pub struct OllamaModel {
    client: Client,
    endpoint: String,
    model_name: String,
    /// Single writer: only `generate` replaces it, and only on success
    state: Option<ConversationState>,
}

impl OllamaModel {
    /// Create a model talking to `base_url` (e.g. `http://localhost:11434`)
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), OLLAMA_GENERATE_PATH),
            model_name: model_name.to_string(),
            state: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.ollama.base_url(),
            &config.model.name,
            config.ollama.timeout(),
        )
    }

    /// State that will accompany the next request, if any
    pub fn conversation_state(&self) -> Option<&ConversationState> {
        self.state.as_ref()
    }

    async fn send(&self, prompt: &str, system: &str) -> Result<GenerateResponse, GatewayError> {
        let request = GenerateRequest {
            model: &self.model_name,
            prompt,
            system,
            stream: false,
            context: self.state.as_ref(),
        };

        debug!("Sending request to Ollama API at {}", self.endpoint);
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        debug!("Received response with status code: {}", status.as_u16());

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Error response from Ollama ({}): {}", status.as_u16(), body);
            return Err(GatewayError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(MALFORMED_PREVIEW_CHARS).collect();
            warn!("Invalid JSON response from Ollama ({}): {}...", e, preview);
            GatewayError::MalformedResponse
        })
    }
}

#[async_trait]
impl Model for OllamaModel {
    async fn generate(&mut self, prompt: &str, system: &str) -> Result<String, GatewayError> {
        match self.send(prompt, system).await {
            Ok(body) => {
                // replaced wholesale, even when the reply carries none
                self.state = body.context;
                Ok(body.response.unwrap_or_default())
            }
            Err(e) => {
                warn!(kind = ?e.kind(), "Ollama request failed: {}", e);
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
