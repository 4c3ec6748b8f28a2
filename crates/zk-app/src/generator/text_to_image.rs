//! Client for the text-to-image service.
//!
//! Not part of the main generation flow; exposed through `zk imagine`.
//! The bearer token comes from configuration only.

use reqwest::Client;
use tracing::info;
use zk_core::error::GenerationError;

use crate::config::{ApiKey, TextToImageConfig};
use crate::error::AppError;
use crate::generator::backend::{ImagineRequest, ImagineResponse};

pub struct TextToImageClient {
    client: Client,
    url: String,
    api_key: ApiKey,
}

impl TextToImageClient {
    pub fn new(config: &TextToImageConfig) -> Result<Self, AppError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| AppError::Config("TEXT_TO_IMAGE_URL is not set".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("TEXT_TO_IMAGE_API_KEY is not set".into()))?;

        Ok(Self {
            client: Client::new(),
            url,
            api_key,
        })
    }

    /// Returns the URL of the generated image
    pub async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
        info!("Requesting image for prompt '{}'", prompt);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .json(&ImagineRequest { prompt })
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: Some(message),
            });
        }

        let parsed: ImagineResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        if parsed.image_url.trim().is_empty() {
            return Err(GenerationError::MalformedResponse("empty imageUrl".into()));
        }

        Ok(parsed.image_url)
    }
}
