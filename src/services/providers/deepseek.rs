// src/services/providers/deepseek.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DiagnosisProvider, chat_message_text, diagnosis_prompt, extract_json, missing_key, send_json};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::models::ProviderId;
use crate::services::image_processor::PreparedImage;
use crate::services::normalizer::{RawDiagnosis, field_names};

/// DeepSeek's chat endpoint is text-only: the photo is described by its
/// metadata and the model answers from the plant type alone.
pub struct DeepSeekProvider {
    client: Client,
    config: ProviderConfig,
}

impl DeepSeekProvider {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl DiagnosisProvider for DeepSeekProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DeepSeek
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn request_diagnosis(
        &self,
        image: &PreparedImage,
        plant_type: &str,
    ) -> Result<RawDiagnosis, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_key(ProviderId::DeepSeek))?;

        let context = format!(
            "A gardener uploaded a {} photo ({} KB) of a plant showing symptoms. \
             The image itself cannot be attached; give the most likely diagnosis \
             for this plant type and say so in the description.",
            image.media_type,
            image.data.len().div_ceil(1024)
        );

        let request = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.config.model,
                "messages": [
                    { "role": "system", "content": context },
                    { "role": "user", "content": diagnosis_prompt(plant_type, &field_names(self.id())) }
                ],
                "max_tokens": 1500,
                "response_format": { "type": "json_object" }
            }));

        let result = send_json(request, ProviderId::DeepSeek).await?;
        let content = chat_message_text(&result)?;

        Ok(RawDiagnosis::DeepSeek(extract_json(content)?))
    }
}
