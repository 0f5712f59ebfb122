// src/services/providers/perplexity.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DiagnosisProvider, chat_message_text, diagnosis_prompt, extract_json, missing_key, send_json};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::models::ProviderId;
use crate::services::image_processor::PreparedImage;
use crate::services::normalizer::{RawDiagnosis, field_names};

/// Perplexity's Sonar models accept OpenAI-style image parts but not the
/// `json_object` response format, so the answer is often wrapped in prose.
pub struct PerplexityProvider {
    client: Client,
    config: ProviderConfig,
}

impl PerplexityProvider {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl DiagnosisProvider for PerplexityProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Perplexity
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
            .ok_or_else(|| missing_key(ProviderId::Perplexity))?;

        let request = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You diagnose plant diseases from photos and answer in strict JSON."
                    },
                    {
                        "role": "user",
                        "content": [
                            {
                                "type": "text",
                                "text": diagnosis_prompt(plant_type, &field_names(self.id()))
                            },
                            {
                                "type": "image_url",
                                "image_url": {
                                    "url": image.to_data_uri()
                                }
                            }
                        ]
                    }
                ],
                "max_tokens": 1500
            }));

        let result = send_json(request, ProviderId::Perplexity).await?;
        let content = chat_message_text(&result)?;

        Ok(RawDiagnosis::Perplexity(extract_json(content)?))
    }
}
