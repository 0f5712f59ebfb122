// src/services/providers/openai.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DiagnosisProvider, chat_message_text, diagnosis_prompt, extract_json, missing_key, send_json};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::models::ProviderId;
use crate::services::image_processor::PreparedImage;
use crate::services::normalizer::{RawDiagnosis, field_names};

pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl DiagnosisProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
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
            .ok_or_else(|| missing_key(ProviderId::OpenAi))?;

        let request = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.config.model,
                "messages": [{
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
                }],
                "max_tokens": 1500,
                "response_format": { "type": "json_object" }
            }));

        let result = send_json(request, ProviderId::OpenAi).await?;
        let content = chat_message_text(&result)?;

        Ok(RawDiagnosis::OpenAi(extract_json(content)?))
    }
}
