// src/services/providers/claude.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{DiagnosisProvider, diagnosis_prompt, extract_json, missing_key, send_json};
use crate::config::ProviderConfig;
use crate::errors::{ProviderError, ProviderErrorKind};
use crate::models::ProviderId;
use crate::services::image_processor::PreparedImage;
use crate::services::normalizer::{RawDiagnosis, field_names};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: Client,
    config: ProviderConfig,
}

impl ClaudeProvider {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl DiagnosisProvider for ClaudeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
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
            .ok_or_else(|| missing_key(ProviderId::Claude))?;

        let request = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.config.model,
                "max_tokens": 1500,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": image.media_type,
                                "data": image.to_base64()
                            }
                        },
                        {
                            "type": "text",
                            "text": diagnosis_prompt(plant_type, &field_names(self.id()))
                        }
                    ]
                }]
            }));

        let result = send_json(request, ProviderId::Claude).await?;
        let content = first_text_block(&result).ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                "No text content in Anthropic response",
            )
        })?;

        Ok(RawDiagnosis::Claude(extract_json(content)?))
    }
}

fn first_text_block(result: &Value) -> Option<&str> {
    result["content"]
        .as_array()?
        .iter()
        .find(|block| block["type"] == "text")
        .and_then(|block| block["text"].as_str())
}
