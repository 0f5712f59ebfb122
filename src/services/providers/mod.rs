// src/services/providers/mod.rs
//! Diagnosis provider adapters and the plumbing they share.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::time::Instant;

use crate::errors::{ProviderError, ProviderErrorKind};
use crate::models::{DiagnosisResponse, ProviderId};
use crate::services::image_processor::PreparedImage;
use crate::services::mock::MockGenerator;
use crate::services::normalizer::{FieldNames, RawDiagnosis, normalize};

pub mod claude;
pub mod deepseek;
pub mod openai;
pub mod perplexity;
pub mod plant_database;

pub use claude::ClaudeProvider;
pub use deepseek::DeepSeekProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;
pub use plant_database::PlantDatabase;

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"\{[\s\S]*\}").expect("valid JSON object regex");
}

#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn model(&self) -> &str;

    /// False when the provider has no usable credentials.
    fn is_configured(&self) -> bool;

    async fn request_diagnosis(
        &self,
        image: &PreparedImage,
        plant_type: &str,
    ) -> Result<RawDiagnosis, ProviderError>;
}

/// Run one provider end to end. Never fails: an unconfigured provider
/// answers with a mock without touching the network, and any transport,
/// status or schema failure answers with a mock tagged with the error kind.
pub async fn run_provider(
    provider: &dyn DiagnosisProvider,
    mock: &MockGenerator,
    image: &PreparedImage,
    plant_type: &str,
) -> DiagnosisResponse {
    let start = Instant::now();
    let id = provider.id();

    let mut response = if !provider.is_configured() {
        info!("{} is not configured, serving mock diagnosis", id);
        DiagnosisResponse::mock(id, mock.generate(plant_type), None)
    } else {
        match provider
            .request_diagnosis(image, plant_type)
            .await
            .and_then(normalize)
        {
            Ok(result) => DiagnosisResponse::live(id, provider.model(), result),
            Err(e) => {
                warn!("{} diagnosis failed, serving mock diagnosis: {}", id, e);
                DiagnosisResponse::mock(id, mock.generate(plant_type), Some(e.kind))
            }
        }
    };

    response.processing_time_ms = start.elapsed().as_millis() as u64;
    response
}

/// Instruction asking the model for a diagnosis keyed by `fields`.
pub fn diagnosis_prompt(plant_type: &str, fields: &FieldNames) -> String {
    let plant = match plant_type.trim() {
        "" => "garden plant".to_string(),
        p => p.to_lowercase(),
    };

    format!(
        r#"You are an expert plant pathologist. Examine this {plant} and identify any disease, pest damage or nutrient deficiency.

Respond with ONLY a JSON object, no prose and no markdown, using exactly these keys:
{{
    "{disease}": "name of the disease, or \"Healthy\"",
    "{confidence}": number between 0 and 1,
    "{severity}": "Low" | "Medium" | "High",
    "{description}": "one or two sentence explanation",
    "{symptoms}": ["visible symptom", ...],
    "{causes}": ["likely cause", ...],
    "{organic}": ["organic treatment", ...],
    "{chemical}": ["chemical treatment with active ingredient", ...],
    "{prevention}": ["preventive measure", ...],
    "{urgency}": "Low" | "Medium" | "High" | "Immediate"
}}"#,
        plant = plant,
        disease = fields.disease,
        confidence = fields.confidence,
        severity = fields.severity,
        description = fields.description,
        symptoms = fields.symptoms,
        causes = fields.possible_causes,
        organic = fields.organic_treatments,
        chemical = fields.chemical_treatments,
        prevention = fields.preventive_measures,
        urgency = fields.urgency,
    )
}

/// Parse model text as JSON, falling back to the outermost `{...}` span
/// when the model wrapped its answer in prose or code fences.
pub fn extract_json(text: &str) -> Result<Value, ProviderError> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(value);
    }

    JSON_OBJECT
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                format!("no JSON object in model output: {}", truncate(text, 200)),
            )
        })
}

/// Send a request and decode its JSON body, classifying non-2xx statuses.
pub async fn send_json(request: RequestBuilder, provider: ProviderId) -> Result<Value, ProviderError> {
    let response = request.send().await.map_err(|e| {
        ProviderError::new(
            ProviderErrorKind::NetworkError,
            format!("{} request failed: {}", provider, e),
        )
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::new(
            ProviderErrorKind::from_status(status.as_u16(), &error_text),
            format!("{} error {}: {}", provider, status, truncate(&error_text, 300)),
        ));
    }

    response.json().await.map_err(|e| {
        ProviderError::new(
            ProviderErrorKind::InvalidResponse,
            format!("Failed to parse {} response: {}", provider, e),
        )
    })
}

/// `choices[0].message.content` of an OpenAI-compatible chat completion.
pub fn chat_message_text(result: &Value) -> Result<&str, ProviderError> {
    result["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                "No content in chat completion response",
            )
        })
}

pub fn missing_key(provider: ProviderId) -> ProviderError {
    ProviderError::new(
        ProviderErrorKind::InvalidApiKey,
        format!("{} API key not configured", provider),
    )
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
